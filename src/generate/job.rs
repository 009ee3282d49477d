//! State of one generation run and the events it publishes.

use super::error::GenerationError;

/// One generated image and its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    ordinal: usize,
    payload: String,
}

impl ImageResult {
    pub fn new(ordinal: usize, payload: String) -> Self {
        Self { ordinal, payload }
    }

    /// 0-based position in generation order.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Base64-encoded image bytes.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Name used when the image is saved, e.g. ordinal 2 -> `meme_3.png`.
    pub fn filename(&self) -> String {
        format!("meme_{}.png", self.ordinal + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed(GenerationError),
}

/// A state transition observers can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Started { prompt: String, total: usize },
    ImageReady { image: ImageResult, progress: u8 },
    /// Always carries the reset progress, 0.
    Finished { status: JobStatus, progress: u8 },
}

/// Receives job events as they happen.
#[cfg_attr(test, mockall::automock)]
pub trait Observer: Send + Sync {
    fn publish(&self, event: JobEvent);
}

impl Observer for tokio::sync::mpsc::UnboundedSender<JobEvent> {
    fn publish(&self, event: JobEvent) {
        // Nobody listening is not an error for the run itself.
        let _ = self.send(event);
    }
}

/// Everything produced by one run. The images already produced stay here
/// even when the run fails.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    prompt: String,
    normalized_prompt: String,
    target: usize,
    images: Vec<ImageResult>,
    progress: u8,
    in_flight: bool,
    status: JobStatus,
}

impl GenerationJob {
    pub fn new(prompt: &str, normalized_prompt: String, target: usize) -> Self {
        Self {
            prompt: prompt.to_string(),
            normalized_prompt,
            target,
            images: Vec::with_capacity(target),
            progress: 0,
            in_flight: false,
            status: JobStatus::Pending,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The prompt actually sent to the model.
    pub fn normalized_prompt(&self) -> &str {
        &self.normalized_prompt
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn images(&self) -> &[ImageResult] {
        &self.images
    }

    /// Percentage of the batch completed, 0 once the run is over.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    /// The failure category, if the run failed.
    pub fn error(&self) -> Option<&GenerationError> {
        match &self.status {
            JobStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = JobStatus::Running;
        self.in_flight = true;
        self.progress = 0;
    }

    /// Appends the next image in order and returns it with the new progress.
    pub(crate) fn push(&mut self, payload: String) -> (ImageResult, u8) {
        debug_assert!(self.images.len() < self.target);
        let image = ImageResult::new(self.images.len(), payload);
        self.images.push(image.clone());
        self.progress = u8::try_from(self.images.len() * 100 / self.target.max(1)).unwrap_or(100);
        (image, self.progress)
    }

    pub(crate) fn finish(&mut self, outcome: Result<(), GenerationError>) {
        self.status = match outcome {
            Ok(()) => JobStatus::Succeeded,
            Err(err) => JobStatus::Failed(err),
        };
        self.in_flight = false;
        self.progress = 0;
    }
}
