//! Saving images while the batch is still running.

use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::download::save_image;
use crate::generate::{ImageResult, JobEvent, Observer};
use crate::runtime::Runtime;

/// Forwards every event to `inner` and writes each image to `dir` as soon as
/// it is ready. A failed write does not stop the batch; the first one is kept
/// for [`SavingObserver::into_saved`].
pub struct SavingObserver<'a, R: Runtime> {
    runtime: &'a R,
    dir: &'a Path,
    inner: &'a dyn Observer,
    saved: Mutex<Vec<PathBuf>>,
    error: Mutex<Option<anyhow::Error>>,
}

impl<'a, R: Runtime> SavingObserver<'a, R> {
    pub fn new(runtime: &'a R, dir: &'a Path, inner: &'a dyn Observer) -> Self {
        Self {
            runtime,
            dir,
            inner,
            saved: Mutex::new(Vec::new()),
            error: Mutex::new(None),
        }
    }

    /// Paths written so far, or the first write failure.
    pub fn into_saved(self) -> Result<Vec<PathBuf>> {
        if let Some(err) = self.error.into_inner().unwrap_or_else(|e| e.into_inner()) {
            return Err(err);
        }
        Ok(self.saved.into_inner().unwrap_or_else(|e| e.into_inner()))
    }

    fn save(&self, image: &ImageResult) {
        match save_image(self.runtime, image, self.dir) {
            Ok(path) => {
                println!("Saved {}", path.display());
                self.saved
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(path);
            }
            Err(err) => {
                warn!("{:#}", err);
                let mut first = self.error.lock().unwrap_or_else(|e| e.into_inner());
                if first.is_none() {
                    *first = Some(err);
                }
            }
        }
    }
}

impl<R: Runtime> Observer for SavingObserver<'_, R> {
    fn publish(&self, event: JobEvent) {
        let ready = match &event {
            JobEvent::ImageReady { image, .. } => Some(image.clone()),
            _ => None,
        };
        self.inner.publish(event);
        if let Some(image) = ready {
            self.save(&image);
        }
    }
}
