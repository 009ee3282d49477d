//! Terminal rendering of job events.

use std::io::Write;
use std::sync::Mutex;

use crate::generate::{JobEvent, JobStatus, Observer};

/// Writes one line per event to `out`.
pub struct TerminalObserver<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> Observer for TerminalObserver<W> {
    fn publish(&self, event: JobEvent) {
        let line = match event {
            JobEvent::Started { prompt, total } => {
                format!("Generating {} memes for \"{}\"...", total, prompt)
            }
            JobEvent::ImageReady { image, progress } => {
                format!("Generating... {}% (image {} ready)", progress, image.ordinal() + 1)
            }
            JobEvent::Finished {
                status: JobStatus::Succeeded,
                ..
            } => "Done.".to_string(),
            // Failures are reported by the caller.
            JobEvent::Finished { .. } => return,
        };

        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}
