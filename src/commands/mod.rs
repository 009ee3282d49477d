use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    generate::{Generator, Observer},
    runtime::Runtime,
};

pub mod config;
mod progress;
mod save;

pub use config::GenerateOptions;
pub use progress::TerminalObserver;
pub use save::SavingObserver;

use config::Config;

/// Generate memes for `prompt`, print progress to stdout and save the images.
#[tracing::instrument(skip(runtime, options))]
pub async fn generate<R: Runtime>(runtime: R, prompt: &str, options: &GenerateOptions) -> Result<()> {
    let config = Config::new(runtime, options)?;
    let observer = TerminalObserver::new(std::io::stdout());
    run(prompt, config, &observer).await.map(|_| ())
}

/// Runs one batch, saving each image as soon as it is ready.
///
/// The job's failure takes precedence over a failed write, so a run that
/// ends with a categorized error reports that error even when saving its
/// partial results failed too.
pub async fn run<R: Runtime>(
    prompt: &str,
    config: Config<R>,
    observer: &dyn Observer,
) -> Result<Vec<PathBuf>> {
    let generator = Generator::new(config.runtime, config.http, config.generator);

    let Some(dir) = &config.out_dir else {
        let job = generator.generate(prompt, observer).await;
        return match job.error() {
            Some(err) => Err(err.clone().into()),
            None => Ok(Vec::new()),
        };
    };

    let saver = SavingObserver::new(generator.runtime(), dir, observer);
    let job = generator.generate(prompt, &saver).await;
    let saved = saver.into_saved();

    if let Some(err) = job.error() {
        return Err(err.clone().into());
    }
    let saved = saved?;
    debug!("Saved {} of {} images", saved.len(), job.target());
    Ok(saved)
}
