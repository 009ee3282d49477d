//! Batch image generation against the inference endpoint.
//!
//! A [`Generator`] requests [`TOTAL_IMAGES`] images for one prompt, one after
//! another by default. Every request goes through [`HttpClient::attempt`] and
//! is additionally raced against an absolute deadline. Each finished image is
//! published to an [`Observer`] before the next one is requested; the first
//! failure ends the batch and is classified into a [`GenerationError`].

mod credential;
mod error;
mod job;
mod payload;
mod prompt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::{StreamExt, stream};
use log::{debug, info};
use std::time::Duration;

use crate::http::{ApiRequest, HttpClient, RetryPolicy};
use crate::runtime::Runtime;

pub use credential::{API_KEY_ENV, PLACEHOLDER_API_KEY, load_api_key};
pub use error::GenerationError;
pub use job::{GenerationJob, ImageResult, JobEvent, JobStatus, Observer};
#[cfg(test)]
pub use job::MockObserver;
pub use payload::{InferenceParameters, InferenceRequest};
pub use prompt::{STYLE_SUFFIX, normalize_prompt};

/// Images produced by one run.
pub const TOTAL_IMAGES: usize = 4;

/// Hosted Stable Diffusion model.
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/CompVis/stable-diffusion-v1-4";

/// Hard limit for one image, retries included.
pub const DEFAULT_DEADLINE_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub retry: RetryPolicy,
    /// Raced against the retrying request for every image.
    pub deadline: Duration,
    /// Image requests allowed in flight at once. 1 keeps the batch sequential.
    pub concurrency: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retry: RetryPolicy::default(),
            deadline: Duration::from_millis(DEFAULT_DEADLINE_MS),
            concurrency: 1,
        }
    }
}

pub struct Generator<R: Runtime> {
    runtime: R,
    http: HttpClient,
    config: GeneratorConfig,
}

impl<R: Runtime> Generator<R> {
    pub fn new(runtime: R, http: HttpClient, config: GeneratorConfig) -> Self {
        Self {
            runtime,
            http,
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Runs one batch for `prompt` and returns the finished job.
    ///
    /// The returned job is never `Running`: it either succeeded with
    /// [`TOTAL_IMAGES`] images or failed with one category, keeping whatever
    /// images were produced before the failure.
    #[tracing::instrument(skip(self, observer))]
    pub async fn generate(&self, prompt: &str, observer: &dyn Observer) -> GenerationJob {
        let mut job = GenerationJob::new(prompt, normalize_prompt(prompt), TOTAL_IMAGES);

        let outcome = match load_api_key(&self.runtime) {
            Ok(api_key) => {
                job.start();
                observer.publish(JobEvent::Started {
                    prompt: job.normalized_prompt().to_string(),
                    total: job.target(),
                });
                self.run_batch(&mut job, &api_key, observer).await
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            info!("Generation failed ({}): {}", err.category(), err);
        }
        job.finish(outcome);
        observer.publish(JobEvent::Finished {
            status: job.status().clone(),
            progress: job.progress(),
        });
        job
    }

    async fn run_batch(
        &self,
        job: &mut GenerationJob,
        api_key: &str,
        observer: &dyn Observer,
    ) -> Result<(), GenerationError> {
        let request = self.build_request(job.normalized_prompt(), api_key)?;
        let concurrency = self.config.concurrency.clamp(1, job.target().max(1));

        // `buffered` yields in request order, so images are appended without gaps
        // even when several requests are in flight.
        let mut results = stream::iter(0..job.target())
            .map(|ordinal| self.generate_one(&request, ordinal))
            .buffered(concurrency);

        while let Some(result) = results.next().await {
            let (image, progress) = job.push(result?);
            debug!("Image {} ready, progress {}%", image.ordinal() + 1, progress);
            observer.publish(JobEvent::ImageReady { image, progress });
        }
        Ok(())
    }

    fn build_request(&self, prompt: &str, api_key: &str) -> Result<ApiRequest, GenerationError> {
        ApiRequest::post_json(&self.config.endpoint, &InferenceRequest::new(prompt))
            .map_err(|e| GenerationError::Unknown(e.to_string()))?
            .bearer_auth(api_key)
            .map_err(|_| GenerationError::InvalidCredential)
    }

    /// One image: the retrying request raced against the deadline.
    /// When the deadline wins, the request future is dropped and its
    /// connection and backoff timer go with it.
    async fn generate_one(
        &self,
        request: &ApiRequest,
        ordinal: usize,
    ) -> Result<String, GenerationError> {
        info!("Requesting image {}/{}...", ordinal + 1, TOTAL_IMAGES);

        let body = tokio::time::timeout(
            self.config.deadline,
            self.http.attempt(request, &self.config.retry),
        )
        .await
        .map_err(|_| GenerationError::RequestTimeout)??;

        Ok(BASE64.encode(body))
    }
}
