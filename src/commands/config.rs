use anyhow::Result;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::{
    download::default_output_dir,
    generate::{DEFAULT_DEADLINE_MS, DEFAULT_ENDPOINT, GeneratorConfig},
    http::{DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_MAX_RETRIES, HttpClient, RetryPolicy},
    runtime::Runtime,
};

/// Options of one `generate` invocation, as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub api_url: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub save: bool,
    pub max_retries: usize,
    pub attempt_timeout_ms: u64,
    pub deadline_ms: u64,
    pub concurrency: usize,
    pub fail_fast: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            api_url: None,
            out_dir: None,
            save: true,
            max_retries: DEFAULT_MAX_RETRIES,
            attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
            deadline_ms: DEFAULT_DEADLINE_MS,
            concurrency: 1,
            fail_fast: false,
        }
    }
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub http: HttpClient,
    pub generator: GeneratorConfig,
    /// `None` when images should not be written to disk.
    pub out_dir: Option<PathBuf>,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, options: &GenerateOptions) -> Result<Self> {
        let client = Client::builder().user_agent("memegen-cli").build()?;

        let generator = GeneratorConfig {
            endpoint: options
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            retry: RetryPolicy {
                max_retries: options.max_retries,
                attempt_timeout: Duration::from_millis(options.attempt_timeout_ms),
                fail_fast: options.fail_fast,
                ..RetryPolicy::default()
            },
            deadline: Duration::from_millis(options.deadline_ms),
            concurrency: options.concurrency,
        };

        let out_dir = match (&options.out_dir, options.save) {
            (_, false) => None,
            (Some(dir), true) => Some(dir.clone()),
            (None, true) => Some(default_output_dir(&runtime)?),
        };

        Ok(Self {
            runtime,
            http: HttpClient::new(client),
            generator,
            out_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockito::Server;

    #[tokio::test]
    async fn test_config_client_sends_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", "memegen-cli")
            .create_async()
            .await;

        let options = GenerateOptions {
            out_dir: Some(PathBuf::from("/tmp")),
            ..GenerateOptions::default()
        };
        let config = Config::new(MockRuntime::new(), &options).unwrap();
        let _ = config.http.inner().get(server.url()).send().await;

        mock.assert_async().await;
    }

    #[test]
    fn test_config_defaults() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_download_dir()
            .returning(|| Some(PathBuf::from("/home/user/Downloads")));

        let config = Config::new(runtime, &GenerateOptions::default()).unwrap();

        assert_eq!(config.generator, GeneratorConfig::default());
        assert_eq!(config.out_dir, Some(PathBuf::from("/home/user/Downloads")));
    }

    #[test]
    fn test_config_from_options() {
        let options = GenerateOptions {
            api_url: Some("http://127.0.0.1:9999/model".to_string()),
            out_dir: Some(PathBuf::from("/tmp/memes")),
            save: true,
            max_retries: 5,
            attempt_timeout_ms: 1_000,
            deadline_ms: 2_000,
            concurrency: 2,
            fail_fast: true,
        };

        // Explicit out dir: the runtime is never asked for a default
        let config = Config::new(MockRuntime::new(), &options).unwrap();

        assert_eq!(config.generator.endpoint, "http://127.0.0.1:9999/model");
        assert_eq!(config.generator.retry.max_retries, 5);
        assert_eq!(config.generator.retry.attempt_timeout, Duration::from_secs(1));
        assert!(config.generator.retry.fail_fast);
        assert_eq!(config.generator.deadline, Duration::from_secs(2));
        assert_eq!(config.generator.concurrency, 2);
        assert_eq!(config.out_dir, Some(PathBuf::from("/tmp/memes")));
    }

    #[test]
    fn test_config_no_save_has_no_out_dir() {
        let options = GenerateOptions {
            save: false,
            ..GenerateOptions::default()
        };
        let config = Config::new(MockRuntime::new(), &options).unwrap();
        assert_eq!(config.out_dir, None);
    }
}
