pub mod commands;
pub mod download;
pub mod generate;
pub mod http;
pub mod runtime;

/// Test utilities shared by the unit tests.
#[cfg(test)]
pub mod test_utils {
    use crate::http::RetryPolicy;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Retry policy with the default budget but millisecond backoff.
    pub fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            attempt_timeout: Duration::from_secs(5),
            backoff_step: Duration::from_millis(10),
            backoff_cap: Duration::from_millis(40),
            fail_fast: false,
        }
    }

    /// Configure the mock runtime's HUGGINGFACE_API_KEY lookup.
    /// - `Some(key)`: the variable is set to `key`
    /// - `None`: the variable is absent
    pub fn configure_mock_api_key(runtime: &mut MockRuntime, key: Option<&str>) {
        let key = key.map(|k| k.to_string());
        runtime
            .expect_env_var()
            .with(eq("HUGGINGFACE_API_KEY"))
            .returning(move |_| key.clone().ok_or(std::env::VarError::NotPresent));
    }

    /// A server that accepts connections and never answers.
    /// Returns its URL and the number of accepted connections.
    pub async fn silent_server() -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                open.push(socket);
            }
        });

        (format!("http://{}/", addr), accepted)
    }

    /// A server that answers every request with 500 and closes the connection.
    /// Returns its URL and the instant each complete request arrived.
    pub async fn recording_server() -> (String, Arc<Mutex<Vec<Instant>>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let arrivals = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&arrivals);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    if read_request(&mut socket).await.is_none() {
                        return;
                    }
                    log.lock().unwrap().push(Instant::now());
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 500 Internal Server Error\r\n\
                              content-length: 0\r\n\
                              connection: close\r\n\r\n",
                        )
                        .await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{}/", addr), arrivals)
    }

    /// Reads one request head and its `content-length` body.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return None,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0);

        while buf.len() < head_end + length {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return None,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
        Some(buf)
    }

    /// A URL on a local port nothing listens on.
    pub async fn refused_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/", addr)
    }
}
