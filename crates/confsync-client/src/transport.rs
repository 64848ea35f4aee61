use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use confsync_core::{RetryPolicy, SyncError};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Blocking HTTP transport with a fixed request timeout and bounded retries.
///
/// Only transport-level faults are retried here: connection errors, timeouts,
/// non-success status lines, empty or undecodable bodies. A well-formed JSON
/// body that happens to encode an application error is returned to the caller
/// untouched; classifying it is not the transport's job.
pub struct Transport {
    client: reqwest::blocking::Client,
    policy: RetryPolicy,
}

impl Transport {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport { attempts: 0, cause: e.to_string() })?;
        Ok(Self { client, policy })
    }

    /// POST `body` as JSON and decode the JSON response.
    pub fn post_json(&self, url: &str, body: &impl Serialize) -> Result<Value, SyncError> {
        self.with_retries(|| {
            let resp = self
                .client
                .post(url)
                .json(body)
                .send()
                .map_err(|e| e.to_string())?
                .error_for_status()
                .map_err(|e| e.to_string())?;
            let bytes = resp.bytes().map_err(|e| e.to_string())?;
            if bytes.is_empty() {
                return Err("empty response body".to_string());
            }
            serde_json::from_slice(&bytes).map_err(|e| format!("undecodable response body: {e}"))
        })
    }

    /// GET `url` and stream the body into `dest`. Returns the byte count.
    /// Nothing is left at `dest` after a failed attempt.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64, SyncError> {
        self.with_retries(|| {
            let mut resp = self
                .client
                .get(url)
                .send()
                .map_err(|e| e.to_string())?
                .error_for_status()
                .map_err(|e| e.to_string())?;
            let mut file = fs::File::create(dest).map_err(|e| e.to_string())?;
            let copied = resp.copy_to(&mut file).map_err(|e| e.to_string());
            match copied {
                Ok(n) if n > 0 => Ok(n),
                Ok(_) => {
                    let _ = fs::remove_file(dest);
                    Err("empty response body".to_string())
                }
                Err(cause) => {
                    let _ = fs::remove_file(dest);
                    Err(cause)
                }
            }
        })
    }

    fn with_retries<T>(
        &self,
        mut attempt_fn: impl FnMut() -> Result<T, String>,
    ) -> Result<T, SyncError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match attempt_fn() {
                Ok(value) => return Ok(value),
                Err(cause) => {
                    if !self.policy.allows_retry(attempt) {
                        return Err(SyncError::Transport { attempts: attempt, cause });
                    }
                    warn!(attempt, %cause, "transport attempt failed, retrying");
                    thread::sleep(self.policy.delay);
                }
            }
        }
    }
}
