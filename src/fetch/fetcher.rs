use super::*;
use crate::config::FetchConfig;
use tracing::{debug, warn};

/// Posts the stats request and parses the answer, re-requesting while a JSON
/// response fails to parse. Retry state lives in a single `fetch` call.
pub struct Fetcher<T> {
    transport: T,
    endpoint: String,
    max_retries: u32,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, endpoint: impl Into<String>, max_retries: u32) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            max_retries,
        }
    }

    pub fn from_config(transport: T, config: &FetchConfig) -> Self {
        Self::new(transport, config.endpoint.clone(), config.max_retries)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch(&self, payload: &Value) -> Result<FetchResponse, FetchError> {
        let body = serde_json::to_vec(payload).map_err(FetchError::Encode)?;
        let mut retries = 0;

        loop {
            let attempt = retries + 1;
            debug!("POST {} (attempt {})", self.endpoint, attempt);

            // Transport failures propagate immediately; only parse failures retry.
            let response = self.transport.post_json(&self.endpoint, body.clone()).await?;
            debug!(
                "Received HTTP {} with {} bytes ({})",
                response.status,
                response.body.len(),
                response.content_type.as_deref().unwrap_or("no content type")
            );

            if !response.is_success() {
                warn!("Stats endpoint answered with HTTP {}", response.status);
            }

            if !response.is_json() {
                return Ok(FetchResponse::Raw {
                    content_type: response.content_type,
                    body: response.body,
                });
            }

            match serde_json::from_slice(&response.body) {
                Ok(value) => return Ok(FetchResponse::Json(value)),
                Err(err) if retries < self.max_retries => {
                    retries += 1;
                    warn!(
                        "Response body is not valid JSON ({}), retrying {}/{}",
                        err, retries, self.max_retries
                    );
                }
                Err(source) => {
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}
