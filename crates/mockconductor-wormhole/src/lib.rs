//! Wormhole client - asks a remote signer for a detached signature over HTTP
//!
//! `POST <url>` with `{ "agent_id": …, "payload": … }`. A 200 carries the
//! signature as the plain response body; any other status is a service
//! error carrying the body text. Structured payloads are sent in canonical
//! form so the signer signs exactly the bytes that will later be verified.

use mockconductor_core::{canonical_string, Error, Result, WormholeConfig};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, Serialize)]
pub struct WormholeRequest<'a> {
    pub agent_id: &'a str,
    pub payload: String,
}

/// The message a signer is asked to sign. Strings pass through verbatim.
pub fn wormhole_message(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => canonical_string(other),
    }
}

#[derive(Clone)]
pub struct WormholeClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WormholeClient {
    pub fn new(config: &WormholeConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn request_signature(&self, agent_id: &str, payload: &Value) -> Result<String> {
        let body = WormholeRequest {
            agent_id,
            payload: wormhole_message(payload),
        };
        debug!(
            agent_id,
            bytes = body.payload.len(),
            url = %self.url,
            "wormhole signature request"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        debug!(%status, "wormhole response: {}", text);
        if status != StatusCode::OK {
            error!(%status, "wormhole signer refused: {}", text);
            return Err(Error::Service {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_pass_through_and_structures_are_canonical() {
        assert_eq!(wormhole_message(&json!("raw text")), "raw text");
        assert_eq!(
            wormhole_message(&json!({ "some": "entry", "foo": "bar" })),
            r#"{"foo":"bar","some":"entry"}"#
        );
    }

    #[test]
    fn client_takes_config() {
        let client = WormholeClient::new(&WormholeConfig::default()).unwrap();
        assert_eq!(client.url(), "http://localhost:9676/");
        assert_eq!(client.timeout(), Duration::from_millis(1000));
    }
}
