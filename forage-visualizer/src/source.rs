use forage_common::Snapshot;
use std::time::Duration;
use thiserror::Error;

/// Why a poll produced no snapshot. Every variant ends the sync loop.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode snapshot from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Something that can be asked for the next snapshot, one request at a time.
pub trait SnapshotSource {
    fn poll_once(&mut self) -> Result<Snapshot, PollError>;
}

/// Fetches snapshots with `GET {endpoint}/step`.
pub struct HttpSource {
    agent: ureq::Agent,
    url: String,
}

impl HttpSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let url = format!("{}/step", endpoint.trim().trim_end_matches('/'));
        Self { agent, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for HttpSource {
    fn poll_once(&mut self) -> Result<Snapshot, PollError> {
        let response = match self.agent.get(&self.url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(PollError::Status { url: self.url.clone(), status })
            }
            Err(e) => {
                return Err(PollError::Transport { url: self.url.clone(), message: e.to_string() })
            }
        };
        // Redirects are followed by the agent; any other non-200 answer is unusable
        if response.status() != 200 {
            return Err(PollError::Status { url: self.url.clone(), status: response.status() });
        }
        let body = response
            .into_string()
            .map_err(|e| PollError::Transport { url: self.url.clone(), message: e.to_string() })?;
        Snapshot::from_json(&body).map_err(|source| PollError::Decode { url: self.url.clone(), source })
    }
}
