//! Shared HTTP transport: one ureq Agent process-wide with a 30 s request
//! timeout and an idle connection pool sized for registry traffic.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_IDLE_CONNECTIONS: usize = 100;
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Transport-level failure modes. Callers decide what a non-200 means.
#[derive(Debug)]
pub enum HttpError {
    /// Server responded with something other than 200.
    Status(u16),
    /// DNS, connect, timeout or body-read failure.
    Transport(String),
}

fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .max_idle_connections(MAX_IDLE_CONNECTIONS)
            .max_idle_connections_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .build()
    })
}

/// GET url through the shared agent. Non-200 becomes `HttpError::Status`.
pub fn get(url: &str) -> Result<ureq::Response, HttpError> {
    match agent().get(url).call() {
        Ok(resp) => {
            if resp.status() == 200 {
                Ok(resp)
            } else {
                Err(HttpError::Status(resp.status()))
            }
        }
        Err(ureq::Error::Status(code, _)) => Err(HttpError::Status(code)),
        Err(e) => Err(HttpError::Transport(e.to_string())),
    }
}

/// GET url and return the whole body (for metadata documents).
pub fn get_bytes(url: &str) -> Result<Vec<u8>, HttpError> {
    let resp = get(url)?;
    let mut buf = Vec::new();
    resp.into_reader()
        .read_to_end(&mut buf)
        .map_err(|e| HttpError::Transport(e.to_string()))?;
    Ok(buf)
}
