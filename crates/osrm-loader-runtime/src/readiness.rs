//! TCP readiness probe for osrm-routed.
//!
//! Only connection establishment is exercised; no HTTP request is sent.

use std::time::Duration;

use osrm_loader_core::{LoaderError, LoaderResult};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

/// Delay before the first connection attempt.
pub const INITIAL_DELAY: Duration = Duration::from_millis(10);

/// Delay between connection attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Wait until `host:port` accepts a TCP connection.
///
/// Retries every [`POLL_INTERVAL`] after an [`INITIAL_DELAY`]; fails with
/// `ConnectionTimeout` once `deadline` has elapsed.
pub async fn wait_for_ready(host: &str, port: u16, deadline: Duration) -> LoaderResult<()> {
    let address = format!("{host}:{port}");
    info!(%address, "Waiting for osrm-routed to accept connections");

    let poll = async {
        sleep(INITIAL_DELAY).await;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match TcpStream::connect(address.as_str()).await {
                Ok(_) => return attempt,
                Err(e) => debug!(%address, attempt, error = %e, "Connection refused, retrying"),
            }
            sleep(POLL_INTERVAL).await;
        }
    };

    match timeout(deadline, poll).await {
        Ok(attempts) => {
            info!(%address, attempts, "osrm-routed is accepting connections");
            Ok(())
        }
        Err(_) => Err(LoaderError::ConnectionTimeout { timeout: deadline }),
    }
}
