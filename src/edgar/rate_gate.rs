// src/edgar/rate_gate.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::utils::error::EdgarError;

/// SEC asks for at most 10 requests/second; stay just above 100ms.
pub const DEFAULT_SPACING: Duration = Duration::from_millis(111);

/// Shared gate enforcing a minimum spacing between outbound requests.
///
/// Waiters queue on a fair mutex, so tasks pass in arrival order. The gate
/// only orders request start times; it holds no data. Closing the gate makes
/// every current and future waiter fail with [`EdgarError::Cancelled`].
#[derive(Debug)]
pub struct RateGate {
    last_request: Mutex<Option<Instant>>,
    spacing: Duration,
    closed: AtomicBool,
}

impl RateGate {
    pub fn new(spacing: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            spacing,
            closed: AtomicBool::new(false),
        }
    }

    /// Waits until `spacing` has passed since the previous request, then
    /// claims the current instant as the latest request time.
    pub async fn acquire(&self) -> Result<(), EdgarError> {
        let mut last = self.last_request.lock().await;
        if self.is_closed() {
            return Err(EdgarError::Cancelled);
        }
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.spacing {
                sleep(self.spacing - elapsed).await;
            }
        }
        if self.is_closed() {
            return Err(EdgarError::Cancelled);
        }
        *last = Some(Instant::now());
        Ok(())
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::warn!("Rate gate closed; no further requests will be issued");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
