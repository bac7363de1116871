//! Relances avec attente exponentielle

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FetchError;

/// Nombre de relances et facteur d'attente
///
/// L'attente avant la relance `n` (à partir de 1) vaut `backoff * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Relances après la première tentative
    pub max_retries: u32,

    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Sans attente (tests)
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    /// Attente avant la relance `retry` (1, 2, 3...)
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(retry.saturating_sub(1))
    }

    /// Exécute `op` jusqu'au succès, à une erreur non relançable ou à l'épuisement des relances
    ///
    /// `op` reçoit le numéro de tentative (0 pour la première).
    pub fn run<T>(
        &self,
        url: &str,
        mut op: impl FnMut(u32) -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay(attempt);
                    debug!(url = %url, attempt, delay_ms = delay.as_millis() as u64, error = %e, "Retrying");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(e) => {
                    if attempt > 0 {
                        warn!(url = %url, attempts = attempt + 1, error = %e, "Giving up");
                    }
                    return Err(e);
                }
            }
        }
    }
}
