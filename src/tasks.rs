//! Cancellable fixed-interval background tasks.
//!
//! Used for the token blacklist janitor, login rate-limiter cleanup and the
//! order expiry sweeper. Each task owns a `tokio::time::interval` ticker and
//! exits when its `CancellationToken` is cancelled.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const MAX_PERIOD: Duration = Duration::from_secs(30 * 365 * 86_400);

/// Spawn `job` to run every `period` until the returned token is cancelled.
///
/// The first run happens one full `period` after spawning.
pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, job: F) -> CancellationToken
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    // Keeps `now + period` inside the clock's range.
    let period = period.min(MAX_PERIOD);
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(task = name, interval_secs = period.as_secs_f64(), "Periodic task started");

        loop {
            tokio::select! {
                _ = cancel_clone.cancelled() => {
                    info!(task = name, "Periodic task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    debug!(task = name, "Periodic task tick");
                    job().await;
                }
            }
        }
    });

    cancel
}
