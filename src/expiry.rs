//! End-of-day housekeeping: the background worker that cancels all resting
//! day orders at market close.

use crate::engine::Shared;
use chrono::{DateTime, Local, NaiveTime, TimeDelta};
use tracing::{debug, info};

/// Default market close hour, local wall-clock time.
pub const MARKET_CLOSE_HOUR: u32 = 16;

/// Engine configuration. The defaults are the build-time constants; tests
/// and embedders with different trading hours can override the close time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Local wall-clock time at which resting day orders are cancelled.
    pub market_close: NaiveTime,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            market_close: NaiveTime::from_hms_opt(MARKET_CLOSE_HOUR, 0, 0)
                .expect("market close constant is a valid wall-clock time"),
        }
    }
}

/// Next instant the market closes: today at `close` if that is still ahead,
/// otherwise the same time tomorrow. A close time that falls in a DST fold
/// resolves to the earliest valid instant.
fn next_market_close(now: DateTime<Local>, close: NaiveTime) -> DateTime<Local> {
    let mut deadline = now.with_time(close).earliest().unwrap_or(now);
    if deadline <= now {
        deadline += TimeDelta::days(1);
    }
    deadline
}

/// Worker loop: sleep until the next market close or shutdown, whichever
/// comes first, then sweep day orders out of the book.
///
/// The sweep collects ids under the lock but releases it before cancelling
/// them, so public operations interleave freely; an id cancelled by another
/// caller in between is simply a no-op.
pub(crate) fn run(shared: &Shared) {
    loop {
        let deadline = next_market_close(Local::now(), shared.market_close);
        debug!(%deadline, "expiry worker waiting for market close");

        let mut state = shared.state.lock();
        loop {
            if state.shutdown {
                debug!("expiry worker shutting down");
                return;
            }
            // Recompute the remaining wait on every pass; a spurious wake
            // or a wall-clock jump just re-evaluates the deadline.
            let Ok(wait) = (deadline - Local::now()).to_std() else {
                break;
            };
            shared.shutdown_signal.wait_for(&mut state, wait);
        }

        let expiring = state.book.day_order_ids();
        drop(state);

        if !expiring.is_empty() {
            info!(count = expiring.len(), "market close: expiring day orders");
        }
        for id in expiring {
            shared.state.lock().book.cancel_order(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn close_at(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    #[test]
    fn close_is_later_today_when_still_ahead() {
        let now = Local.with_ymd_and_hms(2026, 8, 3, 15, 59, 0).unwrap();
        let deadline = next_market_close(now, close_at(16));
        assert_eq!(deadline.date_naive(), now.date_naive());
        assert_eq!(deadline.hour(), 16);
        assert_eq!(deadline - now, TimeDelta::minutes(1));
    }

    #[test]
    fn close_rolls_to_tomorrow_when_past() {
        let now = Local.with_ymd_and_hms(2026, 8, 3, 16, 0, 1).unwrap();
        let deadline = next_market_close(now, close_at(16));
        assert!(deadline > now);
        assert_eq!(deadline.date_naive(), now.date_naive() + TimeDelta::days(1));
    }

    #[test]
    fn close_exactly_now_rolls_forward() {
        let now = Local.with_ymd_and_hms(2026, 8, 3, 16, 0, 0).unwrap();
        let deadline = next_market_close(now, close_at(16));
        assert!(deadline > now);
    }

    #[test]
    fn default_close_is_sixteen_hundred() {
        let config = EngineConfig::default();
        assert_eq!(config.market_close, close_at(MARKET_CLOSE_HOUR));
    }
}
