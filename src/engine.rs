//! Thread-safe engine surface: serializes public operations against the
//! background expiry worker behind a single mutex.

use crate::errors::EngineError;
use crate::expiry::{self, EngineConfig};
use crate::levels::BookSnapshot;
use crate::orderbook::OrderBook;
use crate::orders::{Amendment, Order, OrderId};
use crate::trade::Trade;
use chrono::NaiveTime;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Everything behind the lock: the book plus the shutdown flag the expiry
/// worker watches.
pub(crate) struct BookState {
    pub(crate) book: OrderBook,
    pub(crate) shutdown: bool,
}

pub(crate) struct Shared {
    pub(crate) state: Mutex<BookState>,
    pub(crate) shutdown_signal: Condvar,
    pub(crate) market_close: NaiveTime,
}

/// A [`MatchingEngine`] is an [`OrderBook`] behind a mutex, plus the worker
/// thread that cancels day orders at market close.
///
/// Every operation holds the lock for its full duration, so each one sees
/// and leaves a consistent book and a matching cascade never interleaves
/// with an expiry sweep. Dropping the engine signals the worker and joins
/// it.
pub struct MatchingEngine {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl MatchingEngine {
    /// Start an engine with the default market close (16:00 local).
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::default())
    }

    /// Start an engine whose day orders expire at `config.market_close`.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(BookState {
                book: OrderBook::new(),
                shutdown: false,
            }),
            shutdown_signal: Condvar::new(),
            market_close: config.market_close,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("expiry-worker".into())
            .spawn(move || expiry::run(&worker_shared))?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Submit an order; returns the trades it produced. See
    /// [`OrderBook::place_order`] for the rejection rules.
    pub fn place_order(&self, order: Order) -> Vec<Trade> {
        self.shared.state.lock().book.place_order(order)
    }

    /// Cancel a resting order; unknown ids are ignored.
    pub fn cancel_order(&self, id: OrderId) {
        self.shared.state.lock().book.cancel_order(id);
    }

    /// Cancel-replace a resting order; returns the trades produced by the
    /// replacement's placement.
    pub fn update_order(&self, amendment: Amendment) -> Vec<Trade> {
        self.shared.state.lock().book.update_order(amendment)
    }

    /// Per-level snapshot of both sides, best price first.
    pub fn levels_info(&self) -> BookSnapshot {
        self.shared.state.lock().book.levels_info()
    }

    /// Number of resting orders.
    pub fn size(&self) -> usize {
        self.shared.state.lock().book.size()
    }
}

impl Drop for MatchingEngine {
    fn drop(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.shutdown_signal.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("expiry worker panicked before shutdown");
            }
        }
    }
}
