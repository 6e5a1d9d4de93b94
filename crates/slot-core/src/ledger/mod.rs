//! Statistics ledger
//!
//! Spin records flow in through [`SpinRecorder`]. The tracker keeps a capped
//! newest-first history, lifetime aggregates and unlocked achievements, and
//! persists all three through a [`StatisticsStore`].

mod achievements;
mod export;
mod record;
mod stats;
mod store;
mod tracker;

pub use achievements::*;
pub use export::*;
pub use record::*;
pub use stats::*;
pub use store::*;
pub use tracker::*;

/// Sink for resolved spins
pub trait SpinRecorder: Send + Sync {
    /// Session the records belong to
    fn session_id(&self) -> String;

    /// Store a record, returning achievements it unlocked
    fn record(&self, record: SpinRecord) -> Vec<Achievement>;
}
