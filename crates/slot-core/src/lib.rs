//! # slot-core — Spin resolution engine
//!
//! Weighted reel generation, payline evaluation, scatter-triggered free
//! spins, auto-spin sequencing and a persistent statistics ledger for a 5×3
//! video slot.
//!
//! ## Features
//!
//! - **Weighted Reels**: Independent per-cell draws from a validated symbol table
//! - **Paylines**: 15 fixed line shapes, left-anchored runs, deduplicated win cells
//! - **Free Spins**: 3/4/5 scatters award 12/15/20 free spins
//! - **Auto-Spin**: Bounded runs on a cadence, cancellable at any time
//! - **Ledger**: Capped history, streaks, achievements, JSON persistence
//! - **Timing Profiles**: Normal, Turbo, Studio (instant) timing modes
//!
//! ## Architecture
//!
//! ```text
//! AutoSpinController (optional)
//!     │
//!     v
//! SpinEngine ──── UserAccount (debit / credit / free spins)
//!     │
//!     ├── ReelGenerator (SymbolTable + RandomSource)
//!     └── PaylineEvaluator (paylines, multipliers)
//!           │
//!           v
//!     SpinResult → SpinRecord → StatisticsTracker → NotificationSink
//! ```

pub mod account;
pub mod autospin;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod paytable;
pub mod reels;
pub mod rng;
pub mod symbols;
pub mod timing;

pub use account::*;
pub use autospin::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use ledger::*;
pub use notify::*;
pub use paytable::*;
pub use reels::*;
pub use rng::*;
pub use symbols::*;
pub use timing::*;
