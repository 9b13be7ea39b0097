//! Poll state synchronization and result aggregation.
//!
//! A [`Reconciler`] keeps an operator-facing view of polls consistent between
//! a remote [`PollStore`] and a [`LocalMirror`] snapshot, fed by the
//! [`ChangeChannel`] and a periodic reconciliation tick. The [`results`]
//! module turns raw vote counts into chart-ready projections.

pub mod app;
pub mod channel;
pub mod config;
pub mod error;
pub mod handlers;
pub mod poll;
pub mod reconciler;
pub mod results;
pub mod service;
pub mod storage;
pub mod ui;
pub mod view;

pub use channel::{ChangeChannel, ChangeEvent, ChangeListener};
pub use error::SyncError;
pub use poll::{OptionStat, Poll, PollFilters, PollOption, PollStatus, Stats};
pub use reconciler::{Reconciler, SyncEvent, SyncState};
pub use service::PollStore;
pub use storage::{LocalMirror, SlotChange, SlotSubscription};
