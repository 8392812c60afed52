// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event-Sourced Persistence Layer
//!
//! # Architecture
//! - Event Log = Primary truth (append-only, durable)
//! - Snapshots = Performance optimization (disposable)
//!
//! # Guarantees
//! - Events are validated, then fsync'd, then applied
//! - Crash-symmetric recovery via replay
//! - No partial commits

pub mod event_log;
pub mod event_replay;
pub mod event_commit;
pub mod event_proof;

pub use event_log::EventLogWriter;
pub use event_replay::recover_from_event_log;
pub use event_commit::{BroadcastObserver, LedgerCommitter};
pub use event_proof::build_ledger_proof;
