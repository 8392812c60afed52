// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Offline forensic tooling over rootledger event logs and snapshots.

pub mod commands;
pub mod engine;
