//! End-to-end tests of the block driver against an in-memory device.
//!
//! The mock device keeps one 64-byte memory per domain and records every
//! transfer, so tests can check both channel results and how requests were
//! merged.

mod mock;
mod read;
mod update;
