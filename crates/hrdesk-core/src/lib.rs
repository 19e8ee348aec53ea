//! Core types, rule engines and the storage abstraction for hrdesk.
//!
//! This crate has no HTTP or database dependencies. The payroll calculator,
//! the KRA approval state machine and KPI scoring are pure functions over
//! plain records; the [`service`] layer wires them to any
//! [`store::DocumentStore`] passed in by the caller.

// Native `async fn` in traits; see `store::DocumentStore`.
#![allow(async_fn_in_trait)]

pub mod employee;
pub mod error;
pub mod fiscal;
pub mod kpi;
pub mod kra;
pub mod memory;
pub mod payroll;
pub mod record;
pub mod role;
pub mod service;
pub mod store;

pub use error::{Error, Result};
