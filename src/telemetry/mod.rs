// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging and metrics.
//!
//! - **Logging**: `tracing` events, formatted by `tracing-subscriber`
//! - **Metrics**: in-process counters for events, dispatches and cancellations
//!
//! # Usage
//!
//! Initialize telemetry at application startup:
//!
//! ```rust,ignore
//! use giga_workflow::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::default())?;
//! ```
//!
//! Metrics are recorded only with the `telemetry` feature (on by default).
//! `release-logs` and `max-perf` strip log levels at compile time.

mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use metrics::{Histogram, MetricsSnapshot, OperationMetrics, WorkflowMetrics, GLOBAL_METRICS};
