//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gateway handler ─┐
//! dispatcher ──────┼─→ logging.rs (tracing events, request_id on every line)
//! schema resolver ─┤
//! client registry ─┴─→ metrics.rs (Prometheus counters, histograms, gauge)
//! ```
//!
//! Logs go to stdout, pretty or JSON. Metrics are scraped from the
//! exporter's own listener, separate from the gateway and admin ports.

pub mod logging;
pub mod metrics;
