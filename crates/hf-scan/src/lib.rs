//! hf-scan: repeated equilibrium solves along one varying input.
//!
//! A [`ScanDefinition`] names what varies (a component total, a component
//! log activity or the ionic strength) and how the points are spaced.
//! [`run_scan`] walks the points with one solver, warm-starting each point
//! from the previous one, and [`ScanWorker`] does the same on a background
//! thread.

pub mod error;
pub mod scan;
pub mod worker;

pub use error::{ScanError, ScanResult};
pub use scan::{ScanDefinition, ScanOutput, ScanVariable, Spacing, run_scan};
pub use worker::{ScanMessage, ScanWorker};
