//! hf-core: stable foundation for haltafall.
//!
//! Contains:
//! - units (uom SI types + constructors, °C / bar conversions)
//! - numeric (ln 10, finiteness and length checks, ln-domain clamps)
//! - cancel (cooperative cancellation token shared with long-running solves)
//! - error (shared error types)

pub mod cancel;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use cancel::CancelToken;
pub use error::{HfError, HfResult};
pub use numeric::*;
pub use units::*;
