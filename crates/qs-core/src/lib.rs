//! qs-core: shared foundation for the quantum-statistics workspace.
//!
//! Contains:
//! - numeric (Real, Scalar + tolerances + float helpers)
//! - units (uom SI types + natural-unit conversions)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{QsError, QsResult};
pub use numeric::*;
pub use units::*;
