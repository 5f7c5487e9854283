//! # kerfnest Core
//!
//! Shared error taxonomy and drawing units used by every kerfnest crate.

pub mod error;
pub mod units;

pub use error::{GeometryError, ImportError, NestingError};
pub use units::DrawingUnits;
