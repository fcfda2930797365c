//! # tellus-field
//!
//! Named multi-axis arrays for gridded model fields.
//!
//! A [`Field`] pairs an `ndarray::ArrayD<f64>` with one [`Axis`] per
//! dimension. Every operation addresses axes by name, and any operation that
//! combines two fields checks their coordinates first, so a transposed or
//! shifted input fails loudly instead of producing misaligned numbers.
//!
//! Missing values are NaN throughout.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `axis` | Axis names and coordinate labels |
//! | `field` | The `Field` container and its reshaping operations |
//! | `reduce` | NaN-aware mean/std reductions along named axes |
//! | `error` | Error types |

mod axis;
mod error;
mod field;
mod reduce;

pub use axis::{Axis, Coords};
pub use error::FieldError;
pub use field::Field;
