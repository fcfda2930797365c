//! Two-level rescaling of soil-moisture states.
//!
//! A truth state series with sub-grid tiles (vegetation class, snow band) is
//! rescaled so that its grid-cell means match the temporal mean and spread of
//! a reference (open-loop) series, while each tile keeps its own anomaly
//! relative to the cell mean.
//!
//! # Pipeline
//!
//! 1. **Statistics** — [`Climatology`] of the collapsed truth and the reference
//! 2. **Cell rescale** — `(cell - mean) * (ref_std / std) + ref_mean`
//! 3. **Tile restore** — `tile - cell + rescaled_cell`
//! 4. **Bounds** — [`enforce_bounds`] clips to `[0, max_moist]`

mod bounds;
mod climatology;
mod config;
mod error;
mod rescale;
mod result;

pub use bounds::{BoundReport, enforce_bounds, max_soil_moisture};
pub use climatology::Climatology;
pub use config::{RescaleConfig, ZeroSpreadPolicy};
pub use error::RescaleError;
pub use rescale::rescale_two_level;
pub use result::RescaleResult;
