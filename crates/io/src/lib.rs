//! # tellus-io
//!
//! File formats at the edges of the tellus pipeline.
//!
//! - **NetCDF** gridded fields: state snapshots (one file per instant),
//!   simulator history products, and the synthetic observation product.
//! - **Parquet** flow tables: observed and routed streamflow per site, with
//!   an optional ensemble member column.
//! - **CSV** gauge metadata (observed drainage area per site).
//!
//! Everything is converted to [`tellus_field::Field`] or the series
//! containers in this crate at the boundary; nothing downstream sees a file
//! handle.

mod error;
mod history;
mod netcdf_read;
mod netcdf_write;
mod parquet_read;
mod parquet_write;
mod series;
mod site_info;
mod snapshot;
mod synthetic;
mod writer;

pub use error::IoError;
pub use history::read_history;
pub use netcdf_read::{read_field, read_times};
pub use netcdf_write::write_fields;
pub use parquet_read::{read_ensemble_table, read_site_table};
pub use series::{EnsembleSeries, SiteSeries};
pub use site_info::read_drainage_areas;
pub use snapshot::{read_state_series, save_updated_state, snapshot_path, snapshot_time};
pub use synthetic::{synthetic_product_path, write_synthetic_product};
pub use writer::{Compression, WriterConfig, write_ensemble_table, write_site_table};
