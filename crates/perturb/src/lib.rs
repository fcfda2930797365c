//! Gaussian perturbation of gridded fields.
//!
//! Synthetic observations are produced by adding white noise to a
//! re-simulated field:
//!
//! 1. **Noise** — one standard-normal draw per point, scaled by a constant
//!    or per-cell sigma
//! 2. **Reflection** — optionally, negative results are mirrored about zero
//!
//! The generator is passed in by the caller, so one seeded RNG drives the
//! whole run and tests can pin the draw sequence.

mod config;
mod error;
mod noise;
mod reflect;
mod result;

pub use config::{NoiseConfig, Sigma};
pub use error::PerturbError;
pub use noise::add_gaussian_noise;
pub use reflect::reflect_negative;
pub use result::NoiseResult;
