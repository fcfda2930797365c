//! White-noise injection.

use ndarray::Zip;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tellus_field::Field;
use tracing::{debug, info};

use crate::config::{NoiseConfig, Sigma};
use crate::error::PerturbError;
use crate::reflect::reflect_negative;
use crate::result::NoiseResult;

/// Adds `sigma * N(0, 1)` to every value of `field`.
///
/// Exactly one draw is taken from `rng` per point, in row-major order of
/// the field's axes, whether or not the point is missing. The consumed
/// sequence therefore depends only on the field shape, so a run seeded once
/// at start-up is reproducible end to end.
///
/// With `adjust_negative` set, negative results are reflected about zero
/// (see [`reflect_negative`]).
///
/// # Errors
///
/// - [`PerturbError::EmptyField`] if `field` has no values.
/// - [`PerturbError::InvalidSigma`] if the configuration is invalid.
/// - [`PerturbError::Field`] if a per-cell sigma does not align with `field`.
#[tracing::instrument(skip(field, config, rng), fields(shape = ?field.shape()))]
pub fn add_gaussian_noise<R: Rng + ?Sized>(
    field: &Field,
    config: &NoiseConfig,
    rng: &mut R,
) -> Result<NoiseResult, PerturbError> {
    if field.is_empty() {
        return Err(PerturbError::EmptyField);
    }
    config.validate()?;

    let mut data = field.data().as_standard_layout().into_owned();
    match config.sigma() {
        Sigma::Constant(s) => {
            for v in data.iter_mut() {
                let z: f64 = StandardNormal.sample(rng);
                *v += s * z;
            }
        }
        Sigma::PerCell(sigma) => {
            let s = sigma.broadcast_values(field.axes())?;
            Zip::from(&mut data).and(&s).for_each(|v, &sd| {
                let z: f64 = StandardNormal.sample(&mut *rng);
                *v += sd * z;
            });
        }
    }
    debug!(points = data.len(), "noise added");

    let n_reflected = if config.adjust_negative() {
        reflect_negative(data.iter_mut())
    } else {
        0
    };
    if n_reflected > 0 {
        info!(n_reflected, "negative perturbed values reflected");
    }

    Ok(NoiseResult::new(field.with_data(data)?, n_reflected))
}
