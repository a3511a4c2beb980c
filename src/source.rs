#![warn(missing_docs)]
//! Photon emission
use crate::{
    error::{LxeError, LxeResult},
    photon::PhotonRecord,
    run_context::RunContext,
};
use log::info;
use nalgebra::{Point3, Vector3};
use num::Zero;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use uom::si::{f64::Length, length::nanometer};

/// Uniformly distributed direction on the unit sphere.
pub fn isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    let cos_theta: f64 = rng.random_range(-1.0..=1.0);
    let sin_theta = cos_theta.mul_add(-cos_theta, 1.0).max(0.0).sqrt();
    let phi = TAU * rng.random::<f64>();
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vector3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
}

/// Monochromatic point source emitting photons isotropically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotropicSource {
    position: Point3<Length>,
    wavelength: Length,
}
impl IsotropicSource {
    /// Creates a new [`IsotropicSource`].
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the wavelength is <= 0.0, `NaN` or +inf
    ///   - a coordinate of the position is not finite
    pub fn new(position: Point3<Length>, wavelength: Length) -> LxeResult<Self> {
        if wavelength.is_zero() || wavelength.is_sign_negative() || !wavelength.is_finite() {
            return Err(LxeError::Configuration("wavelength must be >0".into()));
        }
        if !position.iter().all(|c| c.is_finite()) {
            return Err(LxeError::Configuration(
                "source position must be finite".into(),
            ));
        }
        Ok(Self {
            position,
            wavelength,
        })
    }
    /// Returns the position of this [`IsotropicSource`].
    #[must_use]
    pub const fn position(&self) -> Point3<Length> {
        self.position
    }
    /// Returns the wavelength of this [`IsotropicSource`].
    #[must_use]
    pub const fn wavelength(&self) -> Length {
        self.wavelength
    }
    /// Emit the number of photons given in the run config. Photon ids are consecutive, starting at 0.
    ///
    /// The directions are drawn from the emission stream of the run and are hence reproducible for a given seed.
    ///
    /// # Errors
    ///
    /// This function will return an error if a photon record cannot be created.
    pub fn generate(&self, context: &RunContext) -> LxeResult<Vec<PhotonRecord>> {
        let nr_of_photons = context.config().nr_of_photons();
        info!(
            "emitting {nr_of_photons} photons at {:.2} nm",
            self.wavelength.get::<nanometer>()
        );
        let mut rng = context.source_rng();
        (0..nr_of_photons)
            .map(|id| {
                PhotonRecord::new(
                    id,
                    self.position,
                    isotropic_direction(&mut rng),
                    self.wavelength,
                )
            })
            .collect()
    }
}
