//! Surface with constant outcome fractions
use super::{SurfaceOptics, SurfaceResponse, PROBABILITY_TOLERANCE};
use crate::error::{LxeError, LxeResult};
use serde::{Deserialize, Serialize};
use uom::si::f64::{Angle, Length};

/// Surface with wavelength and angle independent specular, diffuse and absorption fractions.
///
/// Whatever is not reflected or absorbed is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standard {
    specular: f64,
    diffuse: f64,
    absorb: f64,
}
impl Standard {
    /// Creates a new [`Standard`] surface.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::Configuration`] if a fraction is outside `[0.0, 1.0]` or the sum
    /// of all fractions exceeds 1.0.
    pub fn new(specular: f64, diffuse: f64, absorb: f64) -> LxeResult<Self> {
        if [specular, diffuse, absorb]
            .iter()
            .any(|p| !(0.0..=1.0).contains(p))
        {
            return Err(LxeError::Configuration(
                "surface fractions must be within [0.0, 1.0]".into(),
            ));
        }
        if specular + diffuse + absorb > 1.0 + PROBABILITY_TOLERANCE {
            return Err(LxeError::Configuration(
                "sum of specular, diffuse and absorption fraction must not exceed 1.0".into(),
            ));
        }
        Ok(Self {
            specular,
            diffuse,
            absorb,
        })
    }
    /// Returns the transmitted fraction.
    #[must_use]
    pub fn transmit(&self) -> f64 {
        (1.0 - self.specular - self.diffuse - self.absorb).max(0.0)
    }
}
impl SurfaceOptics for Standard {
    fn response(
        &self,
        _wavelength: Length,
        _incident_angle: Angle,
        _n_outer: f64,
    ) -> LxeResult<SurfaceResponse> {
        SurfaceResponse::new(self.specular, self.diffuse, self.transmit(), self.absorb)
    }
}
