//! Wavelength selective (dichroic) surface
use super::{SurfaceOptics, SurfaceResponse, PROBABILITY_TOLERANCE};
use crate::{
    error::{LxeError, LxeResult},
    property_table::{PropertyCurve, PropertyTable, REFLECTION, TRANSMISSION},
};
use uom::si::{
    f64::{Angle, Length},
    length::nanometer,
};

/// Dichroic filter surface.
///
/// Transmission and (specular) reflection only depend on the wavelength and are linearly interpolated between
/// the tabulated points. The angle of incidence is ignored. Wavelengths outside the tabulated range are rejected
/// with an [`LxeError::OutOfDomain`] error since extrapolating a filter curve is not meaningful.
#[derive(Debug, Clone, PartialEq)]
pub struct Dichroic {
    transmission: PropertyCurve,
    reflection: PropertyCurve,
}
impl Dichroic {
    /// Creates a new [`Dichroic`] surface from a [`PropertyTable`] with the columns `transmission` and `reflection`.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::Configuration`] if
    ///   - a column is missing or malformed
    ///   - a coefficient is outside `[0.0, 1.0]`
    ///   - transmission + reflection exceeds 1.0 at any tabulated wavelength
    pub fn from_table(table: &PropertyTable) -> LxeResult<Self> {
        let transmission = table.curve(TRANSMISSION)?;
        let reflection = table.curve(REFLECTION)?;
        for (t, r) in transmission.values().into_iter().zip(reflection.values()) {
            if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&r) {
                return Err(LxeError::Configuration(format!(
                    "dichroic coefficients of '{}' must be within [0.0, 1.0]",
                    table.name()
                )));
            }
            if t + r > 1.0 + PROBABILITY_TOLERANCE {
                return Err(LxeError::Configuration(format!(
                    "transmission + reflection of '{}' must not exceed 1.0",
                    table.name()
                )));
            }
        }
        Ok(Self {
            transmission,
            reflection,
        })
    }
    /// Returns the interpolated transmission at the given wavelength.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::OutOfDomain`] if the wavelength is outside the tabulated range.
    pub fn transmission(&self, wavelength: Length) -> LxeResult<f64> {
        lookup(&self.transmission, wavelength)
    }
    /// Returns the interpolated reflection at the given wavelength.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::OutOfDomain`] if the wavelength is outside the tabulated range.
    pub fn reflection(&self, wavelength: Length) -> LxeResult<f64> {
        lookup(&self.reflection, wavelength)
    }
}
fn lookup(curve: &PropertyCurve, wavelength: Length) -> LxeResult<f64> {
    curve.value(wavelength).ok_or_else(|| {
        let range = curve.range();
        LxeError::OutOfDomain(format!(
            "wavelength {:.2} nm outside dichroic range {:.2} nm - {:.2} nm",
            wavelength.get::<nanometer>(),
            range.start.get::<nanometer>(),
            range.end.get::<nanometer>()
        ))
    })
}
impl SurfaceOptics for Dichroic {
    fn response(
        &self,
        wavelength: Length,
        _incident_angle: Angle,
        _n_outer: f64,
    ) -> LxeResult<SurfaceResponse> {
        let t = self.transmission(wavelength)?;
        let r = self.reflection(wavelength)?;
        SurfaceResponse::new(r, 0.0, t, (1.0 - t - r).max(0.0))
    }
}
