#![warn(missing_docs)]
//! Optical surface model.
//!
//! A [`SurfaceModel`] holds all named [`Surface`]s of a run. For a given surface, wavelength and local angle of
//! incidence it resolves the probabilities of the four possible outcomes of a photon-surface interaction
//! (specular reflection, diffuse reflection, transmission and absorption) as a [`SurfaceResponse`].
//!
//! All table validation happens while surfaces are added to the model. A constructed model only fails at resolve
//! time for unknown surface names ([`LxeError::NotFound`]) or for wavelengths outside the support of a dichroic
//! curve ([`LxeError::OutOfDomain`]).
use crate::{
    error::{LxeError, LxeResult},
    materials::MaterialStore,
};
use log::{debug, info};
use std::{collections::HashMap, fmt::Display, sync::Arc};
use uom::si::f64::{Angle, Length};

mod dichroic;
mod empirical;
mod fresnel;
mod standard;

pub use dichroic::Dichroic;
pub use empirical::EmpiricalDetector;
pub use fresnel::{fresnel_reflectance, normal_incidence_reflectance, DielectricMetal};
pub use standard::Standard;

/// Tolerance for the sum of all outcome probabilities.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Possible outcome of a photon-surface interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOutcome {
    /// mirror-like reflection
    SpecularReflect,
    /// reflection into a cosine-weighted hemisphere
    DiffuseReflect,
    /// transmission into the next medium
    Transmit,
    /// absorption on the surface (or detection on a detector surface)
    Absorb,
}

/// Outcome probabilities of a photon-surface interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceResponse {
    p_specular: f64,
    p_diffuse: f64,
    p_transmit: f64,
    p_absorb: f64,
}
impl SurfaceResponse {
    /// Creates a new [`SurfaceResponse`].
    ///
    /// # Errors
    ///
    /// This function will return an error if a probability is outside `[0.0, 1.0]` or the sum differs from 1.0 by
    /// more than [`PROBABILITY_TOLERANCE`].
    pub fn new(p_specular: f64, p_diffuse: f64, p_transmit: f64, p_absorb: f64) -> LxeResult<Self> {
        let probabilities = [p_specular, p_diffuse, p_transmit, p_absorb];
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(LxeError::Configuration(
                "surface probabilities must be within [0.0, 1.0]".into(),
            ));
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(LxeError::Configuration(format!(
                "surface probabilities must sum up to 1.0 (got {sum})"
            )));
        }
        Ok(Self {
            p_specular,
            p_diffuse,
            p_transmit,
            p_absorb,
        })
    }
    /// Creates a [`SurfaceResponse`] from a reflectance split into a diffuse and a specular part. All remaining
    /// probability is assigned to absorption.
    pub(crate) fn from_reflectance(reflectance: f64, diffuse_fraction: f64) -> LxeResult<Self> {
        let r = reflectance.clamp(0.0, 1.0);
        let p_diffuse = r * diffuse_fraction;
        Self::new(r - p_diffuse, p_diffuse, 0.0, 1.0 - r)
    }
    /// Returns the probability of a specular reflection.
    #[must_use]
    pub const fn p_specular(&self) -> f64 {
        self.p_specular
    }
    /// Returns the probability of a diffuse reflection.
    #[must_use]
    pub const fn p_diffuse(&self) -> f64 {
        self.p_diffuse
    }
    /// Returns the probability of a transmission.
    #[must_use]
    pub const fn p_transmit(&self) -> f64 {
        self.p_transmit
    }
    /// Returns the probability of an absorption.
    #[must_use]
    pub const fn p_absorb(&self) -> f64 {
        self.p_absorb
    }
    /// Returns the sum of all probabilities (should be 1.0 within [`PROBABILITY_TOLERANCE`]).
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.p_specular + self.p_diffuse + self.p_transmit + self.p_absorb
    }
    /// Select an outcome for a uniformly distributed random number `u` in `[0.0, 1.0)`.
    ///
    /// The unit interval is partitioned in the order specular, diffuse, transmit, absorb. Outcomes with zero
    /// probability are never selected, even if rounding leaves a tiny gap at the upper end.
    #[must_use]
    pub fn outcome(&self, u: f64) -> SurfaceOutcome {
        let categories = [
            (SurfaceOutcome::SpecularReflect, self.p_specular),
            (SurfaceOutcome::DiffuseReflect, self.p_diffuse),
            (SurfaceOutcome::Transmit, self.p_transmit),
            (SurfaceOutcome::Absorb, self.p_absorb),
        ];
        let mut cumulative = 0.0;
        for (outcome, p) in categories {
            cumulative += p;
            if p > 0.0 && u < cumulative {
                return outcome;
            }
        }
        categories
            .iter()
            .rev()
            .find(|c| c.1 > 0.0)
            .map_or(SurfaceOutcome::Absorb, |c| c.0)
    }
}
impl Display for SurfaceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "specular: {:.4}, diffuse: {:.4}, transmit: {:.4}, absorb: {:.4}",
            self.p_specular, self.p_diffuse, self.p_transmit, self.p_absorb
        )
    }
}

/// All surface models must implement this trait.
pub trait SurfaceOptics {
    /// Calculate the outcome probabilities for the given wavelength, local angle of incidence and real refractive
    /// index of the outer medium.
    ///
    /// # Errors
    ///
    /// This function returns an error if the wavelength is outside the support of a table which must not be
    /// extrapolated.
    fn response(
        &self,
        wavelength: Length,
        incident_angle: Angle,
        n_outer: f64,
    ) -> LxeResult<SurfaceResponse>;
}

/// Available surface models
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceKind {
    /// wavelength selective filter, angle independent
    Dichroic(Dichroic),
    /// interface between a dielectric and an absorbing medium with complex refractive index (complex Fresnel equations)
    DielectricMetal(DielectricMetal),
    /// detector face with an empirically calibrated (angle, wavelength) reflectance table
    EmpiricalDetector(EmpiricalDetector),
    /// constant specular / diffuse / absorption fractions, remainder is transmitted
    Standard(Standard),
}
impl SurfaceKind {
    /// Calculate the [`SurfaceResponse`] of the underlying surface model.
    ///
    /// # Errors
    ///
    /// This function returns an error if the underlying model fails (see [`SurfaceOptics::response`]).
    pub fn response(
        &self,
        wavelength: Length,
        incident_angle: Angle,
        n_outer: f64,
    ) -> LxeResult<SurfaceResponse> {
        match self {
            Self::Dichroic(s) => s.response(wavelength, incident_angle, n_outer),
            Self::DielectricMetal(s) => s.response(wavelength, incident_angle, n_outer),
            Self::EmpiricalDetector(s) => s.response(wavelength, incident_angle, n_outer),
            Self::Standard(s) => s.response(wavelength, incident_angle, n_outer),
        }
    }
}
impl Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dichroic(_) => write!(f, "dichroic"),
            Self::DielectricMetal(_) => write!(f, "dielectric-metal"),
            Self::EmpiricalDetector(_) => write!(f, "empirical detector"),
            Self::Standard(_) => write!(f, "standard"),
        }
    }
}

/// A named optical boundary between an inner and an outer material.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    name: String,
    kind: SurfaceKind,
    inner_material: String,
    outer_material: String,
    detector: bool,
}
impl Surface {
    /// Creates a new (non-detecting) [`Surface`].
    ///
    /// Materials are referenced by name only. They are checked when the surface is added to a [`SurfaceModel`].
    #[must_use]
    pub fn new(name: &str, kind: SurfaceKind, inner_material: &str, outer_material: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            inner_material: inner_material.to_owned(),
            outer_material: outer_material.to_owned(),
            detector: false,
        }
    }
    /// Flag this surface as detector surface. Absorptions on a detector surface count as detections.
    #[must_use]
    pub const fn as_detector(mut self) -> Self {
        self.detector = true;
        self
    }
    /// Returns the name of this [`Surface`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the surface model of this [`Surface`].
    #[must_use]
    pub const fn kind(&self) -> &SurfaceKind {
        &self.kind
    }
    /// Returns the name of the inner material.
    #[must_use]
    pub fn inner_material(&self) -> &str {
        &self.inner_material
    }
    /// Returns the name of the outer material (the medium the photon arrives from).
    #[must_use]
    pub fn outer_material(&self) -> &str {
        &self.outer_material
    }
    /// Returns true if this is a detector surface.
    #[must_use]
    pub const fn is_detector(&self) -> bool {
        self.detector
    }
}

/// Collection of all [`Surface`]s of a run.
///
/// The model is read-only after construction and can be shared between worker threads.
#[derive(Debug, Clone)]
pub struct SurfaceModel {
    materials: Arc<MaterialStore>,
    surfaces: HashMap<String, Surface>,
}
impl SurfaceModel {
    /// Creates a new, empty [`SurfaceModel`] using the given shared material store.
    #[must_use]
    pub fn new(materials: Arc<MaterialStore>) -> Self {
        Self {
            materials,
            surfaces: HashMap::new(),
        }
    }
    /// Add a [`Surface`] to this model.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::Configuration`] if
    ///   - a surface with the same name already exists
    ///   - the inner or outer material is not part of the material store
    ///   - a dielectric-metal surface produces non-physical reflectances on its validation grid
    pub fn add_surface(&mut self, surface: Surface) -> LxeResult<()> {
        if self.surfaces.contains_key(surface.name()) {
            return Err(LxeError::Configuration(format!(
                "surface '{}' defined twice",
                surface.name()
            )));
        }
        for material in [surface.inner_material(), surface.outer_material()] {
            self.materials.get(material).map_err(|_| {
                LxeError::Configuration(format!(
                    "surface '{}' refers to unknown material '{material}'",
                    surface.name()
                ))
            })?;
        }
        if let SurfaceKind::DielectricMetal(metal) = surface.kind() {
            let outer = self.materials.get(surface.outer_material())?;
            metal
                .validate(|wvl| outer.refractive_index(wvl))
                .map_err(|e| {
                    LxeError::Configuration(format!("surface '{}': {e}", surface.name()))
                })?;
        }
        info!(
            "adding {} surface '{}'{}",
            surface.kind(),
            surface.name(),
            if surface.is_detector() { " (detector)" } else { "" }
        );
        self.surfaces.insert(surface.name().to_owned(), surface);
        Ok(())
    }
    /// Get a [`Surface`] by name.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::NotFound`] if the surface does not exist.
    pub fn surface(&self, name: &str) -> LxeResult<&Surface> {
        self.surfaces
            .get(name)
            .ok_or_else(|| LxeError::NotFound(format!("surface '{name}' not found")))
    }
    /// Returns the number of surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }
    /// Returns true if the model does not contain any surface.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
    /// Resolve the outcome probabilities for a photon hitting the named surface.
    ///
    /// # Errors
    ///
    /// This function will return
    ///   - [`LxeError::NotFound`] if the surface name is unknown.
    ///   - [`LxeError::OutOfDomain`] if the wavelength is outside the curve of a dichroic surface.
    pub fn resolve(
        &self,
        surface_name: &str,
        wavelength: Length,
        incident_angle: Angle,
    ) -> LxeResult<SurfaceResponse> {
        let surface = self.surface(surface_name)?;
        let n_outer = self
            .materials
            .get(surface.outer_material())?
            .refractive_index(wavelength);
        let response = surface.kind().response(wavelength, incident_angle, n_outer)?;
        debug!("surface '{surface_name}' resolved to {response}");
        Ok(response)
    }
}
