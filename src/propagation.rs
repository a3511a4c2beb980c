#![warn(missing_docs)]
//! Step-by-step propagation of a single photon.
//!
//! The [`PropagationEngine`] requests events from a [`PhotonTracer`], resolves boundary hits with the
//! [`SurfaceModel`] and applies the drawn outcome to the [`PhotonRecord`] until the photon reaches a
//! [`TerminalState`].
use crate::{
    error::{LxeError, LxeResult},
    photon::{PhotonRecord, TerminalPhoton, TerminalState, UndetectedReason},
    run_context::RunContext,
    surface::{SurfaceModel, SurfaceOutcome, SurfaceResponse},
    tracer::{PhotonTracer, StepEvent},
};
use log::{debug, warn};
use nalgebra::Vector3;
use num::Zero;
use rand::{rngs::StdRng, Rng};
use std::{f64::consts::TAU, sync::Arc};
use uom::si::f64::{Angle, Length};

/// Drives photons through the geometry until they terminate.
#[derive(Debug, Clone)]
pub struct PropagationEngine {
    surfaces: Arc<SurfaceModel>,
    max_steps: usize,
}
impl PropagationEngine {
    /// Creates a new [`PropagationEngine`] using the step cap of the given run.
    #[must_use]
    pub fn new(surfaces: Arc<SurfaceModel>, context: &RunContext) -> Self {
        Self {
            surfaces,
            max_steps: context.max_steps(),
        }
    }
    /// Returns the maximum number of step events per photon.
    #[must_use]
    pub const fn max_steps(&self) -> usize {
        self.max_steps
    }
    /// Returns the surface model of this engine.
    #[must_use]
    pub fn surfaces(&self) -> &Arc<SurfaceModel> {
        &self.surfaces
    }
    /// Propagate a photon until it reaches a terminal state.
    ///
    /// At most `max_steps` events are requested from the tracer. A photon still alive afterwards is terminated as
    /// undetected (step limit). A boundary hit on a surface unknown to the surface model terminates the photon as
    /// undetected (unresolved) and logs a warning.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the tracer fails
    ///   - a surface cannot be resolved for other reasons than an unknown name (e.g. a wavelength outside the
    ///     range of a dichroic surface)
    ///   - the tracer reports invalid directions or normals
    pub fn propagate(
        &self,
        mut photon: PhotonRecord,
        tracer: &dyn PhotonTracer,
        rng: &mut StdRng,
    ) -> LxeResult<TerminalPhoton> {
        while photon.nr_of_steps() < self.max_steps {
            let event = tracer.next_event(&photon, rng)?;
            photon.count_step();
            match event {
                StepEvent::BoundaryHit {
                    surface,
                    incident_angle,
                    wavelength,
                    position,
                    normal,
                } => {
                    photon.set_position(position);
                    photon.set_incident_angle(incident_angle);
                    let (is_detector, response) =
                        match self.resolve_hit(&surface, wavelength, incident_angle) {
                            Ok(resolved) => resolved,
                            Err(LxeError::NotFound(msg)) => {
                                warn!(
                                    "photon #{}: {msg}. Terminating photon as unresolved.",
                                    photon.id()
                                );
                                return Ok(photon
                                    .terminate(TerminalState::Undetected(UndetectedReason::Unresolved)));
                            }
                            Err(e) => return Err(e),
                        };
                    match response.outcome(rng.random()) {
                        SurfaceOutcome::Transmit => {}
                        SurfaceOutcome::SpecularReflect => {
                            photon.mirror(&normal)?;
                            photon.add_specular_reflection();
                        }
                        SurfaceOutcome::DiffuseReflect => {
                            let incoming_side = incoming_side_normal(&photon.direction(), &normal)?;
                            photon.set_direction(cosine_weighted_direction(&incoming_side, rng))?;
                            photon.add_diffuse_reflection();
                        }
                        SurfaceOutcome::Absorb => {
                            let state = if is_detector {
                                TerminalState::Detected
                            } else {
                                TerminalState::SurfaceAbsorbed
                            };
                            return Ok(photon.terminate(state));
                        }
                    }
                }
                StepEvent::BulkScatter {
                    position,
                    direction,
                } => {
                    photon.set_position(position);
                    photon.set_direction(direction)?;
                    photon.add_scatter();
                }
                StepEvent::BulkAbsorb { position } => {
                    photon.set_position(position);
                    return Ok(photon.terminate(TerminalState::BulkAbsorbed));
                }
                StepEvent::NoHit => {
                    return Ok(photon.terminate(TerminalState::Undetected(UndetectedReason::NoHit)));
                }
                StepEvent::StepLimitExceeded => {
                    return Ok(
                        photon.terminate(TerminalState::Undetected(UndetectedReason::StepLimit))
                    );
                }
            }
        }
        debug!(
            "photon #{} reached the step limit of {}",
            photon.id(),
            self.max_steps
        );
        Ok(photon.terminate(TerminalState::Undetected(UndetectedReason::StepLimit)))
    }
    fn resolve_hit(
        &self,
        surface: &str,
        wavelength: Length,
        incident_angle: Angle,
    ) -> LxeResult<(bool, SurfaceResponse)> {
        let is_detector = self.surfaces.surface(surface)?.is_detector();
        let response = self.surfaces.resolve(surface, wavelength, incident_angle)?;
        Ok((is_detector, response))
    }
}

/// Returns the normalized surface normal pointing to the side the photon arrives from.
fn incoming_side_normal(direction: &Vector3<f64>, normal: &Vector3<f64>) -> LxeResult<Vector3<f64>> {
    let norm = normal.norm();
    if norm.is_zero() || !norm.is_finite() {
        return Err(LxeError::Propagation(
            "surface normal must have a length >0 and be finite".into(),
        ));
    }
    let n = normal / norm;
    Ok(if direction.dot(&n) > 0.0 { -n } else { n })
}

/// Sample a direction from a cosine-weighted hemisphere around the (normalized) `normal`.
fn cosine_weighted_direction<R: Rng + ?Sized>(normal: &Vector3<f64>, rng: &mut R) -> Vector3<f64> {
    let u: f64 = rng.random();
    let phi = TAU * rng.random::<f64>();
    let radius = u.sqrt();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let helper = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let tangent = normal.cross(&helper).normalize();
    let bitangent = normal.cross(&tangent);
    let local_z = (1.0 - u).max(0.0).sqrt();
    let direction = tangent * (radius * cos_phi) + bitangent * (radius * sin_phi) + normal * local_z;
    // u == 1.0 would yield a direction tangential to the surface
    if direction.dot(normal) > 0.0 {
        direction
    } else {
        *normal
    }
}
