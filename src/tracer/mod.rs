#![warn(missing_docs)]
//! Interface to the geometry engine.
//!
//! A [`PhotonTracer`] advances a photon through the detector geometry and reports what happens next as a
//! [`StepEvent`]. The tracer never decides about surface interactions: it only reports boundary hits together
//! with the local geometry and leaves the decision to the
//! [`PropagationEngine`](crate::propagation::PropagationEngine).
use crate::{error::LxeResult, photon::PhotonRecord};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use uom::si::f64::{Angle, Length};

mod spherical_vessel;

pub use spherical_vessel::SphericalVessel;

/// Next event of a photon as reported by a [`PhotonTracer`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// The photon reached a boundary.
    BoundaryHit {
        /// name of the surface (resolved by the surface model)
        surface: String,
        /// local angle of incidence, measured from the surface normal
        incident_angle: Angle,
        /// wavelength of the photon
        wavelength: Length,
        /// position of the hit
        position: Point3<Length>,
        /// surface normal at the hit position
        normal: Vector3<f64>,
    },
    /// The photon was scattered inside a bulk material.
    BulkScatter {
        /// position of the scatter event
        position: Point3<Length>,
        /// new propagation direction
        direction: Vector3<f64>,
    },
    /// The photon was absorbed inside a bulk material.
    BulkAbsorb {
        /// position of the absorption
        position: Point3<Length>,
    },
    /// The photon left the geometry without hitting a surface.
    NoHit,
    /// The tracer refuses to advance this photon any further.
    StepLimitExceeded,
}

/// Geometry engines must implement this trait.
///
/// Implementations are shared between worker threads and must not keep per-photon state. All randomness has to be
/// drawn from the given (per-photon) random stream.
pub trait PhotonTracer: Send + Sync {
    /// Advance the photon from its current position along its current direction and report the next event.
    ///
    /// # Errors
    ///
    /// This function returns an [`LxeError::Propagation`](crate::error::LxeError::Propagation) if the geometry
    /// engine fails.
    fn next_event(&self, photon: &PhotonRecord, rng: &mut StdRng) -> LxeResult<StepEvent>;
}
