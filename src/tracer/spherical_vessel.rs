//! Analytic tracer for a spherical vessel filled with a single bulk material
use super::{PhotonTracer, StepEvent};
use crate::{
    error::{LxeError, LxeResult},
    materials::Material,
    millimeter,
    photon::PhotonRecord,
    source::isotropic_direction,
};
use nalgebra::{Point3, Vector3};
use num::Zero;
use rand::{rngs::StdRng, Rng};
use uom::si::{
    angle::radian,
    f64::{Angle, Length},
    length::millimeter,
};

/// Distance (in mm) below which a wall intersection is treated as the current position.
const WALL_TOLERANCE: f64 = 1e-9;

/// Spherical vessel with a single wall surface, filled with one bulk material.
///
/// Bulk absorption and scattering distances are sampled from exponential distributions using the absorption and
/// scattering lengths of the bulk material. Scattering is isotropic. A photon located on the wall and pointing
/// outwards (i.e. transmitted through the wall) has left the geometry and yields [`StepEvent::NoHit`].
#[derive(Debug, Clone)]
pub struct SphericalVessel {
    center: Point3<Length>,
    radius: Length,
    surface: String,
    bulk: Material,
}
impl SphericalVessel {
    /// Creates a new [`SphericalVessel`] centered at the origin.
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is not positive and finite.
    pub fn new(radius: Length, surface: &str, bulk: Material) -> LxeResult<Self> {
        if radius.is_zero() || radius.is_sign_negative() || !radius.is_finite() {
            return Err(LxeError::Configuration(
                "vessel radius must be >0 and finite".into(),
            ));
        }
        Ok(Self {
            center: Point3::origin(),
            radius,
            surface: surface.to_owned(),
            bulk,
        })
    }
    /// Moves the center of this vessel. Builder style.
    #[must_use]
    pub const fn with_center(mut self, center: Point3<Length>) -> Self {
        self.center = center;
        self
    }
    /// Returns the radius of this [`SphericalVessel`].
    #[must_use]
    pub const fn radius(&self) -> Length {
        self.radius
    }
    /// Returns the name of the wall surface.
    #[must_use]
    pub fn surface(&self) -> &str {
        &self.surface
    }
    fn to_local(&self, position: Point3<Length>) -> Vector3<f64> {
        Vector3::new(
            (position.x - self.center.x).get::<millimeter>(),
            (position.y - self.center.y).get::<millimeter>(),
            (position.z - self.center.z).get::<millimeter>(),
        )
    }
    fn to_global(&self, local: &Vector3<f64>) -> Point3<Length> {
        Point3::new(
            self.center.x + millimeter!(local.x),
            self.center.y + millimeter!(local.y),
            self.center.z + millimeter!(local.z),
        )
    }
}
/// Sample an exponentially distributed free path (in mm) with the given mean.
fn sample_distance(mean_free_path: Length, rng: &mut StdRng) -> f64 {
    let u: f64 = rng.random();
    -mean_free_path.get::<millimeter>() * (1.0 - u).ln()
}
impl PhotonTracer for SphericalVessel {
    fn next_event(&self, photon: &PhotonRecord, rng: &mut StdRng) -> LxeResult<StepEvent> {
        let pos = self.to_local(photon.position());
        let dir = photon.direction();
        let radius = self.radius.get::<millimeter>();
        let b = pos.dot(&dir);
        let c = radius.mul_add(-radius, pos.norm_squared());
        let discriminant = b.mul_add(b, -c);
        if discriminant < 0.0 {
            return Ok(StepEvent::NoHit);
        }
        let to_wall = -b + discriminant.sqrt();
        if to_wall <= WALL_TOLERANCE {
            return Ok(StepEvent::NoHit);
        }
        let wavelength = photon.wavelength();
        let to_absorption = sample_distance(self.bulk.absorption_length(wavelength), rng);
        let to_scatter = sample_distance(self.bulk.scattering_length(wavelength), rng);
        if to_absorption < to_wall && to_absorption <= to_scatter {
            return Ok(StepEvent::BulkAbsorb {
                position: self.to_global(&(pos + dir * to_absorption)),
            });
        }
        if to_scatter < to_wall {
            return Ok(StepEvent::BulkScatter {
                position: self.to_global(&(pos + dir * to_scatter)),
                direction: isotropic_direction(rng),
            });
        }
        // project onto the wall to avoid drifting off the sphere after many reflections
        let hit = (pos + dir * to_wall).normalize() * radius;
        let normal = -hit.normalize();
        let cos_incidence = dir.dot(&normal).abs().min(1.0);
        Ok(StepEvent::BoundaryHit {
            surface: self.surface.clone(),
            incident_angle: Angle::new::<radian>(cos_incidence.acos()),
            wavelength,
            position: self.to_global(&hit),
            normal,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        materials::Material,
        nanometer,
        property_table::{PropertyTable, ABSORPTION_LENGTH, REFRACTIVE_INDEX, SCATTERING_LENGTH},
    };
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use nalgebra::vector;
    use rand::SeedableRng;
    use uom::si::angle::degree;

    fn bulk(absorption_length: f64, scattering_length: f64) -> Material {
        Material::from_table(
            &PropertyTable::new("lxe", vec![100.0, 1000.0])
                .with_column(REFRACTIVE_INDEX, vec![1.69, 1.69])
                .with_column(ABSORPTION_LENGTH, vec![absorption_length; 2])
                .with_column(SCATTERING_LENGTH, vec![scattering_length; 2]),
        )
        .unwrap()
    }
    fn photon(position: Point3<Length>, direction: Vector3<f64>) -> PhotonRecord {
        PhotonRecord::new(0, position, direction, nanometer!(175.0)).unwrap()
    }
    #[test]
    fn new() {
        assert!(SphericalVessel::new(millimeter!(0.0), "wall", bulk(1e12, 1e12)).is_err());
        assert!(SphericalVessel::new(millimeter!(-1.0), "wall", bulk(1e12, 1e12)).is_err());
        assert!(SphericalVessel::new(millimeter!(f64::NAN), "wall", bulk(1e12, 1e12)).is_err());
        let v = SphericalVessel::new(millimeter!(100.0), "wall", bulk(1e12, 1e12)).unwrap();
        assert_eq!(v.radius(), millimeter!(100.0));
        assert_eq!(v.surface(), "wall");
    }
    #[test]
    fn boundary_hit_from_center() {
        let v = SphericalVessel::new(millimeter!(100.0), "wall", bulk(1e12, 1e12)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let event = v
            .next_event(
                &photon(millimeter!(0.0, 0.0, 0.0), vector![0.0, 0.0, 1.0]),
                &mut rng,
            )
            .unwrap();
        let StepEvent::BoundaryHit {
            surface,
            incident_angle,
            position,
            normal,
            ..
        } = event
        else {
            panic!("expected a boundary hit");
        };
        assert_eq!(surface, "wall");
        assert_abs_diff_eq!(incident_angle.get::<degree>(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(position.z.get::<millimeter>(), 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(normal, vector![0.0, 0.0, -1.0], epsilon = 1e-12);
    }
    #[test]
    fn boundary_hit_oblique() {
        let v = SphericalVessel::new(millimeter!(100.0), "wall", bulk(1e12, 1e12))
            .unwrap()
            .with_center(millimeter!(0.0, 0.0, 50.0));
        let mut rng = StdRng::seed_from_u64(1);
        // chord at distance 50 mm from the center -> 30 degree angle of incidence
        let event = v
            .next_event(
                &photon(millimeter!(0.0, 50.0, 50.0), vector![1.0, 0.0, 0.0]),
                &mut rng,
            )
            .unwrap();
        assert_matches!(event, StepEvent::BoundaryHit { incident_angle, position, .. } => {
            assert_abs_diff_eq!(incident_angle.get::<degree>(), 30.0, epsilon = 1e-9);
            assert_abs_diff_eq!(position.x.get::<millimeter>(), 75.0_f64.sqrt() * 10.0, epsilon = 1e-9);
            assert_abs_diff_eq!(position.z.get::<millimeter>(), 50.0, epsilon = 1e-9);
        });
    }
    #[test]
    fn leaving_vessel() {
        let v = SphericalVessel::new(millimeter!(100.0), "wall", bulk(1e12, 1e12)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let on_wall = photon(millimeter!(0.0, 0.0, 100.0), vector![0.0, 0.0, 1.0]);
        assert_eq!(v.next_event(&on_wall, &mut rng).unwrap(), StepEvent::NoHit);
        let outside = photon(millimeter!(0.0, 0.0, 200.0), vector![1.0, 0.0, 0.0]);
        assert_eq!(v.next_event(&outside, &mut rng).unwrap(), StepEvent::NoHit);
    }
    #[test]
    fn bulk_absorption() {
        let v = SphericalVessel::new(millimeter!(1000.0), "wall", bulk(1e-3, 1e12)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let event = v
            .next_event(
                &photon(millimeter!(0.0, 0.0, 0.0), vector![0.0, 0.0, 1.0]),
                &mut rng,
            )
            .unwrap();
        assert_matches!(event, StepEvent::BulkAbsorb { position } => {
            assert!(position.z.get::<millimeter>() < 1.0);
        });
    }
    #[test]
    fn bulk_scatter() {
        let v = SphericalVessel::new(millimeter!(1000.0), "wall", bulk(1e12, 1e-3)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let event = v
            .next_event(
                &photon(millimeter!(0.0, 0.0, 0.0), vector![0.0, 0.0, 1.0]),
                &mut rng,
            )
            .unwrap();
        assert_matches!(event, StepEvent::BulkScatter { direction, .. } => {
            assert_abs_diff_eq!(direction.norm(), 1.0, epsilon = 1e-12);
        });
    }
}
