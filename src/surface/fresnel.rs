//! Interface between a dielectric and an absorbing medium (complex Fresnel equations)
use super::{SurfaceOptics, SurfaceResponse};
use crate::{
    error::{LxeError, LxeResult},
    materials::{ComplexIndex, ComplexIndexTable},
    utils::usize_to_f64,
};
use num::complex::Complex64;
use std::f64::consts::FRAC_PI_2;
use uom::si::{
    angle::radian,
    f64::{Angle, Length},
    length::nanometer,
};

/// Number of angle steps between normal and grazing incidence used for validating a surface.
const VALIDATION_ANGLE_STEPS: usize = 90;

/// Reflectance of unpolarized light at normal incidence from a real index `n1` onto a complex index `n2`.
///
/// `R = ((n1 - eta)^2 + kappa^2) / ((n1 + eta)^2 + kappa^2)`
#[must_use]
pub fn normal_incidence_reflectance(n1: f64, n2: ComplexIndex) -> f64 {
    let diff = n1 - n2.eta();
    let sum = n1 + n2.eta();
    let kappa_sq = n2.kappa() * n2.kappa();
    diff.mul_add(diff, kappa_sq) / sum.mul_add(sum, kappa_sq)
}

/// Reflectance of unpolarized light hitting an absorbing medium with complex index `n2` from a medium with real
/// index `n1` under the angle of incidence `theta` (in radians, measured from the surface normal).
///
/// The angle is folded into `[0, pi/2]`. Normal incidence is evaluated with the closed form
/// [`normal_incidence_reflectance`], grazing incidence (`theta >= pi/2`) reflects completely.
#[must_use]
pub fn fresnel_reflectance(n1: f64, n2: ComplexIndex, theta: f64) -> f64 {
    let theta = theta.abs();
    #[allow(clippy::float_cmp)]
    if theta == 0.0 {
        normal_incidence_reflectance(n1, n2)
    } else if theta >= FRAC_PI_2 {
        1.0
    } else {
        oblique_reflectance(n1, n2, theta)
    }
}

fn oblique_reflectance(n1: f64, n2: ComplexIndex, theta: f64) -> f64 {
    let n2 = n2.as_complex();
    let n1 = Complex64::new(n1, 0.0);
    let (sin_i, cos_i) = theta.sin_cos();
    // complex Snell's law: n1 sin(i) = n2 sin(t). n2 cos(t) = sqrt(n2^2 - (n1 sin(i))^2) is taken on the
    // principal branch (non-negative real part). For eta > 0 and kappa >= 0 the imaginary part is non-negative
    // as well (damped wave in the metal).
    let n2_sin_t = n1 * sin_i;
    let cos_t = (n2 * n2 - n2_sin_t * n2_sin_t).sqrt() / n2;
    // s-polarization
    let r_s = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
    // p-polarization
    let r_p = (n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t);
    // unpolarized light -> average power reflectance
    (r_s.norm_sqr() + r_p.norm_sqr()) / 2.0
}

/// Opaque metal surface described by a (wavelength dependent) complex refractive index.
///
/// Light is either specularly reflected with the Fresnel reflectance or absorbed. There is no transmission through
/// the metal.
#[derive(Debug, Clone, PartialEq)]
pub struct DielectricMetal {
    index: MetalIndex,
}
#[derive(Debug, Clone, PartialEq)]
enum MetalIndex {
    Constant(ComplexIndex),
    Table(ComplexIndexTable),
}
impl DielectricMetal {
    /// Creates a new [`DielectricMetal`] from a complex index table.
    #[must_use]
    pub const fn new(table: ComplexIndexTable) -> Self {
        Self {
            index: MetalIndex::Table(table),
        }
    }
    /// Creates a new [`DielectricMetal`] with a wavelength independent complex index.
    #[must_use]
    pub const fn constant(index: ComplexIndex) -> Self {
        Self {
            index: MetalIndex::Constant(index),
        }
    }
    /// Returns the complex index of the metal at the given wavelength.
    #[must_use]
    pub fn complex_index(&self, wavelength: Length) -> ComplexIndex {
        match &self.index {
            MetalIndex::Constant(index) => *index,
            MetalIndex::Table(table) => table.index(wavelength),
        }
    }
    /// Evaluate the reflectance over the full grid of tabulated wavelengths and incident angles.
    ///
    /// `n_outer` returns the real refractive index of the outer medium for a given wavelength.
    ///
    /// # Errors
    ///
    /// This function will return an error if any reflectance on the grid is not finite or outside `[0.0, 1.0]`.
    pub fn validate<F: Fn(Length) -> f64>(&self, n_outer: F) -> LxeResult<()> {
        let wavelengths = match &self.index {
            MetalIndex::Constant(_) => vec![Length::new::<nanometer>(175.0)],
            MetalIndex::Table(table) => table
                .wavelengths()
                .into_iter()
                .map(Length::new::<nanometer>)
                .collect(),
        };
        for wavelength in wavelengths {
            let n1 = n_outer(wavelength);
            let n2 = self.complex_index(wavelength);
            for step in 0..VALIDATION_ANGLE_STEPS {
                let theta = usize_to_f64(step) / usize_to_f64(VALIDATION_ANGLE_STEPS) * FRAC_PI_2;
                let r = fresnel_reflectance(n1, n2, theta);
                if !r.is_finite() || !(0.0..=1.0).contains(&r) {
                    return Err(LxeError::Configuration(format!(
                        "Fresnel reflectance {r} at {:.1} nm and {theta:.4} rad is not physical",
                        wavelength.get::<nanometer>()
                    )));
                }
            }
        }
        Ok(())
    }
}
impl SurfaceOptics for DielectricMetal {
    fn response(
        &self,
        wavelength: Length,
        incident_angle: Angle,
        n_outer: f64,
    ) -> LxeResult<SurfaceResponse> {
        let theta = incident_angle.get::<radian>();
        if !theta.is_finite() {
            return Err(LxeError::OutOfDomain(
                "angle of incidence must be finite".into(),
            ));
        }
        let r = fresnel_reflectance(n_outer, self.complex_index(wavelength), theta).clamp(0.0, 1.0);
        SurfaceResponse::new(r, 0.0, 0.0, 1.0 - r)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        degree, nanometer,
        property_table::{PropertyTable, ETA, KAPPA},
    };
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn index(eta: f64, kappa: f64) -> ComplexIndex {
        ComplexIndex::new(eta, kappa).unwrap()
    }
    #[test]
    fn normal_incidence_dielectric() {
        assert_abs_diff_eq!(
            normal_incidence_reflectance(1.0, index(1.5, 0.0)),
            0.04,
            epsilon = 1e-15
        );
        assert_eq!(normal_incidence_reflectance(1.5, index(1.5, 0.0)), 0.0);
    }
    #[test]
    fn normal_incidence_matches_closed_form() {
        for (n1, eta, kappa) in [
            (1.0, 1.5, 0.0),
            (1.69, 1.5, 0.0),
            (1.0, 0.2, 3.5),
            (1.69, 1.1, 1.3),
            (1.33, 0.05, 0.9),
        ] {
            let closed_form = ((n1 - eta) * (n1 - eta) + kappa * kappa)
                / ((n1 + eta) * (n1 + eta) + kappa * kappa);
            assert_relative_eq!(
                fresnel_reflectance(n1, index(eta, kappa), 0.0),
                closed_form,
                max_relative = 1e-9
            );
            // the oblique formulas converge to the same value
            assert_relative_eq!(
                oblique_reflectance(n1, index(eta, kappa), 1e-8),
                closed_form,
                max_relative = 1e-9
            );
        }
    }
    #[test]
    fn oblique_dielectric() {
        assert_abs_diff_eq!(
            fresnel_reflectance(1.0, index(1.5, 0.0), std::f64::consts::FRAC_PI_4),
            0.05023991101223595,
            epsilon = 1e-12
        );
    }
    #[test]
    fn same_index_no_reflection() {
        assert_abs_diff_eq!(
            fresnel_reflectance(1.5, index(1.5, 0.0), 0.6),
            0.0,
            epsilon = 1e-15
        );
    }
    #[test]
    fn grazing_incidence() {
        assert_eq!(fresnel_reflectance(1.0, index(1.5, 0.1), FRAC_PI_2), 1.0);
        assert!(fresnel_reflectance(1.0, index(1.5, 0.1), FRAC_PI_2 - 1e-6) > 0.99);
    }
    #[test]
    fn oblique_continuous_to_normal_incidence() {
        for (eta, kappa) in [(0.4, 2.2), (1.5, 0.0), (0.9, 1.3), (2.0, 0.5)] {
            let n2 = index(eta, kappa);
            let r = oblique_reflectance(1.69, n2, 1e-4);
            assert!((0.0..=1.0).contains(&r));
            assert_abs_diff_eq!(r, normal_incidence_reflectance(1.69, n2), epsilon = 1e-6);
        }
    }
    #[test]
    fn absorbing_metal_bounds() {
        let metal = DielectricMetal::constant(index(0.4, 2.2));
        for step in 0..900 {
            let theta = degree!(f64::from(step) * 0.1);
            let r = metal.response(nanometer!(175.0), theta, 1.69).unwrap();
            assert!((0.0..=1.0).contains(&r.p_specular()));
            assert_abs_diff_eq!(r.p_specular() + r.p_absorb(), 1.0, epsilon = 1e-12);
            assert_eq!(r.p_transmit(), 0.0);
            assert_eq!(r.p_diffuse(), 0.0);
        }
    }
    #[test]
    fn response_normal_incidence() {
        let metal = DielectricMetal::constant(index(1.5, 0.0));
        let r = metal.response(nanometer!(175.0), degree!(0.0), 1.0).unwrap();
        assert_abs_diff_eq!(r.p_specular(), 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(r.p_absorb(), 0.96, epsilon = 1e-12);
        assert!(metal
            .response(nanometer!(175.0), degree!(f64::NAN), 1.0)
            .is_err());
    }
    #[test]
    fn table_index() {
        let t = PropertyTable::new("aluminium", vec![150.0, 200.0])
            .with_column(ETA, vec![0.1, 0.3])
            .with_column(KAPPA, vec![1.5, 2.5]);
        let metal = DielectricMetal::new(ComplexIndexTable::from_table(&t).unwrap());
        assert_abs_diff_eq!(metal.complex_index(nanometer!(175.0)).eta(), 0.2, epsilon = 1e-12);
        assert!(metal.validate(|_| 1.69).is_ok());
        let r150 = metal.response(nanometer!(150.0), degree!(30.0), 1.69).unwrap();
        let r200 = metal.response(nanometer!(200.0), degree!(30.0), 1.69).unwrap();
        assert!(r150.p_specular() != r200.p_specular());
    }
    #[test]
    fn validate_non_physical_outer_index() {
        let metal = DielectricMetal::constant(index(1.5, 0.0));
        assert!(matches!(
            metal.validate(|_| f64::NAN),
            Err(LxeError::Configuration(_))
        ));
    }
}
