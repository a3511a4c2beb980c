//! Detector face with an empirically calibrated reflectance table
use super::{SurfaceOptics, SurfaceResponse};
use crate::{
    error::{LxeError, LxeResult},
    property_table::PropertyTable,
    utils::math_utils::clamped_bracket,
};
use itertools::Itertools;
use log::debug;
use uom::si::{
    angle::degree,
    f64::{Angle, Length},
    length::nanometer,
};

/// Detector face (e.g. a photosensor window) whose reflectance was calibrated offline as a function of the angle
/// of incidence and the wavelength.
///
/// The reflectance is bilinearly interpolated between the two nearest angle buckets and the two nearest wavelength
/// buckets. Outside the table the nearest edge value is used (no extrapolation, no error). A constant diffuse
/// fraction splits the reflectance into a specular and a diffuse part. Everything not reflected is absorbed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalDetector {
    /// angle buckets in degrees
    angles: Vec<f64>,
    /// wavelength buckets in nm
    wavelengths: Vec<f64>,
    /// reflectance\[angle index\]\[wavelength index\]
    reflectance: Vec<Vec<f64>>,
    diffuse_fraction: f64,
}
impl EmpiricalDetector {
    /// Creates a new [`EmpiricalDetector`].
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::Configuration`] if
    ///   - an axis is empty, not finite or not strictly ascending
    ///   - the reflectance grid does not match the dimensions of the axes
    ///   - a reflectance value or the diffuse fraction is outside `[0.0, 1.0]`
    pub fn new(
        angles_deg: Vec<f64>,
        wavelengths_nm: Vec<f64>,
        reflectance: Vec<Vec<f64>>,
        diffuse_fraction: f64,
    ) -> LxeResult<Self> {
        for (axis, name) in [(&angles_deg, "angle"), (&wavelengths_nm, "wavelength")] {
            if axis.is_empty() || axis.iter().any(|v| !v.is_finite()) {
                return Err(LxeError::Configuration(format!(
                    "{name} axis of calibration table must not be empty and finite"
                )));
            }
            if axis.windows(2).any(|w| w[1] <= w[0]) {
                return Err(LxeError::Configuration(format!(
                    "{name} axis of calibration table must be strictly ascending"
                )));
            }
        }
        if reflectance.len() != angles_deg.len()
            || reflectance.iter().any(|row| row.len() != wavelengths_nm.len())
        {
            return Err(LxeError::Configuration(
                "calibration table dimensions do not match its axes".into(),
            ));
        }
        if reflectance
            .iter()
            .flatten()
            .any(|r| !(0.0..=1.0).contains(r))
        {
            return Err(LxeError::Configuration(
                "calibrated reflectance must be within [0.0, 1.0]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&diffuse_fraction) {
            return Err(LxeError::Configuration(
                "diffuse fraction must be within [0.0, 1.0]".into(),
            ));
        }
        Ok(Self {
            angles: angles_deg,
            wavelengths: wavelengths_nm,
            reflectance,
            diffuse_fraction,
        })
    }
    /// Creates a new [`EmpiricalDetector`] from a [`PropertyTable`].
    ///
    /// Each column of the table represents one angle bucket. The column name is the angle of incidence in degrees
    /// (e.g. `"0"`, `"22.5"`, `"45"`), the values are the reflectance over the wavelength axis of the table.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::Configuration`] if a column name is not a number, the table has no
    /// columns or the resulting grid is invalid (see [`EmpiricalDetector::new`]).
    pub fn from_table(table: &PropertyTable, diffuse_fraction: f64) -> LxeResult<Self> {
        let mut buckets = Vec::new();
        for column in table.column_names() {
            let angle = column.trim().parse::<f64>().map_err(|_| {
                LxeError::Configuration(format!(
                    "column '{column}' of calibration table '{}' is not an angle in degrees",
                    table.name()
                ))
            })?;
            buckets.push((angle, table.curve(column)?.values()));
        }
        if buckets.is_empty() {
            return Err(LxeError::Configuration(format!(
                "calibration table '{}' contains no angle columns",
                table.name()
            )));
        }
        let (angles, reflectance): (Vec<f64>, Vec<Vec<f64>>) = buckets
            .into_iter()
            .sorted_by(|a, b| a.0.total_cmp(&b.0))
            .unzip();
        debug!(
            "calibration table '{}' with {} angle and {} wavelength buckets",
            table.name(),
            angles.len(),
            table.wavelengths().len()
        );
        Self::new(
            angles,
            table.wavelengths().to_vec(),
            reflectance,
            diffuse_fraction,
        )
    }
    /// Returns the diffuse fraction of the reflectance.
    #[must_use]
    pub const fn diffuse_fraction(&self) -> f64 {
        self.diffuse_fraction
    }
    /// Returns the bilinearly interpolated reflectance. Values outside the table are clamped to the edges.
    #[must_use]
    pub fn reflectance(&self, wavelength: Length, incident_angle: Angle) -> f64 {
        let (a0, a1, ta) = clamped_bracket(&self.angles, incident_angle.get::<degree>().abs());
        let (w0, w1, tw) = clamped_bracket(&self.wavelengths, wavelength.get::<nanometer>());
        let lower = self.reflectance[a0][w0].mul_add(1.0 - tw, self.reflectance[a0][w1] * tw);
        let upper = self.reflectance[a1][w0].mul_add(1.0 - tw, self.reflectance[a1][w1] * tw);
        lower.mul_add(1.0 - ta, upper * ta)
    }
}
impl SurfaceOptics for EmpiricalDetector {
    fn response(
        &self,
        wavelength: Length,
        incident_angle: Angle,
        _n_outer: f64,
    ) -> LxeResult<SurfaceResponse> {
        if !incident_angle.is_finite() || !wavelength.is_finite() {
            return Err(LxeError::OutOfDomain(
                "wavelength and angle of incidence must be finite".into(),
            ));
        }
        SurfaceResponse::from_reflectance(
            self.reflectance(wavelength, incident_angle),
            self.diffuse_fraction,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{degree, nanometer};
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    fn prep() -> EmpiricalDetector {
        EmpiricalDetector::new(
            vec![0.0, 30.0, 60.0],
            vec![170.0, 180.0],
            vec![vec![0.1, 0.2], vec![0.2, 0.4], vec![0.6, 0.8]],
            0.0,
        )
        .unwrap()
    }
    #[test]
    fn new_wrong() {
        assert!(EmpiricalDetector::new(vec![], vec![170.0], vec![], 0.0).is_err());
        assert!(
            EmpiricalDetector::new(vec![30.0, 0.0], vec![170.0], vec![vec![0.1], vec![0.1]], 0.0)
                .is_err()
        );
        assert!(EmpiricalDetector::new(vec![0.0], vec![170.0], vec![vec![0.1, 0.2]], 0.0).is_err());
        assert!(EmpiricalDetector::new(vec![0.0], vec![170.0], vec![vec![1.2]], 0.0).is_err());
        assert!(EmpiricalDetector::new(vec![0.0], vec![170.0], vec![vec![0.2]], 1.5).is_err());
        assert!(
            EmpiricalDetector::new(vec![f64::NAN], vec![170.0], vec![vec![0.2]], 0.5).is_err()
        );
    }
    #[test]
    fn grid_points() {
        let d = prep();
        assert_abs_diff_eq!(d.reflectance(nanometer!(170.0), degree!(0.0)), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(d.reflectance(nanometer!(180.0), degree!(30.0)), 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(d.reflectance(nanometer!(180.0), degree!(60.0)), 0.8, epsilon = 1e-12);
    }
    #[test]
    fn bilinear() {
        let d = prep();
        assert_abs_diff_eq!(d.reflectance(nanometer!(175.0), degree!(15.0)), 0.225, epsilon = 1e-12);
        assert_abs_diff_eq!(d.reflectance(nanometer!(175.0), degree!(45.0)), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(d.reflectance(nanometer!(170.0), degree!(45.0)), 0.4, epsilon = 1e-12);
    }
    #[test]
    fn clamped_outside_table() {
        let d = prep();
        assert_abs_diff_eq!(d.reflectance(nanometer!(150.0), degree!(0.0)), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(d.reflectance(nanometer!(200.0), degree!(85.0)), 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(d.reflectance(nanometer!(200.0), degree!(15.0)), 0.3, epsilon = 1e-12);
        assert!(d.response(nanometer!(500.0), degree!(89.0), 1.0).is_ok());
    }
    #[test]
    fn response_split() {
        let d = EmpiricalDetector::new(vec![0.0], vec![170.0], vec![vec![0.4]], 0.5).unwrap();
        let r = d.response(nanometer!(170.0), degree!(10.0), 1.69).unwrap();
        assert_abs_diff_eq!(r.p_specular(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(r.p_diffuse(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(r.p_absorb(), 0.6, epsilon = 1e-12);
        assert_eq!(r.p_transmit(), 0.0);
        assert_eq!(d.diffuse_fraction(), 0.5);
        assert_matches!(
            d.response(nanometer!(f64::NAN), degree!(10.0), 1.69),
            Err(LxeError::OutOfDomain(_))
        );
    }
    #[test]
    fn from_table() {
        let table = PropertyTable::new("sipm", vec![170.0, 180.0])
            .with_column("60", vec![0.6, 0.8])
            .with_column("0", vec![0.1, 0.2])
            .with_column("30", vec![0.2, 0.4]);
        let d = EmpiricalDetector::from_table(&table, 0.0).unwrap();
        assert_eq!(d, prep());
        let table = table.with_column("reflectance", vec![0.1, 0.1]);
        assert_matches!(
            EmpiricalDetector::from_table(&table, 0.0),
            Err(LxeError::Configuration(_))
        );
        let table = PropertyTable::new("sipm", vec![170.0]);
        assert_matches!(
            EmpiricalDetector::from_table(&table, 0.0),
            Err(LxeError::Configuration(_))
        );
    }
}
