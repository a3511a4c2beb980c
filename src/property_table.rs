#![warn(missing_docs)]
//! Wavelength indexed property tables.
//!
//! A [`PropertyTable`] is the raw tabular input handed over by a loading collaborator: a named table with a
//! wavelength axis (in nanometers) and an arbitrary set of named numeric columns. Components pick the columns
//! they need with [`PropertyTable::curve`] and thereby validate the table against their fixed schema while being
//! constructed. A [`PropertyCurve`] is a single validated column which can be evaluated at arbitrary wavelengths.
use crate::error::{LxeError, LxeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::Range;
use uom::si::{f64::Length, length::nanometer};

/// Column name of the real refractive index.
pub const REFRACTIVE_INDEX: &str = "refractive_index";
/// Column name of the absorption length (in mm).
pub const ABSORPTION_LENGTH: &str = "absorption_length";
/// Column name of the (Rayleigh) scattering length (in mm).
pub const SCATTERING_LENGTH: &str = "scattering_length";
/// Column name of the real part of a complex refractive index.
pub const ETA: &str = "eta";
/// Column name of the imaginary part of a complex refractive index.
pub const KAPPA: &str = "kappa";
/// Column name of a transmission coefficient.
pub const TRANSMISSION: &str = "transmission";
/// Column name of a reflection coefficient.
pub const REFLECTION: &str = "reflection";

/// Wavelengths (in nm) closer than this value to a tabulated point are treated as exactly tabulated.
const WAVELENGTH_TOLERANCE: f64 = 1e-9;

/// Raw wavelength indexed table of numeric columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PropertyTable {
    name: String,
    /// wavelength axis in nm
    wavelengths: Vec<f64>,
    columns: BTreeMap<String, Vec<f64>>,
}
impl PropertyTable {
    /// Creates a new (column-less) [`PropertyTable`] with the given wavelength axis (in nm).
    #[must_use]
    pub fn new(name: &str, wavelengths_nm: Vec<f64>) -> Self {
        Self {
            name: name.to_owned(),
            wavelengths: wavelengths_nm,
            columns: BTreeMap::new(),
        }
    }
    /// Adds (or replaces) a column of this table. Builder style.
    #[must_use]
    pub fn with_column(mut self, column: &str, values: Vec<f64>) -> Self {
        self.columns.insert(column.to_owned(), values);
        self
    }
    /// Returns the name of this [`PropertyTable`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the wavelength axis (in nm) of this [`PropertyTable`].
    #[must_use]
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }
    /// Returns true if the table contains the given column.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }
    /// Returns an iterator over all column names (in lexical order).
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
    /// Extract a validated [`PropertyCurve`] of the given column.
    ///
    /// # Errors
    ///
    /// This function returns an [`LxeError::Configuration`] if
    ///   - the column does not exist
    ///   - the column length does not match the wavelength axis
    ///   - the wavelength axis is empty, not strictly ascending or not positive
    ///   - the column contains non-finite values
    pub fn curve(&self, column: &str) -> LxeResult<PropertyCurve> {
        let values = self.columns.get(column).ok_or_else(|| {
            LxeError::Configuration(format!(
                "property table '{}' is missing column '{column}'",
                self.name
            ))
        })?;
        if values.len() != self.wavelengths.len() {
            return Err(LxeError::Configuration(format!(
                "column '{column}' of property table '{}' has {} entries but the wavelength axis has {}",
                self.name,
                values.len(),
                self.wavelengths.len()
            )));
        }
        PropertyCurve::new(
            self.wavelengths
                .iter()
                .copied()
                .zip(values.iter().copied())
                .collect(),
        )
        .map_err(|e| LxeError::Configuration(format!("property table '{}': {e}", self.name)))
    }
}

/// A single property over wavelength.
///
/// The curve stores `(wavelength in nm, value)` pairs with a strictly ascending wavelength axis. Values between
/// tabulated points are linearly interpolated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyCurve {
    data: Vec<(f64, f64)>,
}
impl PropertyCurve {
    /// Creates a new [`PropertyCurve`] from `(wavelength in nm, value)` pairs.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the data is empty
    ///   - the wavelengths are not strictly ascending, not positive or not finite
    ///   - any value is not finite
    pub fn new(data: Vec<(f64, f64)>) -> LxeResult<Self> {
        if data.is_empty() {
            return Err(LxeError::Configuration("curve contains no data".into()));
        }
        if data.iter().any(|d| !d.0.is_finite() || d.0 <= 0.0) {
            return Err(LxeError::Configuration(
                "wavelengths must be positive and finite".into(),
            ));
        }
        if data.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(LxeError::Configuration(
                "wavelengths must be strictly ascending".into(),
            ));
        }
        if data.iter().any(|d| !d.1.is_finite()) {
            return Err(LxeError::Configuration("values must be finite".into()));
        }
        Ok(Self { data })
    }
    /// Returns the wavelength range covered by this [`PropertyCurve`].
    #[must_use]
    pub fn range(&self) -> Range<Length> {
        let first = self.data.first().map_or(0.0, |d| d.0);
        let last = self.data.last().map_or(0.0, |d| d.0);
        Length::new::<nanometer>(first)..Length::new::<nanometer>(last)
    }
    /// Returns the wavelength axis (in nm).
    #[must_use]
    pub fn wavelengths(&self) -> Vec<f64> {
        self.data.iter().map(|d| d.0).collect()
    }
    /// Get a 1D vector of all values.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().map(|d| d.1).collect()
    }
    /// Return the value at a given wavelength.
    ///
    /// This function returns the value for a given wavelength. The value will be linear interpolated if the
    /// wavelength does not correspond to a tabulated point. If the wavelength is outside the covered range `None`
    /// is returned.
    #[must_use]
    pub fn value(&self, wavelength: Length) -> Option<f64> {
        let wvl = wavelength.get::<nanometer>();
        let first = self.data.first()?;
        let last = self.data.last()?;
        if !wvl.is_finite()
            || wvl < first.0 - WAVELENGTH_TOLERANCE
            || wvl > last.0 + WAVELENGTH_TOLERANCE
        {
            return None;
        }
        let idx = self
            .data
            .iter()
            .position(|d| d.0 >= wvl - WAVELENGTH_TOLERANCE)?;
        // unit conversions may shift a tabulated wavelength by a few ulps
        if (self.data[idx].0 - wvl).abs() <= WAVELENGTH_TOLERANCE {
            return Some(self.data[idx].1);
        }
        let (left, right) = (self.data[idx - 1], self.data[idx]);
        Some(crate::utils::math_utils::lerp(
            left.0, left.1, right.0, right.1, wvl,
        ))
    }
    /// Return the value at a given wavelength, clamping to the edge values outside the covered range.
    #[must_use]
    pub fn value_clamped(&self, wavelength: Length) -> f64 {
        let wvl = wavelength.get::<nanometer>();
        let axis = self.wavelengths();
        let (lower, upper, ratio) = crate::utils::math_utils::clamped_bracket(&axis, wvl);
        self.data[lower].1.mul_add(1.0 - ratio, self.data[upper].1 * ratio)
    }
    /// Returns the smallest tabulated value.
    #[must_use]
    pub fn min_value(&self) -> f64 {
        self.data.iter().map(|d| d.1).fold(f64::INFINITY, f64::min)
    }
}
impl Display for PropertyCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for value in &self.data {
            writeln!(f, "{:7.2} nm -> {}", value.0, value.1)?;
        }
        Ok(())
    }
}
