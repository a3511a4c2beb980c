#![warn(missing_docs)]
//! Bulk materials and complex refractive indices.
//!
//! Materials are built once from [`PropertyTable`]s and then shared read-only through a [`MaterialStore`].
//! Surfaces only refer to materials by name.
use crate::{
    error::{LxeError, LxeResult},
    property_table::{
        PropertyCurve, PropertyTable, ABSORPTION_LENGTH, ETA, KAPPA, REFRACTIVE_INDEX,
        SCATTERING_LENGTH,
    },
};
use log::debug;
use num::complex::Complex64;
use std::{collections::HashMap, fmt::Display};
use uom::si::{
    f64::Length,
    length::{millimeter, nanometer},
};

/// A bulk optical material with wavelength dependent properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    refractive_index: PropertyCurve,
    absorption_length: PropertyCurve,
    scattering_length: PropertyCurve,
}
impl Material {
    /// Creates a new [`Material`] from a [`PropertyTable`].
    ///
    /// The table must contain the columns `refractive_index`, `absorption_length` (mm) and `scattering_length` (mm).
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::Configuration`] if
    ///   - a column is missing or malformed
    ///   - a refractive index is < 1.0
    ///   - an absorption or scattering length is <= 0.0
    pub fn from_table(table: &PropertyTable) -> LxeResult<Self> {
        let refractive_index = table.curve(REFRACTIVE_INDEX)?;
        let absorption_length = table.curve(ABSORPTION_LENGTH)?;
        let scattering_length = table.curve(SCATTERING_LENGTH)?;
        if refractive_index.min_value() < 1.0 {
            return Err(LxeError::Configuration(format!(
                "refractive index of material '{}' must be >=1.0",
                table.name()
            )));
        }
        if absorption_length.min_value() <= 0.0 || scattering_length.min_value() <= 0.0 {
            return Err(LxeError::Configuration(format!(
                "absorption and scattering lengths of material '{}' must be >0.0",
                table.name()
            )));
        }
        Ok(Self {
            name: table.name().to_owned(),
            refractive_index,
            absorption_length,
            scattering_length,
        })
    }
    /// Returns the name of this [`Material`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the refractive index of this [`Material`] at the given wavelength.
    ///
    /// The value is clamped to the tabulated edge values outside the table.
    #[must_use]
    pub fn refractive_index(&self, wavelength: Length) -> f64 {
        self.refractive_index.value_clamped(wavelength)
    }
    /// Returns the absorption length of this [`Material`] at the given wavelength.
    #[must_use]
    pub fn absorption_length(&self, wavelength: Length) -> Length {
        Length::new::<millimeter>(self.absorption_length.value_clamped(wavelength))
    }
    /// Returns the scattering length of this [`Material`] at the given wavelength.
    #[must_use]
    pub fn scattering_length(&self, wavelength: Length) -> Length {
        Length::new::<millimeter>(self.scattering_length.value_clamped(wavelength))
    }
}
impl Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let range = self.refractive_index.range();
        write!(
            f,
            "{} ({:.1} nm - {:.1} nm)",
            self.name,
            range.start.get::<nanometer>(),
            range.end.get::<nanometer>()
        )
    }
}

/// Complex refractive index `eta + i kappa` of an absorbing (metal) medium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexIndex {
    eta: f64,
    kappa: f64,
}
impl ComplexIndex {
    /// Creates a new [`ComplexIndex`].
    ///
    /// # Errors
    ///
    /// This function will return an error if `eta` is not positive and finite or `kappa` is negative or not finite.
    pub fn new(eta: f64, kappa: f64) -> LxeResult<Self> {
        if !eta.is_finite() || eta <= 0.0 {
            return Err(LxeError::Configuration(
                "real part of complex index must be >0.0 and finite".into(),
            ));
        }
        if !kappa.is_finite() || kappa.is_sign_negative() {
            return Err(LxeError::Configuration(
                "imaginary part of complex index must be >=0.0 and finite".into(),
            ));
        }
        Ok(Self { eta, kappa })
    }
    /// Returns the real part.
    #[must_use]
    pub const fn eta(&self) -> f64 {
        self.eta
    }
    /// Returns the imaginary (extinction) part.
    #[must_use]
    pub const fn kappa(&self) -> f64 {
        self.kappa
    }
    /// Returns this index as complex number.
    #[must_use]
    pub const fn as_complex(&self) -> Complex64 {
        Complex64::new(self.eta, self.kappa)
    }
}

/// Wavelength indexed table of [`ComplexIndex`] values.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexIndexTable {
    name: String,
    eta: PropertyCurve,
    kappa: PropertyCurve,
}
impl ComplexIndexTable {
    /// Creates a new [`ComplexIndexTable`] from a [`PropertyTable`] containing the columns `eta` and `kappa`.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::Configuration`] if a column is missing or malformed, any `eta` is
    /// not positive or any `kappa` is negative.
    pub fn from_table(table: &PropertyTable) -> LxeResult<Self> {
        let eta = table.curve(ETA)?;
        let kappa = table.curve(KAPPA)?;
        for (e, k) in eta.values().into_iter().zip(kappa.values()) {
            ComplexIndex::new(e, k).map_err(|err| {
                LxeError::Configuration(format!("complex index table '{}': {err}", table.name()))
            })?;
        }
        Ok(Self {
            name: table.name().to_owned(),
            eta,
            kappa,
        })
    }
    /// Returns the name of this [`ComplexIndexTable`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the tabulated wavelengths (in nm).
    #[must_use]
    pub fn wavelengths(&self) -> Vec<f64> {
        self.eta.wavelengths()
    }
    /// Returns the (interpolated) complex index at the given wavelength.
    ///
    /// Values outside the table are clamped to the edge values.
    #[must_use]
    pub fn index(&self, wavelength: Length) -> ComplexIndex {
        // interpolation between valid entries keeps eta > 0 and kappa >= 0
        ComplexIndex {
            eta: self.eta.value_clamped(wavelength),
            kappa: self.kappa.value_clamped(wavelength).max(0.0),
        }
    }
}

/// Read-only store of all [`Material`]s of a run, keyed by name.
#[derive(Debug, Default, Clone)]
pub struct MaterialStore {
    materials: HashMap<String, Material>,
}
impl MaterialStore {
    /// Creates a new [`MaterialStore`] from a set of property tables.
    ///
    /// # Errors
    ///
    /// This function will return an error if a table is malformed or a material name is used twice.
    pub fn from_tables(tables: &[PropertyTable]) -> LxeResult<Self> {
        let mut store = Self::default();
        for table in tables {
            store.insert(Material::from_table(table)?)?;
        }
        Ok(store)
    }
    /// Add a [`Material`] to the store.
    ///
    /// # Errors
    ///
    /// This function will return an error if a material with the same name already exists.
    pub fn insert(&mut self, material: Material) -> LxeResult<()> {
        if self.materials.contains_key(material.name()) {
            return Err(LxeError::Configuration(format!(
                "material '{}' defined twice",
                material.name()
            )));
        }
        debug!("adding material {material}");
        self.materials.insert(material.name().to_owned(), material);
        Ok(())
    }
    /// Get a [`Material`] by name.
    ///
    /// # Errors
    ///
    /// This function will return an [`LxeError::NotFound`] if the material does not exist.
    pub fn get(&self, name: &str) -> LxeResult<&Material> {
        self.materials
            .get(name)
            .ok_or_else(|| LxeError::NotFound(format!("material '{name}' not found")))
    }
    /// Returns the number of materials in this store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }
    /// Returns true if the store does not contain any material.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
