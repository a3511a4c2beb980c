#![warn(missing_docs)]
//! lxeoptics specific error structures
use std::{error::Error, fmt::Display};

/// lxeoptics application specific Result type
pub type LxeResult<T> = std::result::Result<T, LxeError>;

/// Errors that can be returned by various lxeoptics functions.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LxeError {
    /// malformed or incomplete property tables, invalid surface or run parameters. Always raised while
    /// constructing a component, never while a photon is propagated.
    Configuration(String),
    /// a material or surface name could not be resolved.
    NotFound(String),
    /// a wavelength or angle outside the support of a table that must not be extrapolated.
    OutOfDomain(String),
    /// runtime errors occuring while propagating a photon
    Propagation(String),
    /// errors while exporting tally data
    Export(String),
    /// errors not falling in one of the categories above
    Other(String),
}

impl Display for LxeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(m) => {
                write!(f, "Configuration:{m}")
            }
            Self::NotFound(m) => {
                write!(f, "NotFound:{m}")
            }
            Self::OutOfDomain(m) => {
                write!(f, "OutOfDomain:{m}")
            }
            Self::Propagation(m) => {
                write!(f, "Propagation:{m}")
            }
            Self::Export(m) => {
                write!(f, "Export:{m}")
            }
            Self::Other(m) => write!(f, "lxeoptics Error:Other:{m}"),
        }
    }
}
impl Error for LxeError {}

impl std::convert::From<String> for LxeError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}
impl std::convert::From<csv::Error> for LxeError {
    fn from(e: csv::Error) -> Self {
        Self::Export(e.to_string())
    }
}
impl std::convert::From<serde_yaml::Error> for LxeError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Configuration(format!("parsing of yaml data failed: {e}"))
    }
}
