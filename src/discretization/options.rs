//! Typed options for the local matrix builders.
//!
//! These are filled by whatever reads the run configuration; every field has
//! a default so partial documents deserialize.

use crate::discretization::basis::BasisKind;
use crate::verbose::{VerboseObject, Verbosity};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DgOptions {
    /// Polynomial order of the Taylor basis.
    pub order: usize,
    pub basis: BasisKind,
    pub verbosity: Verbosity,
}

impl Default for DgOptions {
    fn default() -> Self {
        Self {
            order: 1,
            basis: BasisKind::Normalized,
            verbosity: Verbosity::Low,
        }
    }
}

impl DgOptions {
    pub fn verbose_object(&self, name: &str) -> VerboseObject {
        VerboseObject::new(name, self.verbosity)
    }
}

/// Scale of the MFD stability term.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityMethod {
    /// `trace(Mc) / nfaces`
    #[default]
    Scalar,
    /// A user-given value.
    Fixed(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MfdOptions {
    pub stability: StabilityMethod,
    /// Multiplier applied to the stability scale.
    pub scaling: f64,
    pub verbosity: Verbosity,
}

impl Default for MfdOptions {
    fn default() -> Self {
        Self {
            stability: StabilityMethod::Scalar,
            scaling: 1.0,
            verbosity: Verbosity::Low,
        }
    }
}

impl MfdOptions {
    pub fn verbose_object(&self, name: &str) -> VerboseObject {
        VerboseObject::new(name, self.verbosity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_use_defaults() {
        let dg: DgOptions = serde_json::from_str(r#"{"order": 2}"#).unwrap();
        assert_eq!(dg.order, 2);
        assert_eq!(dg.basis, BasisKind::Normalized);

        let mfd: MfdOptions = serde_json::from_str(r#"{"stability": {"fixed": 2.5}}"#).unwrap();
        assert_eq!(mfd.stability, StabilityMethod::Fixed(2.5));
        assert_eq!(mfd.scaling, 1.0);
        let mfd: MfdOptions = serde_json::from_str(r#"{"stability": "scalar", "verbosity": "high"}"#).unwrap();
        assert_eq!(mfd.verbosity, Verbosity::High);
    }
}
