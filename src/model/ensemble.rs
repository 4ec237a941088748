//! Ensemble specification
//!
//! An ensemble is a population of neurons jointly representing a vector
//! value. The spec is pure configuration - the backend owns whatever neuron
//! state realizes it.

use serde::{Deserialize, Serialize};

use crate::error::{NefsimError, Result};

/// Population specification: size, dimensionality, representational radius
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EnsembleSpec {
    /// Display name (used in record headers and error messages)
    pub name: String,
    /// Number of neurons in the population
    pub neurons: usize,
    /// Dimensionality of the represented vector
    pub dimensions: usize,
    /// Representational radius (values beyond it saturate in a spiking backend)
    pub radius: f64,
}

impl EnsembleSpec {
    /// Spec with the default radius of 1.0
    pub fn new(name: impl Into<String>, neurons: usize, dimensions: usize) -> Self {
        Self {
            name: name.into(),
            neurons,
            dimensions,
            radius: 1.0,
        }
    }

    /// Override the representational radius
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.neurons == 0 {
            return Err(NefsimError::InvalidInput(format!(
                "ensemble '{}' must have at least one neuron",
                self.name
            )));
        }
        if self.dimensions == 0 {
            return Err(NefsimError::InvalidInput(format!(
                "ensemble '{}' must have at least one dimension",
                self.name
            )));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(NefsimError::InvalidInput(format!(
                "ensemble '{}' radius {} must be finite and positive",
                self.name, self.radius
            )));
        }
        Ok(())
    }
}
