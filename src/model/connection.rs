//! Connections and probes
//!
//! A connection is a static record: source, target subspace, transform, and
//! an optional synaptic low-pass time constant. Immutable once added to a
//! network. The transform variants are the facade for everything a
//! connection can do to a signal - linear maps and arbitrary functions of
//! the source's decoded value (how feedback like `x0*x1 + x0` is declared).

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::network::{EnsembleId, NodeId};
use crate::error::{NefsimError, Result};

/// Where a connection reads its signal from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// A stimulus node's output
    Node(NodeId),
    /// An ensemble's decoded output (a self-referential source declares
    /// feedback)
    Ensemble(EnsembleId),
}

impl From<NodeId> for Source {
    fn from(id: NodeId) -> Self {
        Source::Node(id)
    }
}

impl From<EnsembleId> for Source {
    fn from(id: EnsembleId) -> Self {
        Source::Ensemble(id)
    }
}

/// What a connection does to its source signal
#[derive(Clone)]
pub enum Transform {
    /// Pass the source through unchanged (source and target dims must match)
    Identity,
    /// Linear map, row-major: `rows x cols` = target-subspace-dim x source-dim
    Matrix(Vec<Vec<f64>>),
    /// Arbitrary function of the source's decoded value. The output
    /// dimensionality is declared so shapes stay checkable at build time;
    /// the function itself is only exercised during a run.
    Function {
        out_dim: usize,
        f: Arc<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>,
    },
}

impl Transform {
    /// Linear matrix transform. Fails if the matrix is empty or ragged.
    pub fn matrix(rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(NefsimError::InvalidInput(
                "transform matrix must be non-empty".to_string(),
            ));
        }
        let cols = rows[0].len();
        for row in &rows[1..] {
            if row.len() != cols {
                return Err(NefsimError::ShapeMismatch {
                    expected: vec![cols],
                    actual: vec![row.len()],
                });
            }
        }
        Ok(Transform::Matrix(rows))
    }

    /// 1x1 scaling transform
    pub fn scaling(k: f64) -> Self {
        Transform::Matrix(vec![vec![k]])
    }

    /// Function transform producing `out_dim` values per evaluation
    pub fn function<F>(out_dim: usize, f: F) -> Result<Self>
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        if out_dim == 0 {
            return Err(NefsimError::InvalidInput(
                "function transform must have at least one output".to_string(),
            ));
        }
        Ok(Transform::Function {
            out_dim,
            f: Arc::new(f),
        })
    }

    /// Check that this transform maps `source_dim` values onto `target_dim`
    pub(crate) fn check_dims(&self, source_dim: usize, target_dim: usize) -> Result<()> {
        match self {
            Transform::Identity => {
                if source_dim != target_dim {
                    return Err(NefsimError::ShapeMismatch {
                        expected: vec![target_dim],
                        actual: vec![source_dim],
                    });
                }
            }
            Transform::Matrix(rows) => {
                let cols = rows.first().map_or(0, |r| r.len());
                if rows.len() != target_dim || cols != source_dim {
                    return Err(NefsimError::ShapeMismatch {
                        expected: vec![target_dim, source_dim],
                        actual: vec![rows.len(), cols],
                    });
                }
            }
            Transform::Function { out_dim, .. } => {
                if *out_dim != target_dim {
                    return Err(NefsimError::ShapeMismatch {
                        expected: vec![target_dim],
                        actual: vec![*out_dim],
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply the transform to a source value.
    ///
    /// Matrix shape violations surface as `ShapeMismatch`; a function that
    /// returns the wrong number of values surfaces as `Simulation`, since
    /// that can only be observed at run time.
    pub fn apply(&self, input: &[f64]) -> Result<Vec<f64>> {
        match self {
            Transform::Identity => Ok(input.to_vec()),
            Transform::Matrix(rows) => {
                let cols = rows.first().map_or(0, |r| r.len());
                if input.len() != cols {
                    return Err(NefsimError::ShapeMismatch {
                        expected: vec![cols],
                        actual: vec![input.len()],
                    });
                }
                Ok(rows
                    .iter()
                    .map(|row| row.iter().zip(input).map(|(a, b)| a * b).sum())
                    .collect())
            }
            Transform::Function { out_dim, f } => {
                let out = f(input);
                if out.len() != *out_dim {
                    return Err(NefsimError::Simulation(format!(
                        "function transform produced {} values, declared {}",
                        out.len(),
                        out_dim
                    )));
                }
                Ok(out)
            }
        }
    }
}

// Function closures have no useful Debug; show the declared shape instead.
impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity => write!(f, "Identity"),
            Transform::Matrix(rows) => f.debug_tuple("Matrix").field(rows).finish(),
            Transform::Function { out_dim, .. } => {
                f.debug_struct("Function").field("out_dim", out_dim).finish()
            }
        }
    }
}

/// Point-to-point signal connection, immutable after model construction
#[derive(Clone, Debug)]
pub struct Connection {
    /// Signal source
    pub source: Source,
    /// Target ensemble
    pub target: EnsembleId,
    /// Target input subspace (dimension range within the target)
    pub subspace: Range<usize>,
    /// Applied to the source value before filtering
    pub transform: Transform,
    /// Synaptic low-pass time constant in seconds; `None` passes through
    /// unfiltered
    pub synapse: Option<f64>,
}

/// Probe declaration: record an ensemble's decoded output over the run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbeSpec {
    /// Probed ensemble
    pub target: EnsembleId,
    /// Smoothing time constant applied to the recorded signal
    pub synapse: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_construction() {
        assert!(Transform::matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).is_ok());
        assert!(Transform::matrix(vec![]).is_err());
        assert!(Transform::matrix(vec![vec![]]).is_err());
        // Ragged rows
        assert!(matches!(
            Transform::matrix(vec![vec![1.0, 2.0], vec![3.0]]),
            Err(NefsimError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_matrix_apply() {
        let t = Transform::matrix(vec![vec![1.0, 0.0], vec![0.0, 2.0]]).unwrap();
        assert_eq!(t.apply(&[3.0, 4.0]).unwrap(), vec![3.0, 8.0]);

        let t = Transform::scaling(0.1);
        assert_eq!(t.apply(&[5.0]).unwrap(), vec![0.5]);

        assert!(t.apply(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_identity_apply() {
        let t = Transform::Identity;
        assert_eq!(t.apply(&[1.0, -2.0]).unwrap(), vec![1.0, -2.0]);
        assert!(t.check_dims(2, 2).is_ok());
        assert!(t.check_dims(2, 1).is_err());
    }

    #[test]
    fn test_function_apply() {
        // The multiplicative feedback from the integrator tutorial
        let t = Transform::function(1, |x| vec![x[0] * x[1] + x[0]]).unwrap();
        assert_eq!(t.apply(&[2.0, 0.5]).unwrap(), vec![3.0]);
        assert!(t.check_dims(2, 1).is_ok());
        assert!(t.check_dims(2, 2).is_err());

        // Declared one output, produces two: run-time failure
        let bad = Transform::function(1, |x| x.to_vec()).unwrap();
        assert!(matches!(
            bad.apply(&[1.0, 2.0]),
            Err(NefsimError::Simulation(_))
        ));
    }

    #[test]
    fn test_check_dims_matrix() {
        let t = Transform::matrix(vec![vec![0.1, 0.0]]).unwrap();
        assert!(t.check_dims(2, 1).is_ok());
        assert!(t.check_dims(1, 1).is_err());
        assert!(t.check_dims(2, 2).is_err());
    }
}
