//! Piecewise stimuli - pure time-indexed signal sources
//!
//! A `Piecewise` is a right-continuous step function over simulation time:
//! an ordered list of (time, value) breakpoints where `sample(t)` returns
//! the value of the largest breakpoint time <= t, and a configurable default
//! (zero by default) before the first breakpoint. No interpolation.
//!
//! All validation happens at construction so a malformed breakpoint list
//! fails before any simulation work starts. Sampling is a stateless binary
//! search and is safe to call concurrently.

use serde::{Deserialize, Serialize};

use crate::error::{NefsimError, Result};

/// Pure time-indexed signal source.
///
/// The seam between signal generators and the model layer: a node wraps
/// anything implementing this. Implementations must be pure - `sample(t)`
/// depends on `t` alone and has no side effects.
pub trait Stimulus: Send + Sync {
    /// Output dimensionality (fixed for the lifetime of the stimulus)
    fn dim(&self) -> usize;

    /// Evaluate the signal at time `t` (seconds)
    fn sample(&self, t: f64) -> Vec<f64>;
}

/// Right-continuous step function defined by (time, value) breakpoints
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Piecewise {
    /// Breakpoint times, strictly increasing, all >= 0
    times: Vec<f64>,
    /// Breakpoint values, one per time, all the same length
    values: Vec<Vec<f64>>,
    /// Value returned for t before the first breakpoint
    default: Vec<f64>,
}

impl Piecewise {
    /// Build a vector-valued step function from (time, value) breakpoints.
    ///
    /// Fails with `InvalidInput` if the list is empty, any time is negative
    /// or non-finite, times are not strictly increasing, or value shapes
    /// differ across breakpoints. The pre-first-breakpoint default is the
    /// zero vector; override it with [`with_default`](Self::with_default).
    pub fn new(breakpoints: Vec<(f64, Vec<f64>)>) -> Result<Self> {
        if breakpoints.is_empty() {
            return Err(NefsimError::InvalidInput(
                "piecewise signal needs at least one breakpoint".to_string(),
            ));
        }

        let dim = breakpoints[0].1.len();
        if dim == 0 {
            return Err(NefsimError::InvalidInput(
                "breakpoint values must have at least one entry".to_string(),
            ));
        }

        let mut times = Vec::with_capacity(breakpoints.len());
        let mut values = Vec::with_capacity(breakpoints.len());

        for (t, v) in breakpoints {
            if !t.is_finite() || t < 0.0 {
                return Err(NefsimError::InvalidInput(format!(
                    "breakpoint time {} must be finite and non-negative",
                    t
                )));
            }
            if let Some(&prev) = times.last() {
                if t <= prev {
                    return Err(NefsimError::InvalidInput(format!(
                        "breakpoint times must be strictly increasing ({} follows {})",
                        t, prev
                    )));
                }
            }
            if v.len() != dim {
                return Err(NefsimError::ShapeMismatch {
                    expected: vec![dim],
                    actual: vec![v.len()],
                });
            }
            times.push(t);
            values.push(v);
        }

        Ok(Self {
            times,
            values,
            default: vec![0.0; dim],
        })
    }

    /// Build a scalar step function from (time, value) breakpoints
    pub fn scalar(breakpoints: &[(f64, f64)]) -> Result<Self> {
        Self::new(breakpoints.iter().map(|&(t, v)| (t, vec![v])).collect())
    }

    /// Replace the value returned before the first breakpoint.
    ///
    /// The default must match the breakpoint dimensionality.
    pub fn with_default(mut self, default: Vec<f64>) -> Result<Self> {
        if default.len() != self.dim() {
            return Err(NefsimError::ShapeMismatch {
                expected: vec![self.dim()],
                actual: vec![default.len()],
            });
        }
        self.default = default;
        Ok(self)
    }

    /// Output dimensionality
    pub fn dim(&self) -> usize {
        self.values[0].len()
    }

    /// Number of breakpoints
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True if there are no breakpoints (never true for a constructed value)
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Value of the largest breakpoint time <= t, or the default before the
    /// first breakpoint. Pure lookup, no state.
    pub fn value_at(&self, t: f64) -> &[f64] {
        let idx = self.times.partition_point(|&bt| bt <= t);
        if idx == 0 {
            &self.default
        } else {
            &self.values[idx - 1]
        }
    }
}

impl Stimulus for Piecewise {
    fn dim(&self) -> usize {
        self.dim()
    }

    fn sample(&self, t: f64) -> Vec<f64> {
        self.value_at(t).to_vec()
    }
}

/// Constant signal source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Constant {
    value: Vec<f64>,
}

impl Constant {
    /// Constant vector signal
    pub fn new(value: Vec<f64>) -> Result<Self> {
        if value.is_empty() {
            return Err(NefsimError::InvalidInput(
                "constant signal must have at least one entry".to_string(),
            ));
        }
        Ok(Self { value })
    }

    /// Constant scalar signal
    pub fn scalar(value: f64) -> Self {
        Self { value: vec![value] }
    }
}

impl Stimulus for Constant {
    fn dim(&self) -> usize {
        self.value.len()
    }

    fn sample(&self, _t: f64) -> Vec<f64> {
        self.value.clone()
    }
}

/// Arbitrary pure function of time, with its output dimensionality declared
/// up front so model shape checks stay possible.
pub struct FnStimulus {
    dim: usize,
    f: Box<dyn Fn(f64) -> Vec<f64> + Send + Sync>,
}

impl FnStimulus {
    /// Wrap a pure function of time producing `dim` values per call
    pub fn new<F>(dim: usize, f: F) -> Result<Self>
    where
        F: Fn(f64) -> Vec<f64> + Send + Sync + 'static,
    {
        if dim == 0 {
            return Err(NefsimError::InvalidInput(
                "function stimulus must have at least one output".to_string(),
            ));
        }
        Ok(Self {
            dim,
            f: Box::new(f),
        })
    }
}

impl std::fmt::Debug for FnStimulus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStimulus").field("dim", &self.dim).finish()
    }
}

impl Stimulus for FnStimulus {
    fn dim(&self) -> usize {
        self.dim
    }

    fn sample(&self, t: f64) -> Vec<f64> {
        (self.f)(t)
    }
}
