//! Direct-mode reference backend
//!
//! Integrates the declared dynamics without simulating neurons: each
//! connection carries a first-order low-pass filter state with its synapse
//! time constant, and an ensemble's represented value is the sum of its
//! filtered connection inputs, assembled per target subspace. Forward Euler
//! with a configurable timestep.
//!
//! This is the trajectory an ideal population would produce, so it doubles
//! as the reference curve a spiking backend's output is compared against.
//! Runs are deterministic: the same network and duration always produce an
//! identical record.

use serde::{Deserialize, Serialize};

use crate::error::{NefsimError, Result};
use crate::model::{Network, Source};
use crate::sim::{Backend, ProbeTrace, SimulationRecord};

/// Reference backend configuration
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReferenceConfig {
    /// Integration timestep in seconds
    pub dt: f64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self { dt: 1e-3 }
    }
}

/// Deterministic direct-mode evaluator of a declared network
#[derive(Clone, Debug, Default)]
pub struct ReferenceBackend {
    config: ReferenceConfig,
}

impl ReferenceBackend {
    /// Backend with the default 1 ms timestep
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with an explicit configuration
    pub fn with_config(config: ReferenceConfig) -> Result<Self> {
        if !config.dt.is_finite() || config.dt <= 0.0 {
            return Err(NefsimError::InvalidInput(format!(
                "timestep {} must be finite and positive",
                config.dt
            )));
        }
        Ok(Self { config })
    }
}

impl Backend for ReferenceBackend {
    fn dt(&self) -> f64 {
        self.config.dt
    }

    fn run(&mut self, network: &Network, duration: f64) -> Result<SimulationRecord> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(NefsimError::InvalidInput(format!(
                "run duration {} must be finite and positive",
                duration
            )));
        }

        let dt = self.config.dt;
        let steps = (duration / dt).ceil() as usize;

        // Represented value per ensemble, zero-initialized
        let mut values: Vec<Vec<f64>> = network
            .ensembles()
            .iter()
            .map(|e| vec![0.0; e.dimensions])
            .collect();

        // Low-pass filter state per connection, one entry per subspace dim
        let mut filters: Vec<Vec<f64>> = network
            .connections()
            .iter()
            .map(|c| vec![0.0; c.subspace.len()])
            .collect();

        // Smoothing filter state per probe
        let mut probe_filters: Vec<Vec<f64>> = network
            .probes()
            .iter()
            .map(|p| vec![0.0; values[p.target.index()].len()])
            .collect();

        let mut time = Vec::with_capacity(steps);
        let mut probe_data: Vec<Vec<Vec<f64>>> = network
            .probes()
            .iter()
            .map(|_| Vec::with_capacity(steps))
            .collect();

        for step in 0..steps {
            let t = step as f64 * dt;

            // Advance each connection's filter from the previous ensemble
            // values and the stimuli sampled at t
            for (ci, conn) in network.connections().iter().enumerate() {
                let u = match conn.source {
                    Source::Node(id) => {
                        let node = network.node(id)?;
                        let sampled = node.stimulus().sample(t);
                        if sampled.len() != node.dim() {
                            return Err(NefsimError::Simulation(format!(
                                "node '{}' produced {} values, declared {}",
                                node.name(),
                                sampled.len(),
                                node.dim()
                            )));
                        }
                        conn.transform.apply(&sampled)?
                    }
                    Source::Ensemble(id) => conn.transform.apply(&values[id.index()])?,
                };

                let state = &mut filters[ci];
                match conn.synapse {
                    Some(tau) => {
                        for (s, &input) in state.iter_mut().zip(&u) {
                            *s += dt / tau * (input - *s);
                        }
                    }
                    None => state.copy_from_slice(&u),
                }
            }

            // Reassemble ensemble values from the filtered inputs
            for value in values.iter_mut() {
                value.fill(0.0);
            }
            for (ci, conn) in network.connections().iter().enumerate() {
                let value = &mut values[conn.target.index()];
                for (d, offset) in conn.subspace.clone().enumerate() {
                    value[offset] += filters[ci][d];
                }
            }

            // Record probes at the end of the step
            time.push((step + 1) as f64 * dt);
            for (pi, probe) in network.probes().iter().enumerate() {
                let value = &values[probe.target.index()];
                let state = &mut probe_filters[pi];
                match probe.synapse {
                    Some(tau) => {
                        for (s, &v) in state.iter_mut().zip(value) {
                            *s += dt / tau * (v - *s);
                        }
                    }
                    None => state.copy_from_slice(value),
                }
                probe_data[pi].push(state.clone());
            }
        }

        let traces = network
            .probes()
            .iter()
            .zip(probe_data)
            .enumerate()
            .map(|(pi, (probe, data))| {
                let spec = network.ensemble(probe.target)?;
                Ok(ProbeTrace {
                    probe: network.probe_handle(pi),
                    label: spec.name.clone(),
                    dim: spec.dimensions,
                    data,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        SimulationRecord::new(dt, time, traces)
    }
}
