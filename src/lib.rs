//! # Nefsim - Declarative Neural-Ensemble Models
//!
//! Declare small neural-population models - ensembles, piecewise stimuli,
//! connections with transforms and synaptic time constants, probes - and run
//! them through a pluggable simulation backend.
//!
//! ## Core Components
//!
//! - **Piecewise**: right-continuous step function of time, validated at
//!   construction (strictly increasing breakpoints, consistent shapes)
//! - **Network**: inert model declaration with typed handles and build-time
//!   shape checks
//! - **Backend**: the seam to a simulation engine; spiking population
//!   simulation lives entirely behind it
//! - **ReferenceBackend**: direct-mode Euler evaluator of the declared
//!   dynamics, the analytic reference for any spiking implementation
//!
//! ## Design Principles
//!
//! - **Fail at construction**: malformed breakpoints, specs, and shape
//!   mismatches surface before any simulation work is attempted
//! - **Declarations are inert**: a `Network` is data; only a backend mutates
//!   state, and only its own
//! - **Pure signals**: stimuli are functions of time with no shared mutable
//!   state, safe to sample concurrently
//!
//! ## Example
//!
//! ```
//! use nefsim::{Backend, EnsembleSpec, Network, Piecewise, ReferenceBackend, Transform};
//!
//! # fn main() -> nefsim::Result<()> {
//! let tau = 0.1;
//! let mut net = Network::new();
//!
//! let input = net.add_node("input", Piecewise::scalar(&[(0.2, 5.0), (0.3, 0.0)])?);
//! let x = net.add_ensemble(EnsembleSpec::new("x", 100, 1))?;
//!
//! // Integrator: input scaled by tau, unity feedback, both filtered with tau
//! net.connect(input, x, Transform::scaling(tau), Some(tau))?;
//! net.connect(x, x, Transform::Identity, Some(tau))?;
//! let probe = net.probe(x, Some(0.01))?;
//!
//! let record = ReferenceBackend::new().run(&net, 0.5)?;
//! assert_eq!(record.trace(probe)?.data.len(), 500);
//! # Ok(())
//! # }
//! ```

// Piecewise stimuli and the Stimulus seam
pub mod signal;
pub use signal::{Constant, FnStimulus, Piecewise, Stimulus};

// Declarative model layer
pub mod model;
pub use model::{
    Connection, EnsembleId, EnsembleSpec, Network, NodeId, NodeSpec, ProbeId, ProbeSpec, Source,
    Transform,
};

// Simulation backends and records
pub mod sim;
pub use sim::{Backend, ProbeTrace, ReferenceBackend, ReferenceConfig, SimulationRecord};

// Error types
mod error;
pub use error::{NefsimError, Result};
