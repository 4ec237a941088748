//! Declarative model layer - ensembles, stimulus nodes, connections, probes
//!
//! Everything in this module is inert configuration: a [`Network`] is a list
//! of ensemble/node/connection/probe declarations that a simulation backend
//! consumes. Nothing here simulates anything.
//!
//! Shape rules are enforced when declarations are added, so a malformed
//! model fails at build time rather than mid-run:
//!
//! - a transform's input dimensionality must match its source,
//! - its output dimensionality must match the target subspace width,
//! - subspaces must lie inside the target ensemble,
//! - synapse time constants must be positive and finite.

mod connection;
mod ensemble;
mod network;

pub use connection::{Connection, ProbeSpec, Source, Transform};
pub use ensemble::EnsembleSpec;
pub use network::{EnsembleId, Network, NodeId, NodeSpec, ProbeId};
