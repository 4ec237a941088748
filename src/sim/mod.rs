//! Simulation layer - the backend seam and the direct-mode reference backend
//!
//! A [`Backend`] consumes a declared [`Network`](crate::model::Network) and a
//! run duration and produces a [`SimulationRecord`]. A spiking engine
//! (population representation, encoding/decoding, recurrent weight solving)
//! lives entirely behind this trait. The crate ships one implementation,
//! [`ReferenceBackend`], which integrates the declared dynamics directly -
//! synaptic filters applied, no neurons - and serves as the analytic
//! reference a spiking backend's output can be compared against.

mod backend;
mod record;
mod reference;

pub use backend::Backend;
pub use record::{ProbeTrace, SimulationRecord};
pub use reference::{ReferenceBackend, ReferenceConfig};
