//! Backend trait - the boundary to a simulation engine

use crate::error::Result;
use crate::model::Network;
use crate::sim::SimulationRecord;

/// Executes a declared network for a fixed duration.
///
/// This is the seam to the external engine: the model layer produces inert
/// declarations, a backend turns them into probed trajectories. Anything
/// satisfying this trait - the shipped direct-mode evaluator or a full
/// spiking engine - can run a `Network`.
pub trait Backend {
    /// Integration timestep in seconds
    fn dt(&self) -> f64;

    /// Run the network for `duration` seconds and record every probe.
    ///
    /// Fails with `InvalidInput` for a non-positive duration and with
    /// `Simulation` for failures that only surface mid-run (e.g. a function
    /// transform producing the wrong number of values).
    fn run(&mut self, network: &Network, duration: f64) -> Result<SimulationRecord>;
}
