//! Network - the model builder
//!
//! A `Network` owns the declared nodes, ensembles, connections, and probes,
//! and hands out typed handles for wiring them together. All shape and
//! handle checks happen here, when a declaration is added.

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::connection::{Connection, ProbeSpec, Source, Transform};
use super::ensemble::EnsembleSpec;
use crate::error::{NefsimError, Result};
use crate::signal::Stimulus;

/// Process-wide counter so every network gets a distinct identity and
/// handles cannot cross between networks
static NEXT_NETWORK_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to a stimulus node within a network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    net: u64,
    index: usize,
}

/// Handle to an ensemble within a network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnsembleId {
    net: u64,
    index: usize,
}

impl EnsembleId {
    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

/// Handle to a probe within a network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeId {
    net: u64,
    index: usize,
}

impl ProbeId {
    /// Position of this probe in the network's declaration order
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Stimulus node: a named external signal source
pub struct NodeSpec {
    name: String,
    stimulus: Box<dyn Stimulus>,
}

impl NodeSpec {
    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output dimensionality
    pub fn dim(&self) -> usize {
        self.stimulus.dim()
    }

    /// The wrapped signal source
    pub fn stimulus(&self) -> &dyn Stimulus {
        self.stimulus.as_ref()
    }
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("dim", &self.dim())
            .finish()
    }
}

/// Declarative model: ensembles, stimulus nodes, connections, probes
///
/// Handles are tagged with the identity of the network that minted them, so
/// a handle from one network fails with `UnknownHandle` in any other.
#[derive(Debug)]
pub struct Network {
    id: u64,
    nodes: Vec<NodeSpec>,
    ensembles: Vec<EnsembleSpec>,
    connections: Vec<Connection>,
    probes: Vec<ProbeSpec>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Empty network
    pub fn new() -> Self {
        Self {
            id: NEXT_NETWORK_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            ensembles: Vec::new(),
            connections: Vec::new(),
            probes: Vec::new(),
        }
    }

    /// Add a stimulus node wrapping any pure signal source
    pub fn add_node(&mut self, name: impl Into<String>, stimulus: impl Stimulus + 'static) -> NodeId {
        self.nodes.push(NodeSpec {
            name: name.into(),
            stimulus: Box::new(stimulus),
        });
        NodeId {
            net: self.id,
            index: self.nodes.len() - 1,
        }
    }

    /// Add an ensemble; the spec is validated before it is accepted
    pub fn add_ensemble(&mut self, spec: EnsembleSpec) -> Result<EnsembleId> {
        spec.validate()?;
        self.ensembles.push(spec);
        Ok(EnsembleId {
            net: self.id,
            index: self.ensembles.len() - 1,
        })
    }

    /// Connect a source to the whole input space of a target ensemble
    pub fn connect(
        &mut self,
        source: impl Into<Source>,
        target: EnsembleId,
        transform: Transform,
        synapse: Option<f64>,
    ) -> Result<()> {
        let dims = self.ensemble(target)?.dimensions;
        self.connect_to_subspace(source, target, 0..dims, transform, synapse)
    }

    /// Connect a source to a subspace of a target ensemble's input.
    ///
    /// Checks, in order: handles belong to this network, the subspace lies
    /// inside the target, the transform maps source dim onto subspace width,
    /// and the synapse time constant (if any) is positive and finite.
    pub fn connect_to_subspace(
        &mut self,
        source: impl Into<Source>,
        target: EnsembleId,
        subspace: Range<usize>,
        transform: Transform,
        synapse: Option<f64>,
    ) -> Result<()> {
        let source = source.into();
        let source_dim = self.source_dim(source)?;
        let target_spec = self.ensemble(target)?;

        if subspace.start >= subspace.end || subspace.end > target_spec.dimensions {
            return Err(NefsimError::InvalidInput(format!(
                "subspace {}..{} does not fit ensemble '{}' ({} dims)",
                subspace.start, subspace.end, target_spec.name, target_spec.dimensions
            )));
        }
        transform.check_dims(source_dim, subspace.len())?;
        check_synapse(synapse)?;

        self.connections.push(Connection {
            source,
            target,
            subspace,
            transform,
            synapse,
        });
        Ok(())
    }

    /// Record an ensemble's decoded output, optionally smoothed
    pub fn probe(&mut self, target: EnsembleId, synapse: Option<f64>) -> Result<ProbeId> {
        self.ensemble(target)?;
        check_synapse(synapse)?;
        self.probes.push(ProbeSpec { target, synapse });
        Ok(ProbeId {
            net: self.id,
            index: self.probes.len() - 1,
        })
    }

    /// Look up an ensemble spec by handle.
    ///
    /// Fails with `UnknownHandle` for a handle minted by another network,
    /// even when its index would be in range here.
    pub fn ensemble(&self, id: EnsembleId) -> Result<&EnsembleSpec> {
        if id.net != self.id {
            return Err(NefsimError::UnknownHandle(format!("{:?}", id)));
        }
        self.ensembles
            .get(id.index)
            .ok_or_else(|| NefsimError::UnknownHandle(format!("{:?}", id)))
    }

    /// Look up a node spec by handle.
    ///
    /// Fails with `UnknownHandle` for a handle minted by another network,
    /// even when its index would be in range here.
    pub fn node(&self, id: NodeId) -> Result<&NodeSpec> {
        if id.net != self.id {
            return Err(NefsimError::UnknownHandle(format!("{:?}", id)));
        }
        self.nodes
            .get(id.index)
            .ok_or_else(|| NefsimError::UnknownHandle(format!("{:?}", id)))
    }

    /// Output dimensionality of a connection source
    pub fn source_dim(&self, source: Source) -> Result<usize> {
        match source {
            Source::Node(id) => Ok(self.node(id)?.dim()),
            Source::Ensemble(id) => Ok(self.ensemble(id)?.dimensions),
        }
    }

    /// All declared nodes, in declaration order
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// All declared ensembles, in declaration order
    pub fn ensembles(&self) -> &[EnsembleSpec] {
        &self.ensembles
    }

    /// All declared connections, in declaration order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// All declared probes, in declaration order
    pub fn probes(&self) -> &[ProbeSpec] {
        &self.probes
    }

    /// Handle for the probe at `index`, tagged with this network's identity
    pub(crate) fn probe_handle(&self, index: usize) -> ProbeId {
        ProbeId {
            net: self.id,
            index,
        }
    }
}

fn check_synapse(synapse: Option<f64>) -> Result<()> {
    if let Some(tau) = synapse {
        if !tau.is_finite() || tau <= 0.0 {
            return Err(NefsimError::InvalidInput(format!(
                "synapse time constant {} must be finite and positive",
                tau
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Piecewise;

    fn integrator_network() -> (Network, EnsembleId, ProbeId) {
        let tau = 0.1;
        let mut net = Network::new();

        let input = net.add_node(
            "input",
            Piecewise::scalar(&[(0.2, 5.0), (0.3, 0.0), (0.44, -10.0), (0.54, 0.0)]).unwrap(),
        );
        let control = net.add_node(
            "control",
            Piecewise::scalar(&[(0.6, -0.5)]).unwrap(),
        );
        let a = net
            .add_ensemble(EnsembleSpec::new("A", 225, 2).with_radius(1.5))
            .unwrap();

        net.connect_to_subspace(input, a, 0..1, Transform::scaling(tau), Some(tau))
            .unwrap();
        net.connect_to_subspace(control, a, 1..2, Transform::Identity, Some(0.005))
            .unwrap();
        net.connect_to_subspace(
            a,
            a,
            0..1,
            Transform::function(1, |x| vec![x[0] * x[1] + x[0]]).unwrap(),
            Some(tau),
        )
        .unwrap();
        let probe = net.probe(a, Some(0.01)).unwrap();

        (net, a, probe)
    }

    #[test]
    fn test_integrator_declaration() {
        let (net, a, probe) = integrator_network();
        assert_eq!(net.nodes().len(), 2);
        assert_eq!(net.ensembles().len(), 1);
        assert_eq!(net.connections().len(), 3);
        assert_eq!(net.probes().len(), 1);
        assert_eq!(net.ensemble(a).unwrap().radius, 1.5);
        assert_eq!(probe.index(), 0);
    }

    #[test]
    fn test_transform_shape_checked_at_connect() {
        let mut net = Network::new();
        let n = net.add_node("n", Piecewise::scalar(&[(0.0, 1.0)]).unwrap());
        let e = net.add_ensemble(EnsembleSpec::new("E", 50, 2)).unwrap();

        // Scalar source into 2-dim target through identity: mismatch
        let result = net.connect(n, e, Transform::Identity, None);
        assert!(matches!(result, Err(NefsimError::ShapeMismatch { .. })));

        // Matrix with wrong input width
        let t = Transform::matrix(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let result = net.connect(n, e, t, None);
        assert!(matches!(result, Err(NefsimError::ShapeMismatch { .. })));

        // 2x1 matrix fits
        let t = Transform::matrix(vec![vec![1.0], vec![0.0]]).unwrap();
        assert!(net.connect(n, e, t, None).is_ok());
    }

    #[test]
    fn test_subspace_bounds_checked() {
        let mut net = Network::new();
        let n = net.add_node("n", Piecewise::scalar(&[(0.0, 1.0)]).unwrap());
        let e = net.add_ensemble(EnsembleSpec::new("E", 50, 2)).unwrap();

        assert!(net
            .connect_to_subspace(n, e, 2..3, Transform::Identity, None)
            .is_err());
        assert!(net
            .connect_to_subspace(n, e, 1..1, Transform::Identity, None)
            .is_err());
        assert!(net
            .connect_to_subspace(n, e, 1..2, Transform::Identity, None)
            .is_ok());
    }

    #[test]
    fn test_bad_synapse_rejected() {
        let mut net = Network::new();
        let n = net.add_node("n", Piecewise::scalar(&[(0.0, 1.0)]).unwrap());
        let e = net.add_ensemble(EnsembleSpec::new("E", 50, 1)).unwrap();

        assert!(net.connect(n, e, Transform::Identity, Some(0.0)).is_err());
        assert!(net.connect(n, e, Transform::Identity, Some(-0.1)).is_err());
        assert!(net
            .connect(n, e, Transform::Identity, Some(f64::NAN))
            .is_err());
        assert!(net.probe(e, Some(0.0)).is_err());
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut big = Network::new();
        for i in 0..3 {
            big.add_ensemble(EnsembleSpec::new(format!("E{}", i), 10, 1))
                .unwrap();
        }
        let stale = big.add_ensemble(EnsembleSpec::new("E3", 10, 1)).unwrap();

        let mut net = Network::new();
        assert!(matches!(
            net.probe(stale, None),
            Err(NefsimError::UnknownHandle(_))
        ));
        assert!(net.ensemble(stale).is_err());
    }

    #[test]
    fn test_foreign_handle_rejected_even_in_range() {
        // Both networks have an ensemble and a node at position 0, so a
        // foreign handle's index alone would resolve; the network identity
        // tag must still reject it
        let mut first = Network::new();
        let foreign_node = first.add_node("n", Piecewise::scalar(&[(0.0, 1.0)]).unwrap());
        let foreign = first.add_ensemble(EnsembleSpec::new("A", 10, 1)).unwrap();

        let mut second = Network::new();
        second.add_node("n", Piecewise::scalar(&[(0.0, 1.0)]).unwrap());
        let own = second.add_ensemble(EnsembleSpec::new("B", 10, 1)).unwrap();

        assert!(matches!(
            second.ensemble(foreign),
            Err(NefsimError::UnknownHandle(_))
        ));
        assert!(matches!(
            second.node(foreign_node),
            Err(NefsimError::UnknownHandle(_))
        ));
        assert!(matches!(
            second.probe(foreign, None),
            Err(NefsimError::UnknownHandle(_))
        ));
        assert!(matches!(
            second.connect(foreign, own, Transform::Identity, None),
            Err(NefsimError::UnknownHandle(_))
        ));
        assert!(matches!(
            second.connect(foreign_node, foreign, Transform::Identity, None),
            Err(NefsimError::UnknownHandle(_))
        ));

        // The networks' own handles keep working
        assert!(second.ensemble(own).is_ok());
        assert!(first.ensemble(foreign).is_ok());
    }

    #[test]
    fn test_invalid_ensemble_spec_rejected() {
        let mut net = Network::new();
        assert!(net.add_ensemble(EnsembleSpec::new("E", 0, 1)).is_err());
        assert!(net.ensembles().is_empty());
    }
}
