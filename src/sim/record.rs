//! Simulation records - probed trajectories over a run
//!
//! A record is what comes back from a backend: the time vector plus one
//! `[num_steps, dim]` trace per probe. Records serialize to JSON for
//! archiving and export to CSV for external plotting.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NefsimError, Result};
use crate::model::ProbeId;

/// One probe's sampled decoded output over a run
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProbeTrace {
    /// The probe this trace belongs to
    pub probe: ProbeId,
    /// Name of the probed ensemble (used in CSV headers)
    pub label: String,
    /// Dimensionality of each sample
    pub dim: usize,
    /// Samples, one row per timestep
    pub data: Vec<Vec<f64>>,
}

/// Recorded output of one simulation run
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimulationRecord {
    /// Integration timestep the backend used (seconds)
    pub dt: f64,
    /// Sample timestamps, one per step
    pub time: Vec<f64>,
    traces: Vec<ProbeTrace>,
}

impl SimulationRecord {
    /// Assemble a record, checking that every trace is rectangular and as
    /// long as the time vector
    pub fn new(dt: f64, time: Vec<f64>, traces: Vec<ProbeTrace>) -> Result<Self> {
        for trace in &traces {
            if trace.data.len() != time.len() {
                return Err(NefsimError::RecordFormat(format!(
                    "trace '{}' has {} rows, time vector has {}",
                    trace.label,
                    trace.data.len(),
                    time.len()
                )));
            }
            if trace.data.iter().any(|row| row.len() != trace.dim) {
                return Err(NefsimError::RecordFormat(format!(
                    "trace '{}' has rows that are not {}-dimensional",
                    trace.label, trace.dim
                )));
            }
        }
        Ok(Self { dt, time, traces })
    }

    /// Number of recorded timesteps
    pub fn num_steps(&self) -> usize {
        self.time.len()
    }

    /// All traces, in probe declaration order
    pub fn traces(&self) -> &[ProbeTrace] {
        &self.traces
    }

    /// Trace for a probe handle
    pub fn trace(&self, probe: ProbeId) -> Result<&ProbeTrace> {
        self.traces
            .iter()
            .find(|t| t.probe == probe)
            .ok_or_else(|| NefsimError::UnknownHandle(format!("{:?}", probe)))
    }

    /// Write the record as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| NefsimError::RecordFormat(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a record previously written with [`save_json`](Self::save_json)
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| NefsimError::RecordFormat(e.to_string()))
    }

    /// Write the record as CSV: a `time` column followed by one column per
    /// trace dimension, headed `label[d]`
    pub fn write_csv<W: Write>(&self, mut w: W) -> Result<()> {
        let mut header = String::from("time");
        for trace in &self.traces {
            for d in 0..trace.dim {
                header.push_str(&format!(",{}[{}]", trace.label, d));
            }
        }
        writeln!(w, "{}", header)?;

        for (i, t) in self.time.iter().enumerate() {
            let mut line = format!("{}", t);
            for trace in &self.traces {
                for value in &trace.data[i] {
                    line.push_str(&format!(",{}", value));
                }
            }
            writeln!(w, "{}", line)?;
        }
        Ok(())
    }

    /// Write the record as CSV to a file
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = fs::File::create(path)?;
        self.write_csv(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnsembleSpec, Network};

    // Tests need real handles; mint them from a throwaway network.
    fn minted_probe() -> ProbeId {
        let mut net = Network::new();
        let e = net.add_ensemble(EnsembleSpec::new("A", 10, 2)).unwrap();
        net.probe(e, None).unwrap()
    }

    fn sample_record(probe: ProbeId) -> SimulationRecord {
        SimulationRecord::new(
            0.001,
            vec![0.001, 0.002, 0.003],
            vec![ProbeTrace {
                probe,
                label: "A".to_string(),
                dim: 2,
                data: vec![vec![0.0, 1.0], vec![0.5, 1.0], vec![1.0, 1.0]],
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_traces() {
        let probe = minted_probe();
        let result = SimulationRecord::new(
            0.001,
            vec![0.001, 0.002],
            vec![ProbeTrace {
                probe,
                label: "A".to_string(),
                dim: 1,
                data: vec![vec![0.0]],
            }],
        );
        assert!(matches!(result, Err(NefsimError::RecordFormat(_))));

        let result = SimulationRecord::new(
            0.001,
            vec![0.001],
            vec![ProbeTrace {
                probe,
                label: "A".to_string(),
                dim: 2,
                data: vec![vec![0.0]],
            }],
        );
        assert!(matches!(result, Err(NefsimError::RecordFormat(_))));
    }

    #[test]
    fn test_trace_lookup() {
        let probe = minted_probe();
        let record = sample_record(probe);
        assert_eq!(record.num_steps(), 3);
        assert_eq!(record.trace(probe).unwrap().dim, 2);

        // A probe minted by a different network never matches, even though
        // its position index coincides with the recorded trace's
        let other = minted_probe();
        assert_eq!(other.index(), probe.index());
        assert!(matches!(
            record.trace(other),
            Err(NefsimError::UnknownHandle(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        let record = sample_record(minted_probe());
        record.save_json(&path).unwrap();
        let restored = SimulationRecord::load_json(&path).unwrap();
        assert_eq!(record, restored);
    }

    #[test]
    fn test_csv_layout() {
        let record = sample_record(minted_probe());
        let mut out = Vec::new();
        record.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "time,A[0],A[1]");
        assert_eq!(lines[1], "0.001,0,1");
        assert_eq!(lines[3], "0.003,1,1");
    }
}
