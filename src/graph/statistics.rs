//! Per-edge extension outcome statistics

use std::fmt;

use super::EdgeId;

/// Why an extension attempt did not fully succeed.
///
/// The first six reasons are the reported failure set; [`PartlyExtended`]
/// is a partial-success bucket (a usable path was still produced) that shows
/// up on the full record but not in the fixed-order report.
///
/// [`PartlyExtended`]: FailureReason::PartlyExtended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// Configuration projection onto the edge constraint failed.
    Projection,
    /// The edge steering method built no path.
    SteeringMethod,
    /// Validation kept nothing of the path.
    PathValidationZero,
    /// Path projection kept nothing of the path.
    PathProjectionZero,
    /// The path could not be fully projected.
    PathProjectionShorter,
    /// The path could not be fully validated.
    PathValidationShorter,
    /// The extension went through but covered only part of the intended path.
    PartlyExtended,
}

impl FailureReason {
    pub const ALL: [FailureReason; 7] = [
        FailureReason::Projection,
        FailureReason::SteeringMethod,
        FailureReason::PathValidationZero,
        FailureReason::PathProjectionZero,
        FailureReason::PathProjectionShorter,
        FailureReason::PathValidationShorter,
        FailureReason::PartlyExtended,
    ];

    /// Number of reasons included in the fixed-order report.
    pub const REPORTED: usize = 6;

    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::Projection => "projection failed",
            FailureReason::SteeringMethod => "steering method failed",
            FailureReason::PathValidationZero => "path validation returned length 0",
            FailureReason::PathProjectionZero => "path projection returned length 0",
            FailureReason::PathProjectionShorter => "path could not be fully projected",
            FailureReason::PathValidationShorter => "path could not be fully validated",
            FailureReason::PartlyExtended => "extended partly",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|r| r == self).unwrap_or(0)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome counters for one transition-graph edge.
#[derive(Debug, Clone)]
pub struct SuccessStatistics {
    name: String,
    successes: usize,
    failures: [usize; FailureReason::ALL.len()],
}

impl SuccessStatistics {
    pub fn new(name: impl Into<String>) -> Self {
        SuccessStatistics {
            name: name.into(),
            successes: 0,
            failures: [0; FailureReason::ALL.len()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_success(&mut self) {
        self.successes += 1;
    }

    pub fn add_failure(&mut self, reason: FailureReason) {
        self.failures[reason.index()] += 1;
    }

    pub fn nb_success(&self) -> usize {
        self.successes
    }

    pub fn nb_failure(&self, reason: FailureReason) -> usize {
        self.failures[reason.index()]
    }

    /// Total recorded attempts. Every attempt records exactly one outcome,
    /// so this equals successes plus all failure counters.
    pub fn attempts(&self) -> usize {
        self.successes + self.failures.iter().sum::<usize>()
    }
}

impl fmt::Display for SuccessStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} attempts, {} successes",
            self.name,
            self.attempts(),
            self.successes
        )?;
        for reason in FailureReason::ALL {
            let n = self.nb_failure(reason);
            if n > 0 {
                write!(f, ", {}: {}", reason.label(), n)?;
            }
        }
        Ok(())
    }
}

/// Sparse per-edge statistics table, keyed by the stable edge id.
///
/// Bins are created lazily the first time an edge is touched; edges never
/// touched read as all zero.
#[derive(Debug, Default)]
pub struct EdgeStatisticsTable {
    index: Vec<Option<usize>>,
    bins: Vec<SuccessStatistics>,
}

impl EdgeStatisticsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bin for `edge`, created on first use with the name from `name`.
    pub fn entry(
        &mut self,
        edge: EdgeId,
        name: impl FnOnce() -> String,
    ) -> &mut SuccessStatistics {
        if edge.0 >= self.index.len() {
            self.index.resize(edge.0 + 1, None);
        }
        let slot = match self.index[edge.0] {
            Some(slot) => slot,
            None => {
                self.bins.push(SuccessStatistics::new(name()));
                let slot = self.bins.len() - 1;
                self.index[edge.0] = Some(slot);
                slot
            }
        };
        &mut self.bins[slot]
    }

    pub fn get(&self, edge: EdgeId) -> Option<&SuccessStatistics> {
        self.index
            .get(edge.0)
            .copied()
            .flatten()
            .map(|slot| &self.bins[slot])
    }

    /// Touched edges with their records, in edge-id order.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, &SuccessStatistics)> {
        self.index
            .iter()
            .enumerate()
            .filter_map(|(edge, slot)| slot.map(|s| (EdgeId(edge), &self.bins[s])))
    }
}
