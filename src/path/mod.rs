//! Unit-speed trajectories in configuration space
//!
//! A [`Path`] is either a straight segment between two configurations or a
//! concatenation of sub-paths. Paths are parameterized at unit speed, so a
//! path's duration equals its arc length and extracting a fraction of its
//! length is the same as extracting a time sub-range. A path may carry a
//! constraint operator describing the manifold it is supposed to stay on;
//! the operator travels along through extraction and reversal.

use std::fmt;
use std::sync::Arc;

use crate::common::{Configuration, ConstraintOperator, PlanningError, PlanningResult};

/// Tolerance used for time-range checks and zero-length tests.
pub(crate) const TIME_EPS: f64 = 1e-9;

#[derive(Clone)]
enum PathKind {
    Straight {
        from: Configuration,
        to: Configuration,
    },
    Concat(Vec<Path>),
}

/// A continuous trajectory over a closed time interval.
#[derive(Clone)]
pub struct Path {
    start_time: f64,
    kind: PathKind,
    constraint: Option<Arc<dyn ConstraintOperator>>,
}

impl Path {
    /// Straight segment from `from` to `to`, over `[0, distance]`.
    pub fn straight(from: Configuration, to: Configuration) -> Path {
        Path {
            start_time: 0.0,
            kind: PathKind::Straight { from, to },
            constraint: None,
        }
    }

    /// Zero-length path sitting at `q` at time `t`.
    pub fn point(q: Configuration, t: f64) -> Path {
        Path {
            start_time: t,
            kind: PathKind::Straight {
                from: q.clone(),
                to: q,
            },
            constraint: None,
        }
    }

    /// Concatenation of `parts` in order.
    ///
    /// Parts are re-anchored to be contiguous in time; the result starts at
    /// the first part's start time. Panics on an empty part list.
    pub fn concat(parts: Vec<Path>) -> Path {
        assert!(!parts.is_empty(), "concatenation of zero paths");
        let start = parts[0].time_range().0;
        Path {
            start_time: start,
            kind: PathKind::Concat(reanchor(parts, start)),
            constraint: None,
        }
    }

    /// Attach a constraint operator. Consumes and returns the path.
    pub fn with_constraint(mut self, op: Arc<dyn ConstraintOperator>) -> Path {
        self.constraint = Some(op);
        self
    }

    /// The attached constraint operator, if any.
    pub fn constraint(&self) -> Option<&Arc<dyn ConstraintOperator>> {
        self.constraint.as_ref()
    }

    /// Sub-paths of a concatenation, `None` for a leaf segment.
    pub fn sub_paths(&self) -> Option<&[Path]> {
        match &self.kind {
            PathKind::Concat(parts) => Some(parts),
            PathKind::Straight { .. } => None,
        }
    }

    pub fn time_range(&self) -> (f64, f64) {
        (self.start_time, self.start_time + self.duration())
    }

    /// Arc length, which equals the duration for unit-speed paths.
    pub fn length(&self) -> f64 {
        self.duration()
    }

    pub fn is_zero_length(&self) -> bool {
        self.duration() < TIME_EPS
    }

    /// Configuration at the path's start time.
    pub fn initial(&self) -> &Configuration {
        match &self.kind {
            PathKind::Straight { from, .. } => from,
            PathKind::Concat(parts) => parts[0].initial(),
        }
    }

    /// Configuration at the path's end time.
    pub fn end(&self) -> &Configuration {
        match &self.kind {
            PathKind::Straight { to, .. } => to,
            PathKind::Concat(parts) => parts[parts.len() - 1].end(),
        }
    }

    /// Configuration at time `t`, clamped to the path's time range.
    pub fn eval(&self, t: f64) -> Configuration {
        let (t0, t1) = self.time_range();
        let t = t.clamp(t0, t1);
        match &self.kind {
            PathKind::Straight { from, to } => {
                let duration = t1 - t0;
                if duration < TIME_EPS {
                    from.clone()
                } else {
                    from.interpolate(to, (t - t0) / duration)
                }
            }
            PathKind::Concat(parts) => {
                for part in parts {
                    if t <= part.time_range().1 + TIME_EPS {
                        return part.eval(t);
                    }
                }
                parts[parts.len() - 1].end().clone()
            }
        }
    }

    /// Extract the sub-path over `[from, to]`.
    ///
    /// An inverted interval (`from > to`) yields the time-reversed sub-path
    /// over `[to, from]`. Requests outside the path's time range fail.
    pub fn extract(&self, from: f64, to: f64) -> PlanningResult<Path> {
        if from > to {
            return Ok(self.extract(to, from)?.reversed());
        }
        let (t0, t1) = self.time_range();
        if from < t0 - TIME_EPS || to > t1 + TIME_EPS {
            return Err(PlanningError::IntervalOutOfRange {
                from,
                to,
                start: t0,
                end: t1,
            });
        }
        let from = from.clamp(t0, t1);
        let to = to.clamp(t0, t1);
        let mut extracted = if to - from < TIME_EPS {
            Path::point(self.eval(from), from)
        } else {
            match &self.kind {
                PathKind::Straight { .. } => Path {
                    start_time: from,
                    kind: PathKind::Straight {
                        from: self.eval(from),
                        to: self.eval(to),
                    },
                    constraint: None,
                },
                PathKind::Concat(parts) => {
                    let mut kept = Vec::new();
                    for part in parts {
                        let (p0, p1) = part.time_range();
                        if p1 < from + TIME_EPS || p0 > to - TIME_EPS {
                            continue;
                        }
                        kept.push(part.extract(from.max(p0), to.min(p1))?);
                    }
                    match kept.len() {
                        0 => Path::point(self.eval(from), from),
                        1 => kept.remove(0),
                        _ => Path::concat(kept),
                    }
                }
            }
        };
        extracted.constraint = self.constraint.clone();
        Ok(extracted)
    }

    /// Time reversal over the same time range: the result starts where the
    /// input ends and ends where it starts.
    pub fn reversed(&self) -> Path {
        let kind = match &self.kind {
            PathKind::Straight { from, to } => PathKind::Straight {
                from: to.clone(),
                to: from.clone(),
            },
            PathKind::Concat(parts) => {
                let flipped: Vec<Path> = parts.iter().rev().map(|p| p.reversed()).collect();
                PathKind::Concat(reanchor(flipped, self.start_time))
            }
        };
        Path {
            start_time: self.start_time,
            kind,
            constraint: self.constraint.clone(),
        }
    }

    /// Shift the path so that it starts at `t`.
    pub(crate) fn anchored_at(mut self, t: f64) -> Path {
        self.start_time = t;
        if let PathKind::Concat(parts) = self.kind {
            self.kind = PathKind::Concat(reanchor(parts, t));
        }
        self
    }

    fn duration(&self) -> f64 {
        match &self.kind {
            PathKind::Straight { from, to } => from.distance(to),
            PathKind::Concat(parts) => parts.iter().map(|p| p.duration()).sum(),
        }
    }
}

fn reanchor(parts: Vec<Path>, start: f64) -> Vec<Path> {
    let mut t = start;
    parts
        .into_iter()
        .map(|p| {
            let d = p.duration();
            let anchored = p.anchored_at(t);
            t += d;
            anchored
        })
        .collect()
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (t0, t1) = self.time_range();
        match &self.kind {
            PathKind::Straight { from, to } => f
                .debug_struct("Path")
                .field("range", &(t0, t1))
                .field("from", from)
                .field("to", to)
                .finish(),
            PathKind::Concat(parts) => f
                .debug_struct("Path")
                .field("range", &(t0, t1))
                .field("parts", &parts.len())
                .finish(),
        }
    }
}
