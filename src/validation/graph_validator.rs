//! Transition-graph-aware path validation.
//!
//! Truncating a path at a collision can leave its new end in a different
//! transition state than the end the path was built for. A roadmap edge
//! whose endpoints straddle a state boundary is useless to the planner,
//! so the validator detects the situation and either repairs the
//! truncated part by re-attaching a transition constraint, or rejects it
//! outright with a zero-length result.

use std::sync::Arc;

use tracing::debug;

use crate::common::{PathValidator, PlanningResult};
use crate::graph::{StateId, TransitionGraph};
use crate::path::Path;

/// Wraps a base validator and checks that the part it keeps stays
/// consistent with the transition graph.
///
/// The returned path never exceeds the input in length. In forward mode
/// it is a prefix of the input starting at the input's start time; in
/// reverse mode (experimental) it is a suffix ending at the input's end
/// time. A path is always returned, possibly of zero length.
pub struct GraphPathValidator {
    base: Box<dyn PathValidator>,
    graph: Arc<dyn TransitionGraph>,
}

impl GraphPathValidator {
    pub fn new(base: Box<dyn PathValidator>, graph: Arc<dyn TransitionGraph>) -> Self {
        GraphPathValidator { base, graph }
    }

    pub fn graph(&self) -> &Arc<dyn TransitionGraph> {
        &self.graph
    }

    fn validate_impl(&self, path: &Path, reverse: bool) -> (bool, Path) {
        match path.sub_paths() {
            Some(parts) => self.validate_vector(path, parts, reverse),
            None => self.validate_leaf(path, reverse),
        }
    }

    /// Validates a concatenation part by part, stopping at the first
    /// invalid one. Parts before (after, in reverse mode) the failing
    /// part are kept whole.
    fn validate_vector(&self, path: &Path, parts: &[Path], reverse: bool) -> (bool, Path) {
        if !reverse {
            for (i, part) in parts.iter().enumerate() {
                let (ok, valid) = self.validate_impl(part, false);
                if !ok {
                    if i == 0 {
                        return (false, valid);
                    }
                    let mut kept: Vec<Path> = parts[..i].to_vec();
                    kept.push(valid);
                    return (false, Path::concat(kept));
                }
            }
        } else {
            for i in (0..parts.len()).rev() {
                let (ok, valid) = self.validate_impl(&parts[i], true);
                if !ok {
                    if i == parts.len() - 1 {
                        return (false, valid);
                    }
                    let mut kept = vec![valid];
                    kept.extend(parts[i + 1..].iter().cloned());
                    return (false, Path::concat(kept));
                }
            }
        }
        (true, path.clone())
    }

    fn validate_leaf(&self, path: &Path, reverse: bool) -> (bool, Path) {
        let (ok, no_collision) = self.base.validate(path, reverse);
        if ok {
            return (true, path.clone());
        }
        let (old_t0, old_t1) = path.time_range();
        let (new_t0, new_t1) = no_collision.time_range();

        let classified = (|| -> PlanningResult<[Vec<StateId>; 4]> {
            Ok([
                self.graph.classify(&no_collision.eval(new_t0))?,
                self.graph.classify(&no_collision.eval(new_t1))?,
                self.graph.classify(&path.eval(old_t0))?,
                self.graph.classify(&path.eval(old_t1))?,
            ])
        })();
        let [trunc_start, trunc_end, orig_start, orig_end] = match classified {
            Ok(states) => states,
            Err(err) => {
                debug!("discarding truncated path, {err}");
                return (false, zero_length_start(path, reverse));
            }
        };

        if trunc_start == orig_start && trunc_end == orig_end {
            return (false, no_collision);
        }

        // The truncation crossed a state boundary. Look for a transition
        // edge whose constraint holds over the truncated part; attaching
        // it makes the part a usable partial transition.
        let mut candidates = self.graph.edges_between(&trunc_start, &trunc_end);
        debug!(
            "truncation crossed a state boundary, {} candidate edge(s)",
            candidates.len()
        );
        while let Some(edge) = candidates.pop() {
            let mut op = self.graph.path_constraint(edge);
            let start = no_collision.eval(new_t0);
            op.offset_from_config(&start);
            debug_assert!(op.is_satisfied(&start));
            if op.is_satisfied(&no_collision.eval(new_t1)) {
                let constrained = no_collision.clone().with_constraint(Arc::from(op));
                let (_, valid) = self.validate_impl(&constrained, reverse);
                return (false, valid);
            }
        }
        (false, zero_length_start(path, reverse))
    }
}

impl PathValidator for GraphPathValidator {
    fn validate(&self, path: &Path, reverse: bool) -> (bool, Path) {
        let (ok, part) = self.validate_impl(path, reverse);
        debug_assert!(part.length() <= path.length() + crate::path::TIME_EPS);
        (ok, part)
    }
}

/// Zero-length stand-in anchored so that prefix (or suffix) semantics of
/// the validation result still hold.
fn zero_length_start(path: &Path, reverse: bool) -> Path {
    let (t0, t1) = path.time_range();
    if reverse {
        Path::point(path.eval(t1), t1)
    } else {
        Path::point(path.eval(t0), t0)
    }
}
