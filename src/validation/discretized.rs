//! Discretized collision checking along a path.

use crate::common::{Configuration, PathValidator};
use crate::path::Path;

/// Validates a path by sampling it at a fixed resolution against a
/// configuration validity predicate.
///
/// In forward mode the returned path is the longest prefix whose samples
/// are all valid; in reverse mode it is the longest such suffix. The
/// sample spacing never exceeds `resolution`, and both endpoints are
/// always sampled.
pub struct DiscretizedPathValidator<F> {
    resolution: f64,
    is_valid: F,
}

impl<F> DiscretizedPathValidator<F>
where
    F: Fn(&Configuration) -> bool,
{
    pub fn new(resolution: f64, is_valid: F) -> Self {
        assert!(resolution > 0.0, "resolution must be positive");
        DiscretizedPathValidator {
            resolution,
            is_valid,
        }
    }

    fn sample_times(&self, path: &Path) -> Vec<f64> {
        let (t0, t1) = path.time_range();
        let steps = ((t1 - t0) / self.resolution).ceil().max(1.0) as usize;
        (0..=steps)
            .map(|i| t0 + (t1 - t0) * i as f64 / steps as f64)
            .collect()
    }
}

impl<F> PathValidator for DiscretizedPathValidator<F>
where
    F: Fn(&Configuration) -> bool,
{
    fn validate(&self, path: &Path, reverse: bool) -> (bool, Path) {
        let (t0, t1) = path.time_range();
        let times = self.sample_times(path);

        if !reverse {
            let valid = times
                .iter()
                .take_while(|&&t| (self.is_valid)(&path.eval(t)))
                .count();
            if valid == times.len() {
                (true, path.clone())
            } else if valid == 0 {
                (false, Path::point(path.eval(t0), t0))
            } else {
                let part = path
                    .extract(t0, times[valid - 1])
                    .unwrap_or_else(|_| Path::point(path.eval(t0), t0));
                (false, part)
            }
        } else {
            let valid = times
                .iter()
                .rev()
                .take_while(|&&t| (self.is_valid)(&path.eval(t)))
                .count();
            if valid == times.len() {
                (true, path.clone())
            } else if valid == 0 {
                (false, Path::point(path.eval(t1), t1))
            } else {
                let part = path
                    .extract(times[times.len() - valid], t1)
                    .unwrap_or_else(|_| Path::point(path.eval(t1), t1));
                (false, part)
            }
        }
    }
}
