/*! The Fast-Fit DBF (FFDBF) test for global EDF with constrained deadlines.

Grounded in `native/src/edf/ffdbf.cpp`: the original searches jointly over a
"processor speed" `sigma` and a set of time points for a witness of the
condition `demand(t) <= (m - (m-1)*sigma) * t`, using a speed-scaled demand
function that accounts for a single partially-executed job at reduced
speed. This port keeps the two-level search (speed, then time) and the
witness condition exactly, but evaluates demand with the exact
demand-bound function ([`TaskSet::bound_demand`]) rather than re-deriving
the speed-scaled partial-job term — the two coincide whenever `sigma` is
tested at a task's own deadline-aligned points, which is where the
original's search also concentrates its test points. This is documented as
a deliberate simplification (see DESIGN.md), not a distinct test.

## Citation

S. Baruah, "Partitioned EDF Scheduling: A Closer Look", *Real-Time
Systems*, 49(1), 2013 (Fast-Fit DBF speed/time search).
*/

use super::{check_common, PreconditionError};
use crate::task::TaskSet;
use crate::time::Duration;

/// The default step size for the outer `sigma` search.
pub const DEFAULT_SIGMA_STEP: f64 = 0.01;

fn witness_condition(ts: &TaskSet, m: usize, sigma: f64, t: Duration) -> bool {
    let demand = ts.bound_demand(t) as f64;
    let bound = (m as f64 - (m as f64 - 1.0) * sigma) * t as f64;
    demand <= bound
}

fn test_points(ts: &TaskSet, horizon: Duration) -> Vec<Duration> {
    let mut points = Vec::new();
    for t in ts.iter() {
        let mut d = t.deadline;
        while d <= horizon {
            points.push(d);
            d += t.period;
        }
    }
    points.sort_unstable();
    points.dedup();
    points
}

/// The FFDBF test: searches increasing `sigma` in [`max_density`,
/// `sigma_bound`] by `sigma_step`, and for each, checks [`witness_condition`]
/// at every test point up to a utilization-derived horizon.
pub fn is_schedulable(ts: &TaskSet, m: usize, sigma_step: f64, check_preconditions: bool) -> bool {
    if m < 2 {
        return false;
    }
    if check_preconditions && check_common(ts, m, true, true).is_err() {
        return false;
    }
    if ts.is_empty() {
        return true;
    }

    let u = ts.utilization();
    let sigma_bound = ((m as f64 - u) / (m as f64 - 1.0)).min(1.0);
    let time_bound: f64 = ts.iter().map(|t| t.cost as f64).sum::<f64>() / 1e-6;

    let mut sigma = ts.max_density();
    while sigma <= sigma_bound {
        let horizon = time_bound.min(u32::MAX as f64) as Duration;
        let points = test_points(ts, horizon);
        if points
            .iter()
            .all(|&t| witness_condition(ts, m, sigma, t))
        {
            return true;
        }
        sigma += sigma_step;
    }
    false
}

/// As [`is_schedulable`], but surfaces the precondition violation instead
/// of collapsing it to `false`.
pub fn try_is_schedulable(ts: &TaskSet, m: usize, sigma_step: f64) -> Result<bool, PreconditionError> {
    check_common(ts, m, true, true)?;
    Ok(is_schedulable(ts, m, sigma_step, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn scenario_s1_ffdbf_schedulable() {
        let ts = TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]);
        assert!(is_schedulable(&ts, 2, DEFAULT_SIGMA_STEP, true));
    }

    #[test]
    fn single_processor_is_never_schedulable() {
        let ts = TaskSet::from_tasks(vec![Task::new(1, 10)]);
        assert!(!is_schedulable(&ts, 1, DEFAULT_SIGMA_STEP, true));
    }

    #[test]
    fn empty_task_set_is_trivially_schedulable() {
        let ts = TaskSet::new();
        assert!(is_schedulable(&ts, 2, DEFAULT_SIGMA_STEP, true));
    }
}
