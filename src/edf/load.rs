/*! The LOAD test for global EDF on arbitrary-deadline sporadic task systems.

Grounded in `native/src/edf/load.cpp`: compares the task set's approximate
*load* (the maximum, over a bounded set of test points, of demand over
interval length — see [`TaskSet::approx_load`]) against a closed-form bound
derived from the GFB density bound ([`super::gfb::bound`]) and its ceiling.
Unlike [`super::gfb`] and [`super::bcl`], LOAD does not require constrained
deadlines.

## Citation

T. P. Baker and S. Baruah, "An Analysis of Global EDF Schedulability for
Arbitrary-Deadline Sporadic Task Systems", *Real-Time Systems*, 43(1), 2009
(Corollary 2).
*/

use super::{check_common, PreconditionError};
use crate::task::TaskSet;

/// The default load-approximation epsilon, matching the precision used
/// by the `schedcat` CLI driver for this test.
pub const DEFAULT_EPSILON: f64 = 0.001;

/// Corollary 2's closed-form bound on load, `max(cond1, cond2)` where
/// `mu = m - (m-1)*max_density` and `mu_ceil = ceil(mu)`.
fn load_bound(ts: &TaskSet, m: usize) -> f64 {
    let max_density = ts.max_density();
    let mu = m as f64 - (m as f64 - 1.0) * max_density;
    let mu_ceil = mu.ceil();
    let cond1 = mu - (mu_ceil - 1.0) * max_density;
    let cond2 = (mu_ceil - 1.0) - (mu_ceil - 2.0) * max_density;
    cond1.max(cond2)
}

/// The LOAD test: `true` iff `ts`'s approximate load does not exceed
/// [`load_bound`]. Requires no self-suspending tasks; constrained
/// deadlines are *not* required.
pub fn is_schedulable(ts: &TaskSet, m: usize, epsilon: f64, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, m, false, true).is_err() {
        return false;
    }
    ts.approx_load(epsilon) <= load_bound(ts, m)
}

/// As [`is_schedulable`], but surfaces the precondition violation instead
/// of collapsing it to `false`.
pub fn try_is_schedulable(ts: &TaskSet, m: usize, epsilon: f64) -> Result<bool, PreconditionError> {
    check_common(ts, m, false, true)?;
    Ok(is_schedulable(ts, m, epsilon, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn scenario_s1_load_schedulable() {
        let ts = TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]);
        assert!(is_schedulable(&ts, 2, DEFAULT_EPSILON, true));
    }

    #[test]
    fn rejects_self_suspending_tasks_when_checked() {
        let ts = TaskSet::from_tasks(vec![Task::new(4, 10).with_self_suspension(1)]);
        assert!(!is_schedulable(&ts, 1, DEFAULT_EPSILON, true));
        assert_eq!(
            try_is_schedulable(&ts, 1, DEFAULT_EPSILON),
            Err(PreconditionError::SelfSuspending)
        );
    }

    #[test]
    fn empty_task_set_is_trivially_schedulable() {
        let ts = TaskSet::new();
        assert!(is_schedulable(&ts, 4, DEFAULT_EPSILON, true));
    }
}
