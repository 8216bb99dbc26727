/*! The Goossens-Funk-Baruah (GFB) density bound for global EDF.

Grounded in `native/src/edf/gfb.cpp`: a task set is schedulable under global
EDF on `m` processors if its total density does not exceed
`m - (m - 1) * max_density`. Requires constrained deadlines and excludes
self-suspending tasks. See spec.md §4.3 and scenario S1.

## Citation

J. Goossens, S. Funk, and S. Baruah, "Priority-Driven Scheduling of
Periodic Task Systems on Multiprocessors", *Real-Time Systems*, 25(2-3),
2003.
*/

use super::{check_common, PreconditionError};
use crate::task::TaskSet;

/// The GFB density bound, `m - (m - 1) * max_density`.
pub fn bound(ts: &TaskSet, m: usize) -> f64 {
    m as f64 - (m as f64 - 1.0) * ts.max_density()
}

/// `true` iff `ts`'s total density does not exceed [`bound`].
pub fn is_schedulable(ts: &TaskSet, m: usize, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, m, true, true).is_err() {
        return false;
    }
    ts.density() <= bound(ts, m)
}

/// As [`is_schedulable`], but surfaces the precondition violation instead
/// of collapsing it to `false`.
pub fn try_is_schedulable(ts: &TaskSet, m: usize) -> Result<bool, PreconditionError> {
    check_common(ts, m, true, true)?;
    Ok(is_schedulable(ts, m, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn scenario_s1_gfb_bound() {
        // spec.md S1: two tasks C=4,T=10 and C=3,T=10 on m=2.
        let ts = TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]);
        assert!((bound(&ts, 2) - 1.6).abs() < 1e-9);
        assert!(is_schedulable(&ts, 2, true));
    }

    #[test]
    fn empty_task_set_is_trivially_schedulable() {
        let ts = TaskSet::new();
        assert!(is_schedulable(&ts, 4, true));
    }

    #[test]
    fn rejects_unconstrained_deadlines_when_checked() {
        let ts = TaskSet::from_tasks(vec![Task::new(4, 10).with_deadline(20)]);
        assert!(!is_schedulable(&ts, 1, true));
        assert_eq!(
            try_is_schedulable(&ts, 1),
            Err(PreconditionError::UnconstrainedDeadline)
        );
    }
}
