/*! The slack-refinement iterative variant of the BCL test for global EDF.

Grounded in `native/src/edf/bcl_iterative.cpp`: rather than the one-shot
[`super::bcl`] bound, each task's own "slack" (deadline minus its own
response-time estimate) is fed back as a tighter interference bound for
everyone else, and rounds repeat until no task's slack improves, or the
round cap is hit. Intermediate products are computed in `u128` because a
job count (`u64`) times a cost (`u64`) can exceed 64 bits on large
instances, and the result must survive a further multiply-by-period
comparison (spec.md §4.1, "unsigned arithmetic ... whenever the
intermediate result may exceed 64 bits").

## Citation

M. Bertogna, M. Cirinei, and G. Lipari, "Improved Schedulability Analysis
of EDF on Multiprocessor Platforms", ECRTS 2005 (the iterative refinement
of the same bound as [`super::bcl`]).
*/

use super::{check_common, PreconditionError};
use crate::task::{Task, TaskSet};
use crate::time::Duration;

fn interfering_workload(t_i: &Task, t_k: &Task, slack_i: Duration) -> u128 {
    let njobs = t_k.deadline / t_i.period;
    let mut inf = njobs as u128 * t_i.cost as u128;
    let tmp = slack_i + njobs * t_i.period;
    if t_k.deadline >= tmp {
        inf += (t_i.cost.min(t_k.deadline - tmp)) as u128;
    }
    inf
}

/// One slack-refinement round for task `k`. Returns `(updated, has_slack)`:
/// `updated` is true iff `slack[k]` improved, `has_slack` is true iff task
/// `k` is (still) deemed schedulable this round.
fn slack_update(k: usize, ts: &TaskSet, m: usize, slack: &mut [Duration]) -> (bool, bool) {
    let t_k = &ts[k];
    let inf_bound = (t_k.deadline.saturating_sub(t_k.cost) + 1) as u128;
    let mut other_work: u128 = 0;
    for (i, t_i) in ts.iter().enumerate() {
        if i == k {
            continue;
        }
        other_work += interfering_workload(t_i, t_k, slack[i]).min(inf_bound);
    }
    other_work /= m as u128;
    let committed = other_work + t_k.cost as u128;

    if committed > t_k.deadline as u128 {
        (false, false)
    } else {
        let new_slack = t_k.deadline - committed as u64;
        if new_slack > slack[k] {
            slack[k] = new_slack;
            (true, true)
        } else {
            (false, true)
        }
    }
}

/// The iterative BCL test. `max_rounds = 0` means "iterate to a fixed
/// point" (the original defaults `max_rounds` to 0, i.e. unbounded, unlike
/// [`super::rta_gedf::is_schedulable`]'s 25-round default).
pub fn is_schedulable(ts: &TaskSet, m: usize, max_rounds: u32, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, m, true, true).is_err() {
        return false;
    }
    if ts.is_empty() {
        return true;
    }
    let n = ts.task_count();
    let mut slack = vec![0u64; n];
    let mut round = 0u32;
    let mut schedulable = false;
    let mut updated = true;
    while updated && !schedulable && (max_rounds == 0 || round < max_rounds) {
        round += 1;
        schedulable = true;
        updated = false;
        for k in 0..n {
            let (changed, ok) = slack_update(k, ts, m, &mut slack);
            updated = updated || changed;
            schedulable = schedulable && ok;
        }
    }
    schedulable
}

/// As [`is_schedulable`], but surfaces the precondition violation instead
/// of collapsing it to `false`.
pub fn try_is_schedulable(ts: &TaskSet, m: usize, max_rounds: u32) -> Result<bool, PreconditionError> {
    check_common(ts, m, true, true)?;
    Ok(is_schedulable(ts, m, max_rounds, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edf::bcl;

    #[test]
    fn bcl_schedulable_implies_iterative_bcl_schedulable() {
        // the iterative refinement can only improve on the one-shot bound.
        let cases: Vec<TaskSet> = vec![
            TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]),
            TaskSet::from_tasks(vec![Task::new(1, 4), Task::new(1, 6), Task::new(1, 12)]),
        ];
        for ts in cases {
            if bcl::is_schedulable(&ts, 2, true) {
                assert!(is_schedulable(&ts, 2, 0, true));
            }
        }
    }

    #[test]
    fn empty_task_set_is_schedulable() {
        let ts = TaskSet::new();
        assert!(is_schedulable(&ts, 4, 10, true));
    }
}
