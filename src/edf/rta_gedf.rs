/*! Global-EDF response-time analysis (RTA-GEDF).

Grounded in `native/src/edf/rta.cpp`: an iterative fixed point per task
(analogous to [`crate::fixed_point`], specialized to the Bertogna-style
multiprocessor interference bound), refined across outer rounds by each
task's own converged response time feeding back as a tighter "slack" bound
on everyone else's interference — the same two-level iteration idea as
[`super::bcl_iterative`], but converging on an actual response time rather
than a schedulable/not-schedulable verdict.

## Citation

M. Bertogna and S. Baruah, "Tests for Global EDF Schedulability Analysis",
*Journal of Systems Architecture*, 57(5), 2011 (the RTA refinement of the
BCL family of bounds).
*/

use super::{check_common, PreconditionError};
use crate::task::{Task, TaskSet};
use crate::time::Duration;

fn rta_interfering_workload(t_i: &Task, response_time: Duration, slack_i: Duration) -> u128 {
    let interval = (response_time + t_i.deadline)
        .saturating_sub(t_i.cost)
        .saturating_sub(slack_i);
    let njobs = interval / t_i.period;
    let rem = interval % t_i.period;
    let extra = rem.min(t_i.cost);
    njobs as u128 * t_i.cost as u128 + extra as u128
}

fn edf_interfering_workload(t_i: &Task, t_k: &Task, slack_i: Duration) -> u128 {
    let njobs = t_k.deadline / t_i.period;
    let mut inf = njobs as u128 * t_i.cost as u128;
    let tmp = t_k.deadline % t_i.period;
    if tmp > slack_i {
        inf += (t_i.cost.min(tmp - slack_i)) as u128;
    }
    inf
}

/// One response-time re-estimate for task `k`, assuming the current
/// `response` guess and the other tasks' current `slack` values. Returns
/// `None` if the estimate would exceed what fits in a `u64` (treated as
/// certain non-convergence by the caller).
fn response_estimate(
    k: usize,
    ts: &TaskSet,
    slack: &[Duration],
    m: usize,
    response: Duration,
) -> Option<Duration> {
    let t_k = &ts[k];
    let inf_bound = (response.saturating_sub(t_k.cost) + 1) as u128;
    let mut other_work: u128 = 0;
    for (i, t_i) in ts.iter().enumerate() {
        if i == k {
            continue;
        }
        let inf_edf = edf_interfering_workload(t_i, t_k, slack[i]);
        let inf_rta = rta_interfering_workload(t_i, response, slack[i]);
        other_work += inf_edf.min(inf_rta).min(inf_bound);
    }
    let other_work = other_work / m as u128;
    let new_response = other_work + t_k.cost as u128;
    if new_response > u64::MAX as u128 {
        None
    } else {
        Some(new_response as u64)
    }
}

/// Iterate [`response_estimate`] for task `k` to a fixed point, bailing
/// out once the estimate exceeds the task's deadline (treated as
/// non-convergence, per spec.md §7 `NonConvergence`).
fn rta_fixpoint(k: usize, ts: &TaskSet, slack: &[Duration], m: usize) -> Option<Duration> {
    let t_k = &ts[k];
    let mut last = t_k.cost;
    let mut response = response_estimate(k, ts, slack, m, last)?;
    while response != last && response <= t_k.deadline {
        last = response;
        response = response_estimate(k, ts, slack, m, last)?;
    }
    if response <= t_k.deadline {
        Some(response)
    } else {
        None
    }
}

/// The iterative global-EDF response-time test. `max_rounds = 0` means
/// "iterate the outer slack-refinement loop to a fixed point"; a positive
/// value caps it (the original defaults to 25 rounds).
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
            match rta_fixpoint(k, ts, &slack, m) {
                Some(response) => {
                    let new_slack = ts[k].deadline.saturating_sub(response);
                    if new_slack != slack[k] {
                        slack[k] = new_slack;
                        updated = true;
                    }
                }
                None => schedulable = false,
            }
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
    fn bcl_schedulable_implies_rta_schedulable() {
        let cases: Vec<TaskSet> = vec![
            TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]),
            TaskSet::from_tasks(vec![Task::new(1, 4), Task::new(1, 6), Task::new(1, 12)]),
        ];
        for ts in cases {
            if bcl::is_schedulable(&ts, 2, true) {
                assert!(is_schedulable(&ts, 2, 25, true));
            }
        }
    }

    #[test]
    fn single_task_response_time_equals_cost() {
        let ts = TaskSet::from_tasks(vec![Task::new(5, 10)]);
        assert!(is_schedulable(&ts, 1, 25, true));
    }
}
