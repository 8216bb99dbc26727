/*! The Quick convergence Processor-demand Analysis (QPA) test.

Grounded in `native/src/edf/qpa.cpp`: an exact EDF schedulability test that
converges on the tightest interval at which processor demand is checked,
rather than scanning every deadline-aligned test point up to a busy-period
bound. The core fixed point — [`is_schedulable_with_demand`] — is kept
generic over the demand function so it can drive both this module's plain
uniprocessor test and, per spec.md §4.5/§4.6, PEDF's availability/demand
convergence loop (which adds a per-resource blocking term on top of the
ordinary demand-bound function before calling back into the same
iteration).

## Citation

F. Zhang and A. Burns, "Schedulability Analysis for Real-Time Systems with
EDF Scheduling", *IEEE Transactions on Computers*, 58(9), 2009 (the
exact test and the Zhang-Burns busy-interval bound used to cap the search).
*/

use super::{check_common, PreconditionError};
use crate::task::TaskSet;
use crate::time::Duration;

fn divide_with_ceil(a: Duration, b: Duration) -> u64 {
    a / b + (a % b != 0) as u64
}

/// The EDF busy-period fixed point: the smallest `L` such that the
/// aggregate demand of jobs released in `[0, L)` equals `L`.
pub fn edf_busy_interval(ts: &TaskSet) -> Duration {
    let mut interval: u64 = ts.iter().map(|t| t.cost).sum();
    let mut total_cost = interval;
    loop {
        interval = total_cost;
        total_cost = 0;
        for t in ts.iter() {
            let jobs = divide_with_ceil(interval, t.period);
            total_cost += jobs * t.cost;
        }
        if interval == total_cost {
            break;
        }
    }
    interval
}

/// The Zhang-Burns upper bound on the testing interval, valid whenever
/// utilization is strictly below 1.
fn zhang_burns_interval(ts: &TaskSet) -> Duration {
    let mut interval: i64 = 0;
    let mut total_scaled_delta = 0.0f64;
    let total_util = ts.utilization();
    for t in ts.iter() {
        let delta = t.deadline as i64 - t.period as i64;
        interval = interval.max(delta);
        total_scaled_delta += (t.period as f64 - t.deadline as f64) * t.utilization();
    }
    total_scaled_delta /= 1.0 - total_util;
    interval = interval.max(total_scaled_delta.ceil() as i64);
    interval.max(0) as Duration
}

/// The smaller of [`edf_busy_interval`] and, if utilization is below 1,
/// the Zhang-Burns bound.
pub fn max_test_interval(ts: &TaskSet, util: f64) -> Duration {
    let max_interval = edf_busy_interval(ts);
    if util < 1.0 {
        max_interval.min(zhang_burns_interval(ts))
    } else {
        max_interval
    }
}

fn max_deadline(task: &crate::task::Task, max_time: Duration) -> Duration {
    let dl = (max_time - task.deadline) / task.period;
    dl * task.period + task.deadline
}

/// The largest deadline-aligned test point not exceeding `max_time`.
pub fn largest_testpoint(ts: &TaskSet, max_time: Duration) -> Duration {
    let mut point = 0;
    for t in ts.iter() {
        if t.deadline < max_time {
            let mut max_dl = max_deadline(t, max_time);
            if max_dl == max_time {
                max_dl -= t.period;
            }
            if max_dl > point {
                point = max_dl;
            }
        }
    }
    point
}

/// The smallest relative deadline among `ts`'s tasks, or `Duration::MAX`
/// if `ts` is empty.
pub fn min_relative_deadline(ts: &TaskSet) -> Duration {
    ts.iter().map(|t| t.deadline).min().unwrap_or(Duration::MAX)
}

/// The generic QPA fixed point: repeatedly jump to the next candidate
/// interval (either the demand itself, if it undershoots the current
/// interval, or the next deadline-aligned test point otherwise) until
/// demand exceeds the interval or drops to the minimum relative deadline.
/// `demand_fn` computes the processor demand accrued over `[0, t)`, and
/// may include contributions beyond plain task costs (e.g. blocking).
pub fn is_schedulable_with_demand<F>(
    min_interval: Duration,
    max_interval: Duration,
    mut demand_fn: F,
) -> bool
where
    F: FnMut(Duration) -> Duration,
{
    let mut next = max_interval;
    let mut demand;
    let mut interval;
    loop {
        interval = next;
        demand = demand_fn(interval);
        if demand < interval {
            next = demand;
        } else {
            next = interval;
        }
        if !(demand <= interval && demand > min_interval) {
            break;
        }
    }
    demand <= min_interval
}

/// The plain uniprocessor QPA test.
pub fn is_schedulable(ts: &TaskSet, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, 1, false, true).is_err() {
        return false;
    }
    if ts.is_empty() {
        return true;
    }
    let util = ts.utilization();
    if util > 1.0 {
        return false;
    }
    let min_interval = min_relative_deadline(ts);
    let max_interval = max_test_interval(ts, util);
    let first_point = largest_testpoint(ts, max_interval);
    is_schedulable_with_demand(min_interval, first_point, |t| ts.bound_demand(t))
}

/// As [`is_schedulable`], but surfaces the precondition violation instead
/// of collapsing it to `false`.
pub fn try_is_schedulable(ts: &TaskSet) -> Result<bool, PreconditionError> {
    check_common(ts, 1, false, true)?;
    Ok(is_schedulable(ts, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn fully_utilized_single_task_is_schedulable() {
        let ts = TaskSet::from_tasks(vec![Task::new(10, 10)]);
        assert!(is_schedulable(&ts, true));
    }

    #[test]
    fn overutilized_is_not_schedulable() {
        let ts = TaskSet::from_tasks(vec![Task::new(6, 10), Task::new(6, 10)]);
        assert!(!is_schedulable(&ts, true));
    }

    #[test]
    fn empty_task_set_is_trivially_schedulable() {
        let ts = TaskSet::new();
        assert!(is_schedulable(&ts, true));
    }
}
