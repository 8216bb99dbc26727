/*! Baker's sufficient schedulability test for global EDF on `m` processors.

Grounded in `native/src/edf/baker.cpp`: for each task under analysis, bound
the interference every other task can exert within its relative deadline,
and check that the total (shared across `m` processors) does not exceed
what's available. Unlike [`super::gfb`] and [`super::bcl`], this test does
not require constrained deadlines.

## Citation

T. P. Baker, "Multiprocessor EDF and Deadline Monotonic Schedulability
Analysis", *Proceedings of the 24th IEEE Real-Time Systems Symposium*
(RTSS 2003).
*/

use super::{check_common, PreconditionError};
use crate::task::{Task, TaskSet};

fn beta(t_i: &Task, t_k: &Task, lambda_k: f64) -> f64 {
    let u_i = t_i.utilization();
    let mut beta_i = (t_i.period as f64 - t_i.deadline as f64) / t_k.deadline as f64;
    beta_i += 1.0;
    beta_i *= u_i;
    if lambda_k < u_i {
        let mut extra = t_i.cost as f64 - lambda_k * t_i.period as f64;
        extra /= t_k.deadline as f64;
        beta_i += extra;
    }
    beta_i
}

fn is_task_schedulable(k: usize, ts: &TaskSet, m: usize) -> bool {
    let t_k = &ts[k];
    let lambda = t_k.density();
    let bound = m as f64 * (1.0 - lambda) + lambda;
    let mut beta_sum = 0.0;
    for t_i in ts.iter() {
        if beta_sum > bound {
            break;
        }
        beta_sum += beta(t_i, t_k, lambda).min(1.0);
    }
    beta_sum <= bound
}

/// Baker's sufficient test for global EDF schedulability on `m` processors.
pub fn is_schedulable(ts: &TaskSet, m: usize, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, m, false, true).is_err() {
        return false;
    }
    (0..ts.task_count()).all(|k| is_task_schedulable(k, ts, m))
}

/// As [`is_schedulable`], but surfaces the precondition violation instead
/// of collapsing it to `false`.
pub fn try_is_schedulable(ts: &TaskSet, m: usize) -> Result<bool, PreconditionError> {
    check_common(ts, m, false, true)?;
    Ok(is_schedulable(ts, m, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s2_baker_schedulable() {
        // spec.md S2: {(49,100), (49,100), (2,100,50)} on m=2; Baker says
        // schedulable (the point of the scenario is that the later,
        // tighter tests also agree it's schedulable for this instance,
        // i.e. Baker is not producing a false negative here).
        let mut ts = TaskSet::new();
        ts.add_task(Task::new(49, 100));
        ts.add_task(Task::new(49, 100));
        ts.add_task(Task::new(2, 100).with_deadline(50));
        assert!(is_schedulable(&ts, 2, true));
    }

    #[test]
    fn single_task_at_full_utilization_is_schedulable() {
        let ts = TaskSet::from_tasks(vec![Task::new(10, 10)]);
        assert!(is_schedulable(&ts, 1, true));
    }
}
