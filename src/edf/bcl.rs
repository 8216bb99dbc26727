/*! The Bertogna-Cirinei-Lipari (BCL) one-shot schedulability test for
global EDF on `m` processors.

Grounded in `native/src/edf/bcl.cpp`: per task under analysis, bound each
other task's worst-case "carry-in plus full jobs" interference as a
fraction of the analyzed task's deadline, capping each contribution at the
analyzed task's own slack (`1 - density`) before summing.

## Citation

M. Bertogna, M. Cirinei, and G. Lipari, "Improved Schedulability Analysis
of EDF on Multiprocessor Platforms", *Proceedings of the 17th Euromicro
Conference on Real-Time Systems* (ECRTS 2005).
*/

use super::{check_common, PreconditionError};
use crate::task::{Task, TaskSet};

fn max_jobs_contained(t_i: &Task, t_k: &Task) -> u64 {
    if t_i.deadline > t_k.deadline {
        0
    } else {
        1 + (t_k.deadline - t_i.deadline) / t_i.period
    }
}

fn beta(t_i: &Task, t_k: &Task) -> f64 {
    let n = max_jobs_contained(t_i, t_k);
    let full_span = n * t_i.period;
    let tail = if full_span < t_k.deadline {
        t_k.deadline - full_span
    } else {
        0
    };
    let beta_i = (n * t_i.cost) as f64 + (t_i.cost.min(tail)) as f64;
    beta_i / t_k.deadline as f64
}

fn is_task_schedulable(k: usize, ts: &TaskSet, m: usize) -> bool {
    let t_k = &ts[k];
    let lambda_term = 1.0 - t_k.density();
    let mut beta_sum = 0.0;
    let mut small_beta_exists = false;
    for (i, t_i) in ts.iter().enumerate() {
        if i == k {
            continue;
        }
        let beta_i = beta(t_i, t_k);
        beta_sum += beta_i.min(lambda_term);
        small_beta_exists = small_beta_exists || (beta_i > 0.0 && beta_i <= lambda_term);
    }
    let scaled_bound = lambda_term * m as f64;
    beta_sum < scaled_bound || (small_beta_exists && beta_sum == scaled_bound)
}

/// The BCL one-shot test for global EDF schedulability on `m` processors.
pub fn is_schedulable(ts: &TaskSet, m: usize, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, m, true, true).is_err() {
        return false;
    }
    (0..ts.task_count()).all(|k| is_task_schedulable(k, ts, m))
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
    use crate::edf::gfb;

    #[test]
    fn gfb_schedulable_implies_bcl_schedulable() {
        // spec.md §8 property 1 (partial): GFB is a coarser bound than
        // BCL, so whenever GFB accepts a (constrained-deadline,
        // non-suspending) task set, BCL must too.
        let cases: Vec<TaskSet> = vec![
            TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]),
            TaskSet::from_tasks(vec![Task::new(1, 4), Task::new(1, 6), Task::new(1, 12)]),
        ];
        for ts in cases {
            if gfb::is_schedulable(&ts, 2, true) {
                assert!(is_schedulable(&ts, 2, true));
            }
        }
    }
}
