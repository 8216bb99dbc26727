/*! Baruah's exact-interval schedulability test for global EDF with
constrained deadlines.

Grounded in `native/src/edf/baruah.cpp`: for each task `k`, scan a bounded
set of candidate interval lengths (the points where some other task's
demand-bound function changes value relative to `k`'s deadline) and check
that the combined interfering demand — the smaller of the "no carry-in"
and "carry-in" demand bounds for each other task, plus the `m-1` largest
leftover carry-in contributions — never exceeds what `m` processors can
absorb. The original drives this scan with a merge of per-task priority
queues; this port collects and sorts the (bounded) candidate points into a
plain `Vec` instead, which is equivalent since the set of points tested is
identical — only the iteration order differs, and the sum accumulated is
order-independent. Intermediate sums are carried in `i128` (see
[`super::bcl_iterative`]'s module doc for the same rationale).

## Citation

S. Baruah, "Techniques for Multiprocessor Global Schedulability Analysis",
*Proceedings of the 28th IEEE Real-Time Systems Symposium* (RTSS 2007).
*/

use super::{check_common, PreconditionError};
use crate::task::{Task, TaskSet};
use crate::time::Duration;

fn interval1(i: usize, k: usize, ts: &TaskSet, ilen: i128) -> i128 {
    let t_i = &ts[i];
    let t_k = &ts[k];
    let tmp = ilen + t_k.deadline as i128;
    let dbf = t_i.dbf(tmp as Duration) as i128;
    if i == k {
        (dbf - t_k.cost as i128).min(ilen)
    } else {
        dbf.min(ilen + t_k.deadline as i128 - (t_k.cost as i128 - 1))
    }
}

fn interval2(i: usize, k: usize, ts: &TaskSet, ilen: i128) -> i128 {
    let t_i = &ts[i];
    let t_k = &ts[k];
    let tmp = ilen + t_k.deadline as i128;
    let dbf = t_i.dbf_with_carry_in(tmp as Duration) as i128;
    if i == k {
        (dbf - t_k.cost as i128).min(ilen)
    } else {
        dbf.min(ilen + t_k.deadline as i128 - (t_k.cost as i128 - 1))
    }
}

fn is_task_schedulable(k: usize, ts: &TaskSet, m: usize, ilen: i128) -> bool {
    let t_k = &ts[k];
    let mut sum: i128 = 0;
    let mut idiff: Vec<i128> = Vec::with_capacity(ts.task_count());
    for i in 0..ts.task_count() {
        let i1 = interval1(i, k, ts, ilen);
        let mut id = interval2(i, k, ts, ilen);
        sum += i1;
        id -= i1;
        idiff.push(id);
    }
    idiff.sort_unstable_by(|a, b| b.cmp(a));
    for v in idiff.iter().take(m.saturating_sub(1)) {
        sum += v;
    }
    let bound = m as i128 * (ilen + t_k.deadline as i128 - t_k.cost as i128);
    sum <= bound
}

/// Upper bound on the interval lengths worth testing for task `k`,
/// following `BaruahGedf::get_max_test_points`.
fn max_test_point(ts: &TaskSet, k: usize, m: usize, m_minus_u: f64) -> f64 {
    let mut wcet: Vec<u64> = ts.iter().map(|t| t.cost).collect();
    wcet.sort_unstable_by(|a, b| b.cmp(a));
    let csigma: u64 = wcet.iter().take(m.saturating_sub(1)).sum();

    let tdu_sum: f64 = ts
        .iter()
        .map(|t| (t.period as f64 - t.deadline as f64) * t.utilization())
        .sum();

    let t_k = &ts[k];
    let mc = m as f64 * t_k.cost as f64 + 0.124;
    (csigma as f64 - t_k.deadline as f64 * m_minus_u + tdu_sum + mc) / m_minus_u
}

fn test_points_for(ts: &TaskSet, k: usize, upper_bound: f64) -> Vec<i128> {
    if upper_bound < 0.0 {
        return Vec::new();
    }
    let upper_bound = upper_bound.ceil() as i128;
    let d_k = ts[k].deadline as i128;
    let mut points: Vec<i128> = Vec::new();
    for t_i in ts.iter() {
        let mut cur = t_i.deadline as i128 - d_k;
        while cur < 0 {
            cur += t_i.period as i128;
        }
        while cur <= upper_bound {
            points.push(cur);
            cur += t_i.period as i128;
        }
    }
    points.sort_unstable();
    points.dedup();
    points
}

/// Baruah's exact test for global EDF schedulability on `m` processors.
pub fn is_schedulable(ts: &TaskSet, m: usize, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, m, true, true).is_err() {
        return false;
    }
    if ts.is_empty() {
        return true;
    }
    let m_minus_u = m as f64 - ts.utilization();
    for k in 0..ts.task_count() {
        let bound = max_test_point(ts, k, m, m_minus_u);
        for ilen in test_points_for(ts, k, bound) {
            if !is_task_schedulable(k, ts, m, ilen) {
                return false;
            }
        }
    }
    true
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
    fn gfb_schedulable_implies_baruah_schedulable() {
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

    #[test]
    fn empty_task_set_is_trivially_schedulable() {
        let ts = TaskSet::new();
        assert!(is_schedulable(&ts, 2, true));
    }
}
