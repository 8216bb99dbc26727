/*! The Liu-Anderson suspension-aware schedulability test for global EDF.

Grounded in `native/src/edf/la.cpp`: extends [`super::baruah`]'s exact
interval scan to tasks with bounded self-suspension and bounded tardiness.
Each suspending task is tested once per possible suspension length (`0` up
to its `self_suspension` budget); self-suspending tasks compete for
interference budget by the *larger* of their no-carry-in and carry-in
demand (rather than the carry-in remainder alone), since a suspended job
may not have a pending carry-in at all. As in [`super::baruah`], the
original's priority-queue merge of test points is replaced here by
collecting and sorting a `Vec` of the same (bounded) candidate points, and
intermediate sums are carried in `i128`.

## Citation

C. Liu and J. H. Anderson, "Suspension-Aware Analysis for Hard Real-Time
Multiprocessor Scheduling", *Proceedings of the 25th Euromicro Conference
on Real-Time Systems* (ECRTS 2013).
*/

use super::{check_common, PreconditionError};
use crate::task::{Task, TaskSet};
use crate::time::Duration;

fn divide_with_ceil_i128(a: i128, b: i128) -> i128 {
    a / b + ((a % b != 0) as i128)
}

fn work_no_carry(i: usize, l: usize, ts: &TaskSet, ilen: i128, susp: i128) -> i128 {
    let t_i = &ts[i];
    let t_l = &ts[l];
    let tmp = ilen + t_l.deadline as i128;
    let dbf = t_i.dbf(tmp as Duration) as i128;
    if i == l {
        let a = tmp - t_l.deadline as i128;
        let b = (tmp + t_l.tardiness_threshold as i128) - t_l.period as i128;
        (dbf - t_l.cost as i128).min(a.max(b))
    } else {
        let upper = (tmp + t_l.tardiness_threshold as i128) - t_l.cost as i128 - susp + 1;
        dbf.min(upper)
    }
}

/// The carry-in demand bound, δ(*t*) = (⌈t/T⌉−1)·C + min(C, t − (⌈t/T⌉−1)·T).
fn delta(tsk: &Task, t: i128) -> i128 {
    let period = tsk.period as i128;
    let wcet = tsk.cost as i128;
    let q = divide_with_ceil_i128(t, period);
    (q - 1) * wcet + wcet.min(t - (q - 1) * period)
}

fn work_carry_in(i: usize, l: usize, ts: &TaskSet, ilen: i128, susp: i128) -> i128 {
    let t_i = &ts[i];
    let t_l = &ts[l];
    let tmp = ilen + t_l.deadline as i128;
    if i == l {
        let dbf = delta(t_l, tmp + t_l.tardiness_threshold as i128);
        let a = tmp - t_l.deadline as i128;
        let b = (tmp + t_l.tardiness_threshold as i128) - t_l.period as i128;
        (dbf - t_l.cost as i128).min(a.max(b))
    } else {
        let dbf = delta(t_i, tmp + t_i.tardiness_threshold as i128);
        let upper = ((tmp + t_l.tardiness_threshold as i128) - t_l.cost as i128) - susp + 1;
        dbf.min(upper)
    }
}

fn is_task_schedulable_for_interval(
    ts: &TaskSet,
    l: usize,
    suspend: i128,
    ilen: i128,
    m: usize,
) -> bool {
    let t_l = &ts[l];
    let mut sum: i128 = 0;
    let mut idiff: Vec<i128> = Vec::with_capacity(ts.task_count());
    for i in 0..ts.task_count() {
        let i1 = work_no_carry(i, l, ts, ilen, suspend);
        let ic = work_carry_in(i, l, ts, ilen, suspend);
        if ts[i].is_self_suspending() {
            sum += i1.max(ic);
            idiff.push(0);
        } else {
            sum += i1;
            idiff.push(ic - i1);
        }
    }
    idiff.sort_unstable_by(|a, b| b.cmp(a));
    for v in idiff.iter().take(m.saturating_sub(1)) {
        sum += v;
    }
    let bound = m as i128
        * (ilen + t_l.deadline as i128 + t_l.tardiness_threshold as i128
            - t_l.cost as i128
            - suspend);
    sum <= bound
}

fn max_test_point(
    t_l: &Task,
    m: usize,
    m_minus_u: f64,
    test_point_sum: f64,
    usum: f64,
    suspension: i128,
) -> f64 {
    let sum = m as f64 * (t_l.cost as f64 + suspension as f64) - usum * t_l.tardiness_threshold as f64
        + test_point_sum;
    sum / m_minus_u
}

fn test_points_for(ts: &TaskSet, l: usize, upper_bound: f64) -> Vec<i128> {
    if upper_bound < 0.0 {
        return Vec::new();
    }
    let upper_bound = upper_bound.ceil() as i128;
    let d_l = ts[l].deadline as i128;
    let mut points: Vec<i128> = Vec::new();
    for t_i in ts.iter() {
        let mut cur = t_i.deadline as i128 - d_l;
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

/// The Liu-Anderson suspension-aware test for global EDF on `m`
/// processors. Unlike [`super::baruah`], constrained deadlines are not
/// required and self-suspending tasks are not forbidden — this is its
/// entire point.
pub fn is_schedulable(ts: &TaskSet, m: usize, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, m, false, false).is_err() {
        return false;
    }
    if ts.is_empty() {
        return true;
    }
    let usum = ts.utilization();
    let m_minus_u = m as f64 - usum;
    if m_minus_u <= 0.0 {
        return false;
    }

    let test_point_sum: f64 = ts
        .iter()
        .map(|t| t.cost as f64 + t.utilization() * t.tardiness_threshold as f64)
        .sum();

    for l in 0..ts.task_count() {
        let max_susp = ts[l].self_suspension as i128;
        for suspend in 0..=max_susp {
            let bound = max_test_point(&ts[l], m, m_minus_u, test_point_sum, usum, suspend);
            for ilen in test_points_for(ts, l, bound) {
                if !is_task_schedulable_for_interval(ts, l, suspend, ilen, m) {
                    return false;
                }
            }
        }
    }
    true
}

/// As [`is_schedulable`], but surfaces the precondition violation instead
/// of collapsing it to `false`.
pub fn try_is_schedulable(ts: &TaskSet, m: usize) -> Result<bool, PreconditionError> {
    check_common(ts, m, false, false)?;
    Ok(is_schedulable(ts, m, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_suspending_matches_baruah_on_simple_sets() {
        use crate::edf::baruah;
        let cases: Vec<TaskSet> = vec![
            TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]),
            TaskSet::from_tasks(vec![Task::new(1, 4), Task::new(1, 6), Task::new(1, 12)]),
        ];
        for ts in cases {
            assert_eq!(
                baruah::is_schedulable(&ts, 2, true),
                is_schedulable(&ts, 2, true)
            );
        }
    }

    #[test]
    fn handles_self_suspending_task_set() {
        let ts = TaskSet::from_tasks(vec![
            Task::new(4, 10).with_self_suspension(1),
            Task::new(3, 10),
        ]);
        assert!(is_schedulable(&ts, 2, true));
    }

    #[test]
    fn empty_task_set_is_trivially_schedulable() {
        let ts = TaskSet::new();
        assert!(is_schedulable(&ts, 2, true));
    }

    #[test]
    fn zero_slack_is_rejected() {
        let ts = TaskSet::from_tasks(vec![Task::new(5, 10), Task::new(5, 10)]);
        assert!(!is_schedulable(&ts, 1, true));
    }
}
