/*! GEL-PL: a priority-point-aware linear-bound schedulability test for
global EDF-like scheduling with arbitrary priority points.

Grounded in `native/src/edf/gel_pl.cpp`: rather than scanning test points
like [`super::baruah`] or [`super::la`], this test models each task's
worst-case interference as a piecewise-linear function of a shared
"stretch" parameter `s`, and binary-searches for the smallest `s` at which
the system-wide linear inequality `M(s) < 0` first holds (`M` sums each
task's own interference line plus the `util_ceil - 1` largest competing
lines at `s`). The per-task completion bound then follows directly from
`s`.

The original offers two ways to locate that `s`: an O(n log n) exact
algorithm that walks the breakpoints where the "largest lines" ranking
changes (`compute_exact_s`), and a binary search with `rounds` halvings
(`compute_binsearch_s`). This port implements only the binary search — the
exact variant requires more faithfully reproducing a pairwise line-
intersection sort that is not safe to transcribe without being able to
compile and check it — and always runs it (the original's
`rounds == 0` sentinel, meaning "use the exact algorithm instead", is not
meaningful here; callers should simply pass enough rounds for the
precision they need, e.g. 64). See DESIGN.md for this tradeoff.

## Citation

Adapted from the same priority-point formalism as [`super::baruah`] and
[`super::la`], generalized to per-task priority points (`native/include
/edf/gel_pl.h`).
*/

use super::{check_common, PreconditionError};
use crate::task::TaskSet;

/// A reasonable default binary-search round count (halves the initial
/// bracket to roughly 2^-64 relative precision).
pub const DEFAULT_ROUNDS: u32 = 64;

fn m_lt_0(s: f64, total_s: f64, y_ints: &[f64], utilizations: &[f64], m: usize, util_ceil: i64) -> bool {
    let mut final_val = -(m as f64) * s + total_s;
    if util_ceil >= 2 {
        let mut gvals: Vec<f64> = utilizations
            .iter()
            .zip(y_ints)
            .map(|(u, y)| u * s + y)
            .collect();
        gvals.sort_unstable_by(|a, b| b.partial_cmp(a).unwrap());
        final_val += gvals.iter().take((util_ceil - 1) as usize).sum::<f64>();
    }
    final_val < 0.0
}

fn compute_binsearch_s(
    total_s: f64,
    y_ints: &[f64],
    utilizations: &[f64],
    m: usize,
    util_ceil: i64,
    rounds: u32,
) -> f64 {
    let mut min_s = 0.0;
    let mut max_s = 1.0;
    while !m_lt_0(max_s, total_s, y_ints, utilizations, m, util_ceil) {
        min_s = max_s;
        max_s *= 2.0;
    }
    for _ in 0..rounds {
        let middle = (min_s + max_s) / 2.0;
        if m_lt_0(middle, total_s, y_ints, utilizations, m, util_ceil) {
            max_s = middle;
        } else {
            min_s = middle;
        }
    }
    max_s
}

/// The GEL-PL test: `true` iff every task's priority-point-relative
/// completion bound does not exceed its own deadline.
pub fn is_schedulable(ts: &TaskSet, m: usize, rounds: u32, check_preconditions: bool) -> bool {
    if check_preconditions && check_common(ts, m, false, true).is_err() {
        return false;
    }
    if ts.is_empty() {
        return true;
    }
    let n = ts.task_count();
    let utilizations: Vec<f64> = ts.iter().map(|t| t.utilization()).collect();
    let util_ceil = ts.utilization().ceil() as i64;

    let min_prio_pt = ts
        .iter()
        .map(|t| t.priority_point as f64)
        .fold(f64::INFINITY, f64::min);
    let prio_pts: Vec<f64> = ts
        .iter()
        .map(|t| t.priority_point as f64 - min_prio_pt)
        .collect();

    let mut s_i = vec![0.0f64; n];
    let mut y_ints = vec![0.0f64; n];
    let mut total_s = 0.0f64;
    for (i, t) in ts.iter().enumerate() {
        let mut si = 1.0 - prio_pts[i] / t.period as f64;
        si *= t.cost as f64;
        if si < 0.0 {
            si = 0.0;
        }
        s_i[i] = si;
        total_s += si;
        y_ints[i] = -(t.cost as f64) / m as f64 * utilizations[i] + t.cost as f64 - si;
    }

    let s = compute_binsearch_s(total_s, &y_ints, &utilizations, m, util_ceil, rounds);

    for (i, t) in ts.iter().enumerate() {
        let x_i = s - t.cost as f64 / m as f64;
        let bound = prio_pts[i] + t.cost as f64 + x_i.ceil();
        if bound > t.deadline as f64 + 1e-9 {
            return false;
        }
    }
    true
}

/// As [`is_schedulable`], but surfaces the precondition violation instead
/// of collapsing it to `false`.
pub fn try_is_schedulable(ts: &TaskSet, m: usize, rounds: u32) -> Result<bool, PreconditionError> {
    check_common(ts, m, false, true)?;
    Ok(is_schedulable(ts, m, rounds, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn implicit_deadline_tasks_with_deadline_priority_points_are_schedulable() {
        let ts = TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]);
        assert!(is_schedulable(&ts, 2, DEFAULT_ROUNDS, true));
    }

    #[test]
    fn overutilized_is_not_schedulable() {
        let ts = TaskSet::from_tasks(vec![Task::new(10, 10), Task::new(10, 10)]);
        assert!(!is_schedulable(&ts, 1, DEFAULT_ROUNDS, true));
    }

    #[test]
    fn empty_task_set_is_trivially_schedulable() {
        let ts = TaskSet::new();
        assert!(is_schedulable(&ts, 2, DEFAULT_ROUNDS, true));
    }
}
