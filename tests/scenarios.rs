//! End-to-end scenarios exercising one public entry point per analysis
//! family against a hand-computed expected result, rather than each
//! family's own unit tests in isolation.

use rt_blocking_analysis::edf::{baker, gfb};
use rt_blocking_analysis::lp::model::LinearProgram;
use rt_blocking_analysis::lp::solver::{SolveError, Solution, Solver};
use rt_blocking_analysis::lp_blocking::{nested_fifo, pedf};
use rt_blocking_analysis::nested_cs::{CriticalSectionsOfTaskset, NO_PARENT};
use rt_blocking_analysis::resource::ResourceSharingInfo;
use rt_blocking_analysis::task::{Task, TaskSet};

/// A tiny exhaustive 0/1 solver, mirroring the library's own
/// `#[cfg(test)]`-gated brute-force solver (not part of the public API,
/// so an external integration test needs its own copy). Adequate only
/// for the small LPs these scenarios build.
struct BruteForceSolver {
    num_vars: u32,
}

struct MapSolution {
    values: Vec<f64>,
}

impl Solution for MapSolution {
    fn value_of(&self, variable: u32) -> f64 {
        self.values.get(variable as usize).copied().unwrap_or(0.0)
    }
}

impl Solver for BruteForceSolver {
    fn solve(&self, lp: &LinearProgram) -> Result<Box<dyn Solution>, SolveError> {
        let n = self.num_vars as usize;
        assert!(n <= 20, "brute force solver is exponential, keep test LPs tiny");

        let satisfies = |values: &[f64]| -> bool {
            let eval = |expr: &rt_blocking_analysis::lp::model::LinearExpression| -> f64 {
                expr.terms().iter().map(|&(c, v)| c * values[v as usize]).sum()
            };
            lp.inequalities().iter().all(|c| eval(&c.expression) <= c.bound + 1e-9) && lp.equalities().iter().all(|c| (eval(&c.expression) - c.bound).abs() < 1e-9)
        };

        let mut best: Option<(f64, Vec<f64>)> = None;
        for mask in 0..(1u64 << n) {
            let values: Vec<f64> = (0..n).map(|i| if mask & (1 << i) != 0 { 1.0 } else { 0.0 }).collect();
            if !satisfies(&values) {
                continue;
            }
            let objective: f64 = lp.objective().terms().iter().map(|&(c, v)| c * values[v as usize]).sum();
            if best.as_ref().map_or(true, |(best_obj, _)| objective > *best_obj) {
                best = Some((objective, values));
            }
        }

        best.map(|(_, values)| -> Box<dyn Solution> { Box::new(MapSolution { values }) }).ok_or(SolveError::Infeasible)
    }
}

/// S1: two tasks, C=4/T=10 and C=3/T=10, on m=2. Density 0.7, GFB bound
/// 2 - (2-1)*0.4 = 1.6, so 0.7 <= 1.6 is schedulable.
#[test]
fn s1_gfb_bound_schedulable() {
    let ts = TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]);
    assert_eq!(gfb::bound(&ts, 2), 1.6);
    assert!(gfb::is_schedulable(&ts, 2, true));
}

/// S2: three tasks {(49,100), (49,100), (2,100,50)} on m=2. Both Baker
/// and GFB find this schedulable (density 1.04 <= GFB's bound 1.6).
#[test]
fn s2_baker_and_gfb_agree_on_schedulable() {
    let ts = TaskSet::from_tasks(vec![Task::new(49, 100), Task::new(49, 100), Task::new(2, 100).with_deadline(50)]);

    assert!(baker::is_schedulable(&ts, 2, true));
    assert!(gfb::is_schedulable(&ts, 2, true));
}

/// S3: two local tasks on different clusters, each issuing one
/// 3-time-unit request to resource 0, m=2 (one processor per
/// cluster). Expected per-task blocking = 3, the one remote blocker at
/// the head of its cluster's FIFO queue.
#[test]
fn s3_partitioned_omlp_single_remote_blocker() {
    use rt_blocking_analysis::blocking::partitioned_omlp;

    let mut info = ResourceSharingInfo::with_capacity(2);
    info.add_task(100, 10, 0, 0, 5, 0);
    info.add_request(0, 1, 3);
    info.add_task(100, 10, 1, 1, 5, 0);
    info.add_request(0, 1, 3);

    let bounds = partitioned_omlp::bounds(&info);
    assert_eq!(bounds.blocking_term(0), 3);
    assert_eq!(bounds.blocking_term(1), 3);
}

/// S4: two resources, two tasks per cluster. Task 0 (cluster 0, the
/// highest priority task in the system) requests resource 0 for 4 time
/// units; its only remote contender on that resource is task 2
/// (cluster 1), whose own gcs response time is its own request length
/// (2) plus the longest request of any of its equal/higher-ceiling
/// local preemptors (none here, since its one local peer, task 3, only
/// touches resource 1 whose ceiling in cluster 1 exceeds task 2's).
/// So the remote blocking MPCP computes for task 0 is exactly task 2's
/// hand-computed gcs response time, 2, plus its own arrival blocking
/// from task 1 (length 1, under virtual spinning), for a total of 3.
#[test]
fn s4_mpcp_gcs_response_time_matches_hand_computation() {
    use rt_blocking_analysis::blocking::mpcp;

    let mut info = ResourceSharingInfo::with_capacity(4);
    info.add_task(100, 10, 0, 0, 10, 0); // task 0: cluster 0, prio 0 (highest)
    info.add_request(0, 1, 4);
    info.add_task(100, 10, 0, 1, 10, 0); // task 1: cluster 0, prio 1
    info.add_request(1, 1, 1);
    info.add_task(100, 10, 1, 2, 10, 0); // task 2: cluster 1, prio 2
    info.add_request(0, 1, 2);
    info.add_task(100, 10, 1, 3, 10, 0); // task 3: cluster 1, prio 3 (lowest)
    info.add_request(1, 1, 1);

    let bounds = mpcp::bounds(&info, true);
    assert_eq!(bounds.blocking_term(0), 3);
}

/// S5: a cluster at 0.95 utilization sharing a single global resource
/// of length 2. The arrival-curve loop must converge (not diverge past
/// the hyperperiod) and the task set must be found schedulable. This
/// crate's `Solver` boundary has no concept of a "coarse
/// integer-relaxation" mode to toggle (no concrete solver backend ships
/// with the library at all, per DESIGN.md), so the second half of the
/// original scenario is adapted to a determinism check: calling the
/// test twice against the same brute-force solver must agree.
#[test]
fn s5_pedf_msrp_qpa_converges_at_high_utilization() {
    let mut info = ResourceSharingInfo::with_capacity(2);
    info.add_task(100, 10, 0, 0, 47, 0);
    info.add_request(0, 1, 2);
    info.add_task(100, 10, 0, 1, 48, 0);
    info.add_request(0, 1, 2);

    let solver = BruteForceSolver { num_vars: 20 };
    let hyperperiod = 300;

    let first = pedf::is_schedulable(&info, &solver, hyperperiod);
    let second = pedf::is_schedulable(&info, &solver, hyperperiod);
    assert_eq!(first, second);
    assert!(first);
}

/// S6: one blocker with an outer lock q (length 2) and inner lock r
/// (length 3); the analyzed task only requests r. The nested-FIFO LP
/// must charge the whole chain, L_q + L_r = 5, not just the inner
/// section's own length.
#[test]
fn s6_nested_fifo_charges_whole_chain() {
    let mut info = ResourceSharingInfo::with_capacity(2);
    info.add_task(100, 10, 0, 0, 5, 0);
    info.add_request(1, 1, 0); // analyzed task requests only r (resource 1)
    info.add_task(100, 10, 0, 1, 5, 0);
    info.add_request(0, 1, 0);
    info.add_request(1, 1, 0);

    let mut nested = CriticalSectionsOfTaskset::new();
    nested.new_task();
    {
        let blocker = nested.new_task();
        let q = blocker.add(0, 2, NO_PARENT);
        blocker.add(1, 3, q as i32);
    }

    let solver = BruteForceSolver { num_vars: 20 };
    let bounds = nested_fifo::bounds(&info, &nested, &solver, false);
    assert_eq!(bounds.blocking_term(0), 5);
}

/// Universal invariant: merged-LP and per-task-LP solve paths must
/// agree on every task's blocking bound (spec.md §9's "pins both
/// outputs" instruction), checked here across a protocol not already
/// covered by that invariant's own per-module regression test.
#[test]
fn merged_and_per_task_lp_paths_agree_for_nested_fifo() {
    let mut info = ResourceSharingInfo::with_capacity(2);
    info.add_task(100, 10, 0, 0, 5, 0);
    info.add_request(1, 1, 0);
    info.add_task(100, 10, 0, 1, 5, 0);
    info.add_request(0, 1, 0);
    info.add_request(1, 1, 0);

    let mut nested = CriticalSectionsOfTaskset::new();
    nested.new_task();
    {
        let blocker = nested.new_task();
        let q = blocker.add(0, 2, NO_PARENT);
        blocker.add(1, 3, q as i32);
    }

    let solver = BruteForceSolver { num_vars: 20 };
    let per_task = nested_fifo::bounds(&info, &nested, &solver, false);
    let merged = nested_fifo::bounds(&info, &nested, &solver, true);
    for i in 0..info.tasks().len() {
        assert_eq!(per_task.blocking_term(i), merged.blocking_term(i));
    }
}

/// Boundary behavior: a task accessing no shared resource is never
/// blocked, regardless of which blocking analysis is asked.
#[test]
fn task_with_no_requests_is_never_blocked() {
    use rt_blocking_analysis::blocking::partitioned_omlp;

    let mut info = ResourceSharingInfo::with_capacity(2);
    info.add_task(100, 10, 0, 0, 5, 0);
    info.add_task(100, 10, 1, 1, 5, 0);
    info.add_request(0, 1, 3);

    let bounds = partitioned_omlp::bounds(&info);
    assert_eq!(bounds.blocking_term(0), 0);
}
