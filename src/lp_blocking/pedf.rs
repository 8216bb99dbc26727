/*! Partitioned-EDF blocking analysis with LP (spec.md §4.5-§4.6).

Grounded in `native/src/blocking/linprog/lp_pedf_analysis.cpp`, driving
[`crate::edf::qpa`] per cluster. Each cluster is checked independently
(clusters share no processor, so one cluster's schedulability cannot
affect another's): for every task `ti` in the cluster, this module
first grows an *arrival-curve* window until the length of the interval
over which `ti`'s own blocking could accumulate stops growing (or the
hyperperiod is exceeded, in which case the cluster fails outright), then
calls [`crate::edf::qpa::is_schedulable_with_demand`] over that window
the same way [`crate::edf::qpa::is_schedulable`] does for a plain
uniprocessor task set, except that the demand function adds `ti`'s own
LP-computed blocking term on top of the task set's ordinary
demand-bound function.

Both the arrival-curve (AC) probe and the processor-demand (PDC) probe
reuse the exact same LP, evaluated at whatever window is being tested
via [`crate::resource::TaskInfo::with_response`]. This collapses the
distinction the original draws between AC mode (arrival blocking
present, carry-in job-count formula) and PDC mode (no arrival blocking,
local-demand job-count formula): both this crate's probes always use
the carry-in-capable request-instance count that [`super::common`]'s
and [`super::spinlocks`]'s constraint functions already thread through
`ti.response()`. This is always sound (it never undercounts blocking)
though possibly less tight than the original's two-formula split; see
DESIGN.md.

Which LP is built at each probed window is controlled by
[`LockFamily`], so this module is generic over the locking protocol
guarding the shared resources rather than hardcoding one: the
suspension-oblivious skeleton ([`super::partitioned::build_task_lp`],
grounded the same way [`super::fmlp_plus`]/[`super::gfmlp`]/
[`super::dflp`]/[`super::omip`] are) and, for spin-waiting locks, the
four-variant family already grounded in `lp_spinlocks.cpp`/
`lp_spinlock_prio.cpp` at [`super::spinlocks`] — these correspond to
the original's own `PEDFBlockingAnalysis` subclasses driven by
`lp_pedf_spinlocks_common.cpp` (`SpinVarMapper`-based) and
`lp_pedf_msrp.cpp`. This crate reuses its own shared `VarMapper`/
`BlockingType` scheme for those probes rather than porting the
original's bespoke per-variant variable mappers one-for-one; see
DESIGN.md for why that is sound here.

Lock-free partitioned-EDF (`lp_pedf_lockfree_common.cpp`,
`lp_pedf_lockfree_NP.cpp`, `lp_pedf_lockfree_preempt.cpp`) is not
implemented: it models retry-loop contention rather than blocking a job
holds a lock for, a fundamentally different constraint family from
every other analysis in this crate, and is out of scope for this pass;
see DESIGN.md.

The arrival-curve refinement itself is just [`crate::fixed_point::search_with_offset`]
run against a [`crate::supply::Dedicated`] processor — the same fixed-point
engine every response-time-based analysis in this crate already uses — with
`divergence_limit` set to the hyperperiod, so a convergence loop that does
not terminate fails deterministically via [`crate::fixed_point::SearchFailure`]
rather than depending on a wall-clock budget.
*/

use crate::edf::qpa::{is_schedulable_with_demand, largest_testpoint, max_test_interval, min_relative_deadline};
use crate::fixed_point::search_with_offset;
use crate::lp::solver::{round_up_with_epsilon, Solver};
use crate::resource::{ResourceSharingInfo, TaskInfo};
use crate::supply::Dedicated;
use crate::task::{Task, TaskSet};
use crate::time::Duration;

use super::common::TaskLp;
use super::partitioned;
use super::spinlocks::{self, SpinOptions};

const EPSILON: f64 = 1e-6;

/// Which locking protocol guards the resources being analyzed,
/// selecting which LP [`blocking_at`] builds at each probed window.
/// `SuspensionOblivious` reuses [`partitioned::build_task_lp`]; the
/// rest reuse one of [`super::spinlocks`]'s four variants, each taking
/// the same `num_procs_per_cluster` the original's FIFO-ordered
/// variants cap local blocking by.
pub enum LockFamily {
    /// Suspension-based non-nested locking (MPCP/DPCP/OMLP-style),
    /// the original `pedf.rs`'s sole prior variant.
    SuspensionOblivious,
    /// Spinlock with no queuing order at all.
    Unordered,
    /// Priority-ordered spinlock.
    Priority,
    /// Priority-ordered spinlock with a per-cluster FIFO cap.
    PriorityFifo { num_procs_per_cluster: usize },
    /// As `PriorityFifo`, but a remote request can never arrival-block.
    PreemptiveFifo { num_procs_per_cluster: usize },
    /// MSRP: a single cluster-wide FIFO queue, no priority ordering.
    Msrp { num_procs_per_cluster: usize },
}

/// A cluster's worth of [`TaskInfo`] summaries, viewed as a plain
/// [`TaskSet`] for the demand-bound machinery in [`crate::edf::qpa`].
fn cluster_task_set(cluster: &[&TaskInfo]) -> TaskSet {
    TaskSet::from_tasks(
        cluster
            .iter()
            .map(|t| Task::new(t.cost(), t.period()).with_deadline(t.deadline()))
            .collect(),
    )
}

/// Builds `ti`'s LP for the chosen [`LockFamily`] at whatever window is
/// being probed. `ceilings` is only consulted by the spin variants that
/// need one (`Priority`, `PriorityFifo`, `PreemptiveFifo`).
fn build_lp_for_family(info: &ResourceSharingInfo, ti: &TaskInfo, family: &LockFamily, ceilings: &[u32]) -> TaskLp {
    match family {
        LockFamily::SuspensionOblivious => partitioned::build_task_lp(info, ti),
        LockFamily::Unordered => spinlocks::build_task_lp(info, ti, &SpinOptions { ceilings: None, local_fifo_cap: None, no_remote_arrival: false }),
        LockFamily::Priority => spinlocks::build_task_lp(info, ti, &SpinOptions { ceilings: Some(ceilings), local_fifo_cap: None, no_remote_arrival: false }),
        LockFamily::PriorityFifo { num_procs_per_cluster } => spinlocks::build_task_lp(
            info,
            ti,
            &SpinOptions { ceilings: Some(ceilings), local_fifo_cap: Some(*num_procs_per_cluster), no_remote_arrival: false },
        ),
        LockFamily::PreemptiveFifo { num_procs_per_cluster } => spinlocks::build_task_lp(
            info,
            ti,
            &SpinOptions { ceilings: Some(ceilings), local_fifo_cap: Some(*num_procs_per_cluster), no_remote_arrival: true },
        ),
        LockFamily::Msrp { num_procs_per_cluster } => {
            spinlocks::build_task_lp(info, ti, &SpinOptions { ceilings: None, local_fifo_cap: Some(*num_procs_per_cluster), no_remote_arrival: false })
        }
    }
}

/// The LP-computed blocking bound `ti` could suffer while its pending
/// job has been active for up to `window` (a stand-in response time
/// probed via [`TaskInfo::with_response`], not `ti`'s own converged
/// response time).
fn blocking_at<S: Solver>(info: &ResourceSharingInfo, ti: &TaskInfo, window: Duration, solver: &S, family: &LockFamily, ceilings: &[u32]) -> Duration {
    let probe = ti.with_response(window);
    let task_lp = build_lp_for_family(info, &probe, family, ceilings);
    match solver.solve(&task_lp.program) {
        Ok(solution) => round_up_with_epsilon(solution.evaluate(task_lp.program.objective()), EPSILON),
        Err(_) => Duration::MAX,
    }
}

/// The arrival-curve refinement loop (spec.md §4.6 steps 1-2): starting
/// from a window of length 1, repeatedly probe `ti`'s blocking bound
/// and grow the window to `ti.cost() + blocking`, until the window
/// stops growing (converged) or exceeds `hyperperiod` (fails).
fn arrival_curve_length<S: Solver>(
    info: &ResourceSharingInfo,
    ti: &TaskInfo,
    solver: &S,
    hyperperiod: Duration,
    family: &LockFamily,
    ceilings: &[u32],
) -> Option<Duration> {
    let workload = |window: Duration| ti.cost() + blocking_at(info, ti, window, solver, family, ceilings);
    search_with_offset(&Dedicated {}, 0, hyperperiod, &workload).ok()
}

/// Is `ti` schedulable within its cluster, given its converged
/// arrival-curve window `ac_len`? This is exactly
/// [`crate::edf::qpa::is_schedulable`]'s own test-point search, with
/// `ti`'s PDC-mode blocking term added to the cluster's ordinary
/// demand-bound function at every point QPA visits.
fn qpa_schedulable<S: Solver>(info: &ResourceSharingInfo, ts: &TaskSet, ti: &TaskInfo, ac_len: Duration, solver: &S, family: &LockFamily, ceilings: &[u32]) -> bool {
    if ts.is_empty() {
        return true;
    }
    let util = ts.utilization();
    if util > 1.0 {
        return false;
    }
    let max_interval = ac_len.min(max_test_interval(ts, util));
    let min_interval = min_relative_deadline(ts).min(ti.deadline());
    let first_point = largest_testpoint(ts, max_interval);
    is_schedulable_with_demand(min_interval, first_point, |t| {
        ts.bound_demand(t) + blocking_at(info, ti, t, solver, family, ceilings)
    })
}

/// The partitioned-EDF-with-locking-protocol schedulability test
/// (spec.md §4.5-§4.6): every cluster is checked independently, and a
/// cluster is schedulable only if every one of its tasks both
/// converges an arrival-curve window within `hyperperiod` and passes
/// the resulting QPA-with-blocking check. `family` selects which
/// locking protocol's LP is probed at each window.
pub fn is_schedulable_for_family<S: Solver>(info: &ResourceSharingInfo, solver: &S, hyperperiod: Duration, family: &LockFamily) -> bool {
    let ceilings = crate::contention::priority_ceilings(info);

    for cluster in crate::contention::split_by_cluster(info, None) {
        if cluster.is_empty() {
            continue;
        }
        let ts = cluster_task_set(&cluster);
        if ts.utilization() > 1.0 {
            return false;
        }
        for ti in &cluster {
            let ac_len = match arrival_curve_length(info, ti, solver, hyperperiod, family, &ceilings) {
                Some(len) => len,
                None => return false,
            };
            if !qpa_schedulable(info, &ts, ti, ac_len, solver, family, &ceilings) {
                return false;
            }
        }
    }
    true
}

/// As [`is_schedulable_for_family`], with [`LockFamily::SuspensionOblivious`]
/// — the suspension-based non-nested locking bound this module
/// originally shipped.
pub fn is_schedulable<S: Solver>(info: &ResourceSharingInfo, solver: &S, hyperperiod: Duration) -> bool {
    is_schedulable_for_family(info, solver, hyperperiod, &LockFamily::SuspensionOblivious)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::solver::brute_force::BruteForceSolver;
    use crate::resource::ResourceSharingInfo;

    #[test]
    fn single_task_with_no_contention_is_schedulable() {
        let mut info = ResourceSharingInfo::with_capacity(1);
        info.add_task(100, 10, 0, 0, 10, 0);

        let solver = BruteForceSolver { num_vars: 4 };
        assert!(is_schedulable(&info, &solver, 1000));
    }

    #[test]
    fn overutilized_cluster_is_never_schedulable() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(10, 5, 0, 0, 6, 0);
        info.add_task(10, 5, 0, 1, 6, 0);

        let solver = BruteForceSolver { num_vars: 4 };
        assert!(!is_schedulable(&info, &solver, 1000));
    }

    #[test]
    fn blocking_on_a_shared_resource_can_still_be_schedulable_if_short() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 10, 0);
        info.add_request(0, 1, 1);
        info.add_task(100, 10, 0, 1, 10, 0);
        info.add_request(0, 1, 1);

        let solver = BruteForceSolver { num_vars: 16 };
        assert!(is_schedulable(&info, &solver, 1000));
    }

    /// The same scenario checked under a spin-based lock family: a
    /// single-unit critical section is still short enough to remain
    /// schedulable once MSRP's local FIFO cap is applied.
    #[test]
    fn msrp_family_is_schedulable_for_a_short_critical_section() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 10, 0);
        info.add_request(0, 1, 1);
        info.add_task(100, 10, 0, 1, 10, 0);
        info.add_request(0, 1, 1);

        let solver = BruteForceSolver { num_vars: 16 };
        assert!(is_schedulable_for_family(&info, &solver, 1000, &LockFamily::Msrp { num_procs_per_cluster: 2 }));
    }
}
