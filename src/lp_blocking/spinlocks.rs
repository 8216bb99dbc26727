/*! Spinlock blocking bounds for non-nested locking protocols
(spec.md §4.4.5 "Spinlocks").

Grounded in `native/src/blocking/linprog/lp_spinlocks.cpp` and
`lp_spinlock_prio.cpp`. Unlike the suspension-based families in
[`super::common`]/[`super::global`], a spin-waiting job is never
preempted while it holds the lock, but it can be *re-queued* behind a
request that arrives after it starts waiting ("arrival blocking") — so
each blocking episode is one of two kinds rather than three:

- **Direct** ([`crate::lp::varmapper::BlockingType::Direct`]): another
  task's critical section, already in progress or already queued, that
  `ti` must wait out.
- **Arrival** (reusing
  [`crate::lp::varmapper::BlockingType::Indirect`], since this crate's
  `BlockingType` has no dedicated tag for it — `VarMapper` makes the
  same kind of deliberate reuse in
  `lookup_arrival_enabled`/`lookup_max_preemptions`): a request that
  arrives at the lock after `ti` has started waiting and is queued
  ahead of it by the lock's ordering discipline.

`BlockingType::Preempt` is unused by this family; every constraint
pass below zeroes it out so [`super::common::add_mutex_constraints`]
can still be reused unmodified.

Four variants share this skeleton, differing only in how the lock
orders its queue:

- [`unordered_bounds`]: no ordering guarantee at all — any waiting
  request may be arrival-blocked by any later one.
- [`priority_bounds`]: requests are additionally culled by priority
  ceiling, per [`crate::contention::priority_ceilings`] (mirrors
  `lp_spinlock_prio.cpp`).
- [`priority_fifo_bounds`]: as [`priority_bounds`], plus each local
  processor contributes at most one direct block per access.
- [`preemptive_fifo_bounds`]: as [`priority_fifo_bounds`], but a remote
  request can never arrival-block `ti` at all (Constraint 20 in the
  original — under preemptive FIFO spinlocks, only a local request can
  queue ahead).
- [`msrp_bounds`]: the MPCP/MSRP non-preemptive spinlock bound — a
  single cluster-wide FIFO queue, so the local cap from
  [`priority_fifo_bounds`] applies with no priority ordering at all.
*/

use std::collections::HashSet;

use crate::lp::model::{LinearExpression, LinearProgram};
use crate::lp::solver::Solver;
use crate::lp::varmapper::{BlockingType, VarMapper};
use crate::resource::{BlockingBounds, Interference, ResourceSharingInfo, TaskInfo};

use super::common::{add_mutex_constraints, set_blocking_objective_part_shm, solve_merged, solve_per_task, TaskLp};

pub const EPSILON: f64 = 1e-6;

fn request_instance_count(request: &crate::resource::RequestBound, owner: &TaskInfo, ti: &TaskInfo) -> u64 {
    request.max_num_requests(owner, ti.response())
}

/// This family never uses `Preempt`; forced to zero so
/// [`add_mutex_constraints`] can be reused unmodified.
fn zero_preempt_contributions(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                let mut exp = LinearExpression::new();
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Preempt));
                lp.add_equality(exp, 0.0);
            }
        }
    }
}

/// Constraints 3-5: `ti` can only be arrival-blocked at the one
/// resource it is currently queued at, so at most one resource's
/// `lookup_arrival_enabled` indicator may be set, and an
/// arrival-blocking variable is gated on its own resource's indicator.
fn add_arrival_gating_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let accessed: HashSet<usize> = ti.requests().iter().map(|r| r.resource_id()).collect();

    let mut enabled_sum = LinearExpression::new();
    for &q in &accessed {
        enabled_sum.add_var(vars.lookup_arrival_enabled(q));
    }
    lp.add_inequality(enabled_sum, 1.0);

    for &q in &accessed {
        let enabled = vars.lookup_arrival_enabled(q);
        for tx in info.tasks() {
            if tx.id() == ti.id() {
                continue;
            }
            for request in crate::contention::requests_for(tx.requests(), q) {
                for v in 0..request_instance_count(request, tx, ti) {
                    let mut exp = LinearExpression::new();
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                    exp.sub_var(enabled);
                    lp.add_inequality(exp, 0.0);
                }
            }
        }
    }
}

/// Constraint 6: at most `num_procs_per_cluster - 1` other processors
/// in `ti`'s own cluster can be blocking it at once, whether by
/// directly executing a critical section or by having arrived and
/// been queued ahead of it — there simply aren't any more local
/// processors to contribute a blocking episode than that.
fn add_local_blocking_cap(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram, num_procs_per_cluster: usize) {
    for ti_req in ti.requests() {
        let q = ti_req.resource_id();
        let mut exp = LinearExpression::new();
        for tx in crate::contention::local_tasks_except(info.tasks(), ti) {
            for request in crate::contention::requests_for(tx.requests(), q) {
                for v in 0..request_instance_count(request, tx, ti) {
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                }
            }
        }
        lp.add_inequality(exp, num_procs_per_cluster.saturating_sub(1) as f64);
    }
}

/// Zeroes out `Direct`/`Indirect` contributions from resources whose
/// priority ceiling is strictly lower priority than `ti`: a
/// priority-ordered spinlock always serves `ti` ahead of such a
/// request, so it can never have to wait for one.
fn add_ceiling_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, ceilings: &[u32], lp: &mut LinearProgram) {
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            if ceilings[q] > ti.priority() {
                for v in 0..request_instance_count(request, tx, ti) {
                    let mut exp = LinearExpression::new();
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                    lp.add_equality(exp, 0.0);
                }
            }
        }
    }
}

/// Constraint 20: a remote request can never arrival-block `ti` under
/// a preemptive FIFO spinlock — only a local request can overtake it
/// in the queue.
fn add_no_remote_arrival_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    for tx in crate::contention::remote_tasks(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                let mut exp = LinearExpression::new();
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                lp.add_equality(exp, 0.0);
            }
        }
    }
}

pub(crate) struct SpinOptions<'a> {
    pub(crate) ceilings: Option<&'a [u32]>,
    pub(crate) local_fifo_cap: Option<usize>,
    pub(crate) no_remote_arrival: bool,
}

pub(crate) fn build_task_lp(info: &ResourceSharingInfo, ti: &TaskInfo, opts: &SpinOptions) -> TaskLp {
    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();

    set_blocking_objective_part_shm(&mut vars, info, ti, &mut lp, None, None);
    add_mutex_constraints(&mut vars, info, ti, &mut lp);
    zero_preempt_contributions(&mut vars, info, ti, &mut lp);
    add_arrival_gating_constraints(&mut vars, info, ti, &mut lp);

    if let Some(ceilings) = opts.ceilings {
        add_ceiling_constraints(&mut vars, info, ti, ceilings, &mut lp);
    }
    if let Some(num_procs) = opts.local_fifo_cap {
        add_local_blocking_cap(&mut vars, info, ti, &mut lp, num_procs);
    }
    if opts.no_remote_arrival {
        add_no_remote_arrival_constraints(&mut vars, info, ti, &mut lp);
    }

    vars.seal();
    TaskLp { task_id: ti.id(), program: lp, num_vars: vars.num_vars() }
}

fn solve_family<S: Solver>(info: &ResourceSharingInfo, solver: &S, opts: SpinOptions, use_merged_lp: bool) -> BlockingBounds {
    let task_lps: Vec<TaskLp> = info.tasks().iter().map(|ti| build_task_lp(info, ti, &opts)).collect();
    let results = if use_merged_lp { solve_merged(solver, &task_lps, EPSILON) } else { solve_per_task(solver, &task_lps, EPSILON) };

    let mut out = BlockingBounds::for_info(info);
    for (task_lp, result) in task_lps.iter().zip(results) {
        out[task_lp.task_id] = Interference::new(0, result.unwrap_or(u64::MAX));
    }
    out
}

/// No queuing order at all: any waiting request may be arrival-blocked
/// by any later one, and direct blocking is capped only by mutual
/// exclusion.
pub fn unordered_bounds<S: Solver>(info: &ResourceSharingInfo, solver: &S, use_merged_lp: bool) -> BlockingBounds {
    solve_family(info, solver, SpinOptions { ceilings: None, local_fifo_cap: None, no_remote_arrival: false }, use_merged_lp)
}

/// Priority-ordered spinlock: a resource whose priority ceiling is
/// lower priority than `ti` can never block it.
pub fn priority_bounds<S: Solver>(info: &ResourceSharingInfo, solver: &S, use_merged_lp: bool) -> BlockingBounds {
    let ceilings = crate::contention::priority_ceilings(info);
    solve_family(info, solver, SpinOptions { ceilings: Some(&ceilings), local_fifo_cap: None, no_remote_arrival: false }, use_merged_lp)
}

/// As [`priority_bounds`], plus a per-cluster FIFO cap: at most
/// `num_procs_per_cluster - 1` other local processors can be directly
/// blocking `ti` at once.
pub fn priority_fifo_bounds<S: Solver>(info: &ResourceSharingInfo, solver: &S, num_procs_per_cluster: usize, use_merged_lp: bool) -> BlockingBounds {
    let ceilings = crate::contention::priority_ceilings(info);
    solve_family(
        info,
        solver,
        SpinOptions { ceilings: Some(&ceilings), local_fifo_cap: Some(num_procs_per_cluster), no_remote_arrival: false },
        use_merged_lp,
    )
}

/// As [`priority_fifo_bounds`], but a remote task can never
/// arrival-block `ti` (Constraint 20): only a local request can
/// overtake it in a preemptive FIFO spinlock's queue.
pub fn preemptive_fifo_bounds<S: Solver>(info: &ResourceSharingInfo, solver: &S, num_procs_per_cluster: usize, use_merged_lp: bool) -> BlockingBounds {
    let ceilings = crate::contention::priority_ceilings(info);
    solve_family(
        info,
        solver,
        SpinOptions { ceilings: Some(&ceilings), local_fifo_cap: Some(num_procs_per_cluster), no_remote_arrival: true },
        use_merged_lp,
    )
}

/// MSRP: a single cluster-wide FIFO queue with no priority ordering at
/// all, so only the local FIFO cap applies.
pub fn msrp_bounds<S: Solver>(info: &ResourceSharingInfo, solver: &S, num_procs_per_cluster: usize, use_merged_lp: bool) -> BlockingBounds {
    solve_family(info, solver, SpinOptions { ceilings: None, local_fifo_cap: Some(num_procs_per_cluster), no_remote_arrival: false }, use_merged_lp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::solver::brute_force::BruteForceSolver;

    fn two_contenders() -> ResourceSharingInfo {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 0, 1, 5, 0);
        info.add_request(0, 1, 4);
        info
    }

    #[test]
    fn unordered_bound_is_capped_by_mutual_exclusion() {
        let info = two_contenders();
        let solver = BruteForceSolver { num_vars: 20 };
        let bounds = unordered_bounds(&info, &solver, false);
        // task 0's single contender may deliver at most one blocking
        // episode (direct or arrival, never both), worth its length.
        assert_eq!(bounds.blocking_term(0), 4);
    }

    #[test]
    fn priority_bound_ignores_lower_ceiling_resource() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 4);
        // task 1 is lower priority and the only other accessor of
        // resource 0, so its ceiling is lower priority than task 0.
        info.add_task(100, 10, 0, 1, 5, 0);
        info.add_request(0, 1, 4);

        let solver = BruteForceSolver { num_vars: 20 };
        let bounds = priority_bounds(&info, &solver, false);
        assert_eq!(bounds.blocking_term(1), 0);
    }

    #[test]
    fn local_fifo_cap_forbids_blocking_with_a_single_processor_cluster() {
        let info = two_contenders();
        let solver = BruteForceSolver { num_vars: 20 };
        let bounds = msrp_bounds(&info, &solver, 1, false);
        assert_eq!(bounds.blocking_term(0), 0);
        assert_eq!(bounds.blocking_term(1), 0);
    }
}
