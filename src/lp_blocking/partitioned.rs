/*! Shared skeleton for suspension-oblivious locking-protocol LPs
(spec.md §4.4.7).

Grounded in `native/src/blocking/linprog/lp_fmlp.cpp`. These protocols
charge a blocking episode directly to the analyzed task's own execution
time — a blocked job busy-waits rather than suspends, so there is no
direct/indirect/preemption distinction the way the suspension-aware
families in [`super::common`]/[`super::global`] need: every blocking
episode is the same single
[`crate::lp::varmapper::BlockingType::Other`]-tagged indicator. This
skeleton is shared by [`super::fmlp_plus`] (its unmodified bound),
[`super::gfmlp`], [`super::dflp`] and [`super::omip`] (each adding one
further restriction, documented in its own module).
*/

use crate::lp::model::{LinearExpression, LinearProgram};
use crate::lp::solver::Solver;
use crate::lp::varmapper::{BlockingType, VarMapper};
use crate::resource::{BlockingBounds, Interference, ResourceSharingInfo, TaskInfo};

use super::common::{solve_merged, solve_per_task, TaskLp};

pub const EPSILON: f64 = 1e-6;

fn request_instance_count(request: &crate::resource::RequestBound, owner: &TaskInfo, ti: &TaskInfo) -> u64 {
    request.max_num_requests(owner, ti.response())
}

/// Each request instance may block `ti` at most once.
pub fn add_mutex_constraints_sob(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                let mut exp = LinearExpression::new();
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Other));
                lp.add_inequality(exp, 1.0);
            }
        }
    }
}

/// A task with strictly higher priority than `ti` never blocks it —
/// it simply runs first and never holds a lock `ti` would wait on by
/// the time `ti`'s job becomes eligible.
pub fn add_no_higher_priority_blocking_sob(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    for tx in crate::contention::higher_priority_tasks(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                let mut exp = LinearExpression::new();
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Other));
                lp.add_equality(exp, 0.0);
            }
        }
    }
}

fn max_num_arrivals(ti: &TaskInfo) -> u64 {
    1 + ti.total_num_requests()
}

/// An equal-or-lower-priority task can block `ti` at most once per
/// time `ti` arrives (is released, or resumes after a blocking
/// episode of its own).
pub fn add_lowereq_priority_blocking_sob(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let num_arrivals = max_num_arrivals(ti) as f64;
    for tx in crate::contention::lowereq_priority_tasks_except(info.tasks(), ti) {
        let mut exp = LinearExpression::new();
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Other));
            }
        }
        lp.add_inequality(exp, num_arrivals);
    }
}

/// `ti` is never blocked on a resource it never itself requests.
pub fn add_non_access_constraint_sob(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let accessed: std::collections::HashSet<usize> = ti.requests().iter().map(|r| r.resource_id()).collect();
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            if accessed.contains(&q) {
                continue;
            }
            for v in 0..request_instance_count(request, tx, ti) {
                let mut exp = LinearExpression::new();
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Other));
                lp.add_equality(exp, 0.0);
            }
        }
    }
}

/// Sets the length-weighted objective over every `Other`-tagged
/// blocking indicator; thin re-export of
/// [`super::common::set_blocking_objective_sob`] kept local so callers
/// only need this module's name.
pub fn set_objective(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    super::common::set_blocking_objective_sob(vars, info, ti, lp);
}

/// Builds one task's suspension-oblivious LP.
pub fn build_task_lp(info: &ResourceSharingInfo, ti: &TaskInfo) -> TaskLp {
    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();

    set_objective(&mut vars, info, ti, &mut lp);
    add_mutex_constraints_sob(&mut vars, info, ti, &mut lp);
    add_no_higher_priority_blocking_sob(&mut vars, info, ti, &mut lp);
    add_lowereq_priority_blocking_sob(&mut vars, info, ti, &mut lp);
    add_non_access_constraint_sob(&mut vars, info, ti, &mut lp);

    vars.seal();
    TaskLp { task_id: ti.id(), program: lp, num_vars: vars.num_vars() }
}

/// Solves the shared skeleton for every task; the FMLP+ bound itself
/// (spec.md §4.4.7) is exactly this with no further restriction.
pub fn bounds<S: Solver>(info: &ResourceSharingInfo, solver: &S, use_merged_lp: bool) -> BlockingBounds {
    let task_lps: Vec<TaskLp> = info.tasks().iter().map(|ti| build_task_lp(info, ti)).collect();

    let results = if use_merged_lp { solve_merged(solver, &task_lps, EPSILON) } else { solve_per_task(solver, &task_lps, EPSILON) };

    let mut out = BlockingBounds::for_info(info);
    for (task_lp, result) in task_lps.iter().zip(results) {
        let total = result.unwrap_or(u64::MAX);
        out[task_lp.task_id] = Interference::new(0, total);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::solver::brute_force::BruteForceSolver;

    #[test]
    fn task_with_no_shared_resources_is_never_blocked() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 0, 1, 3, 0);
        info.add_request(1, 1, 4);

        let solver = BruteForceSolver { num_vars: 16 };
        let bounds = bounds(&info, &solver, false);
        assert_eq!(bounds.blocking_term(0), 0);
        assert_eq!(bounds.blocking_term(1), 0);
    }

    #[test]
    fn lower_priority_holder_can_block_a_higher_priority_waiter() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 0, 1, 3, 0);
        info.add_request(0, 1, 4);

        let solver = BruteForceSolver { num_vars: 16 };
        let bounds = bounds(&info, &solver, false);
        assert_eq!(bounds.blocking_term(0), 4);
    }

    #[test]
    fn higher_priority_holder_never_blocks() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 0, 1, 3, 0);
        info.add_request(0, 1, 4);

        let solver = BruteForceSolver { num_vars: 16 };
        let bounds = bounds(&info, &solver, false);
        assert_eq!(bounds.blocking_term(1), 0);
    }
}
