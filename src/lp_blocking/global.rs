/*! Generic suspension-aware global-scheduling blocking LP (spec.md §4.4.6).

Grounded in `native/src/blocking/linprog/lp_global.cpp`'s
`GlobalSuspensionAwareLP`. The original tracks, per other task, three
task-scoped *interference* quantities (regular, co-boosting, stalling)
in addition to the request-scoped direct/indirect/preemption blocking
variables [`crate::lp_blocking::common`] already models, and bounds them
through five constraint families (workload, slack, mutex/pi-blocking,
stalling-independence, non-access). The per-protocol `.cpp` files this
module's five wrappers ([`super::global_pip`], [`super::global_ppcp`],
[`super::global_fmlp_plus`], [`super::global_rsb`],
[`super::global_no_progress`]) are grounded on each differ mainly in how
they further restrict which tasks may contribute co-boosting/stalling
interference at all; this module carries only the shared skeleton they
all build on, and each wrapper documents the restriction it adds.
*/

use std::collections::HashSet;

use crate::bound::Bound;
use crate::contention::{lower_priority_tasks, split_by_resource};
use crate::lp::model::{LinearExpression, LinearProgram};
use crate::lp::solver::Solver;
use crate::lp::varmapper::{BlockingType, InterferenceKind, VarMapper};
use crate::resource::{BlockingBounds, Interference, ResourceLocality, ResourceSharingInfo, TaskInfo};

use super::common::{add_local_lower_priority_constraints, add_mutex_constraints, add_topology_constraints, solve_merged, solve_per_task, TaskLp};

pub const EPSILON: f64 = 1e-6;

/// The task-scoped interference terms, 1/m-scaled per `lp_global.cpp`'s
/// `set_objective`: regular interference from higher-priority tasks,
/// co-boosting and stalling interference from lower-priority ones.
/// Direct blocking is charged at full length for everyone; indirect and
/// preemption blocking are 1/m-scaled and only contributed by
/// lower-priority tasks (a higher-priority task's own job can never be
/// indirectly blocked or preempted by `ti`'s priority boost).
pub fn set_global_objective(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, num_procs: usize, lp: &mut LinearProgram) {
    let m = (num_procs.max(1)) as f64;
    let mut obj = LinearExpression::new();

    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        let higher = tx.priority() < ti.priority();

        if higher {
            obj.add_term(1.0 / m, vars.lookup_interference(tx.id(), InterferenceKind::Regular));
        } else {
            obj.add_term(1.0 / m, vars.lookup_interference(tx.id(), InterferenceKind::CoBoosting));
            obj.add_term(1.0 / m, vars.lookup_interference(tx.id(), InterferenceKind::Stalling));
        }

        for request in tx.requests() {
            let q = request.resource_id();
            let length = request.request_length() as f64;
            for v in 0..request.max_num_requests(tx, ti.response()) {
                obj.add_term(length, vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                if !higher {
                    obj.add_term(length / m, vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                    obj.add_term(length / m, vars.lookup(tx.id(), q, v as usize, BlockingType::Preempt));
                }
            }
        }
    }
    lp.set_objective(obj);
}

/// Constraint 1: the combined interference every other task may impose
/// on `ti` cannot exceed the time `ti` spends not executing within its
/// own response-time window.
pub fn add_workload_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let capacity = (ti.response().saturating_sub(ti.cost())) as f64;
    let mut exp = LinearExpression::new();
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        exp.add_var(vars.lookup_interference(tx.id(), InterferenceKind::Regular));
        exp.add_var(vars.lookup_interference(tx.id(), InterferenceKind::CoBoosting));
        exp.add_var(vars.lookup_interference(tx.id(), InterferenceKind::Stalling));
    }
    lp.add_inequality(exp, capacity);
}

/// Constraint 2: each individual task's interference contribution is
/// capped at the most it could possibly demand within `ti`'s response
/// time (its own workload bound over that interval).
pub fn add_slack_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        let cap = tx.workload_bound(ti.response()) as f64;
        for kind in [InterferenceKind::Regular, InterferenceKind::CoBoosting, InterferenceKind::Stalling] {
            let v = vars.lookup_interference(tx.id(), kind);
            lp.declare_variable_bounds(v, Some(0.0), Some(cap));
        }
    }
}

/// Constraint 4: a task that never issues any request cannot stall
/// `ti` at all if `ti` itself never issues any request either (there is
/// no shared resource through which stalling could occur).
pub fn add_stalling_interference_for_independent_tasks(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    if ti.total_num_requests() != 0 {
        return;
    }
    for tx in lower_priority_tasks(info.tasks(), ti) {
        let mut exp = LinearExpression::new();
        exp.add_var(vars.lookup_interference(tx.id(), InterferenceKind::Stalling));
        lp.add_equality(exp, 0.0);
    }
}

/// Constraint 5: `ti` cannot be directly blocked on a resource it never
/// itself requests.
pub fn add_generic_non_access_direct_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let accessed: HashSet<usize> = ti.requests().iter().map(|r| r.resource_id()).collect();
    let resources = split_by_resource(info.tasks());

    for (q, reqs) in resources.iter().enumerate() {
        if accessed.contains(&q) {
            continue;
        }
        let mut exp = LinearExpression::new();
        for r in reqs {
            let owner = &info.tasks()[r.task_index()];
            if owner.id() == ti.id() {
                continue;
            }
            for v in 0..r.max_num_requests(owner, ti.response()) {
                exp.add_var(vars.lookup(owner.id(), q, v as usize, BlockingType::Direct));
            }
        }
        lp.add_equality(exp, 0.0);
    }
}

/// Assembles one task's full suspension-aware global LP: objective plus
/// all five constraint families, reusing [`super::common`]'s
/// request-scoped mutex/topology/local-lower-priority constraints
/// unchanged (they do not depend on processor count).
pub fn build_task_lp(info: &ResourceSharingInfo, locality: &ResourceLocality, ti: &TaskInfo, num_procs: usize) -> TaskLp {
    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();

    set_global_objective(&mut vars, info, ti, num_procs, &mut lp);
    add_mutex_constraints(&mut vars, info, ti, &mut lp);
    add_topology_constraints(&mut vars, info, locality, ti, &mut lp);
    add_local_lower_priority_constraints(&mut vars, info, locality, ti, &mut lp);
    add_workload_constraints(&mut vars, info, ti, &mut lp);
    add_slack_constraints(&mut vars, info, ti, &mut lp);
    add_stalling_interference_for_independent_tasks(&mut vars, info, ti, &mut lp);
    add_generic_non_access_direct_constraints(&mut vars, info, ti, &mut lp);

    vars.seal();
    TaskLp { task_id: ti.id(), program: lp, num_vars: vars.num_vars() }
}

/// Solves the generic suspension-aware global LP for every task.
pub fn bounds<S: Solver>(info: &ResourceSharingInfo, locality: &ResourceLocality, solver: &S, num_procs: usize, use_merged_lp: bool) -> BlockingBounds {
    let task_lps: Vec<TaskLp> = info.tasks().iter().map(|ti| build_task_lp(info, locality, ti, num_procs)).collect();

    let results = if use_merged_lp { solve_merged(solver, &task_lps, EPSILON) } else { solve_per_task(solver, &task_lps, EPSILON) };

    let mut out = BlockingBounds::for_info(info);
    for (task_lp, result) in task_lps.iter().zip(results) {
        match result {
            Bound::Bounded(total) => out[task_lp.task_id] = Interference::new(0, total),
            Bound::Unlimited => out[task_lp.task_id] = Interference::new(0, u64::MAX),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::solver::brute_force::BruteForceSolver;

    #[test]
    fn task_with_no_requests_is_never_stalled() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_task(100, 10, 1, 1, 3, 0);
        info.add_request(0, 1, 4);

        let locality = ResourceLocality::new();
        let ti = &info.tasks()[0];
        let mut vars = VarMapper::new();
        let mut lp = LinearProgram::new();
        add_stalling_interference_for_independent_tasks(&mut vars, &info, ti, &mut lp);
        assert_eq!(lp.equalities().len(), 1);
    }

    #[test]
    fn independent_resources_yield_no_blocking() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_request(0, 1, 3);
        info.add_task(100, 10, 1, 1, 3, 0);
        info.add_request(1, 1, 3);

        let locality = ResourceLocality::new();
        let solver = BruteForceSolver { num_vars: 16 };
        let bounds = bounds(&info, &locality, &solver, 2, false);
        assert_eq!(bounds.blocking_term(0), 0);
        assert_eq!(bounds.blocking_term(1), 0);
    }
}
