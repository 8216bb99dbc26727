/*! Shared constraint/objective families and the per-task/merged LP batch
driver (spec.md §4.4.5, §4.4.8).

Grounded in `native/src/blocking/linprog/lp_common.cpp`. The original's
`GenericBoundLP` base class threads a `VarMapper& vars` and
`LinearProgram& lp` through every constraint-adding method; here each
becomes a free function over `&mut LinearProgram` plus an explicit
`&mut VarMapper`, composed by each concrete `lp_blocking::*` analysis —
"the 'concrete' analysis is the ordered list of such functions, not a
virtual class" (DESIGN NOTES).
*/

use crate::contention::remote_requests;
use crate::lp::model::{LinearExpression, LinearProgram};
use crate::lp::solver::{round_up_with_epsilon, SolveError, Solver};
use crate::lp::varmapper::{BlockingType, VarMapper};
use crate::resource::{ResourceLocality, ResourceSharingInfo, TaskInfo};

/// The number of request instances of `request` that may occur while
/// `ti`'s job of interest is pending, replacing `foreach_request_instance`.
fn request_instance_count(request: &crate::resource::RequestBound, owner: &TaskInfo, ti: &TaskInfo) -> u64 {
    request.max_num_requests(owner, ti.response())
}

/// `set_blocking_objective`: the length-weighted sum of every blocking
/// variable (direct + indirect + preemption) another task `tx` could
/// contribute to `ti`'s analysis, split into `local_obj`/`remote_obj`
/// sub-expressions per spec.md §4.4.6 ("objective is split between
/// 'local' and 'remote'"). `locality` resolves each resource to the
/// cluster it is local to.
pub fn set_blocking_objective(
    vars: &mut VarMapper,
    info: &ResourceSharingInfo,
    locality: &ResourceLocality,
    ti: &TaskInfo,
    lp: &mut LinearProgram,
    mut local_obj: Option<&mut LinearExpression>,
    mut remote_obj: Option<&mut LinearExpression>,
) {
    let mut obj = lp.objective().clone();
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            let local = locality.get(q) == Some(ti.cluster());
            let length = request.request_length() as f64;
            for v in 0..request_instance_count(request, tx, ti) {
                for kind in [BlockingType::Direct, BlockingType::Indirect, BlockingType::Preempt] {
                    let var_id = vars.lookup(tx.id(), q, v as usize, kind);
                    obj.add_term(length, var_id);
                    if local {
                        if let Some(e) = local_obj.as_deref_mut() {
                            e.add_term(length, var_id);
                        }
                    } else if let Some(e) = remote_obj.as_deref_mut() {
                        e.add_term(length, var_id);
                    }
                }
            }
        }
    }
    lp.set_objective(obj);
}

/// `set_blocking_objective_part_shm`: as [`set_blocking_objective`], but
/// for partitioned shared-memory protocols where "local" means "same
/// cluster as `ti`" directly (no separate resource locality map — a
/// critical section always executes on its owner's assigned processor).
pub fn set_blocking_objective_part_shm(
    vars: &mut VarMapper,
    info: &ResourceSharingInfo,
    ti: &TaskInfo,
    lp: &mut LinearProgram,
    mut local_obj: Option<&mut LinearExpression>,
    mut remote_obj: Option<&mut LinearExpression>,
) {
    let mut obj = lp.objective().clone();
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        let local = tx.cluster() == ti.cluster();
        for request in tx.requests() {
            let q = request.resource_id();
            let length = request.request_length() as f64;
            for v in 0..request_instance_count(request, tx, ti) {
                for kind in [BlockingType::Direct, BlockingType::Indirect, BlockingType::Preempt] {
                    let var_id = vars.lookup(tx.id(), q, v as usize, kind);
                    obj.add_term(length, var_id);
                    if local {
                        if let Some(e) = local_obj.as_deref_mut() {
                            e.add_term(length, var_id);
                        }
                    } else if let Some(e) = remote_obj.as_deref_mut() {
                        e.add_term(length, var_id);
                    }
                }
            }
        }
    }
    lp.set_objective(obj);
}

/// `set_blocking_objective_sob`: for suspension-oblivious protocols that
/// do not distinguish direct/indirect/preemption blocking — every
/// blocking episode is charged to the same `Other`-tagged variable,
/// since it is simply added to the analyzed task's execution time either
/// way.
pub fn set_blocking_objective_sob(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let mut obj = lp.objective().clone();
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            let length = request.request_length() as f64;
            for v in 0..request_instance_count(request, tx, ti) {
                let var_id = vars.lookup(tx.id(), q, v as usize, BlockingType::Other);
                obj.add_term(length, var_id);
            }
        }
    }
    lp.set_objective(obj);
}

/// Constraint 1 [Brandenburg 2013]: direct + indirect + preemption
/// blocking from one request instance are mutually exclusive.
pub fn add_mutex_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                let mut exp = LinearExpression::new();
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Preempt));
                lp.add_inequality(exp, 1.0);
            }
        }
    }
}

/// Constraint 2 [Brandenburg 2013]: a remote task can never cause
/// preemption-blocking, since preemption-blocking models local
/// priority-boost donation.
pub fn add_topology_constraints(
    vars: &mut VarMapper,
    info: &ResourceSharingInfo,
    locality: &ResourceLocality,
    ti: &TaskInfo,
    lp: &mut LinearProgram,
) {
    let mut exp = LinearExpression::new();
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in remote_requests(tx.requests(), locality, ti) {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Preempt));
            }
        }
    }
    lp.add_equality(exp, 0.0);
}

fn max_num_arrivals_remote(locality: &ResourceLocality, ti: &TaskInfo) -> u64 {
    let mut count = 1;
    for req in ti.requests() {
        if locality.get(req.resource_id()) != Some(ti.cluster()) {
            count += req.num_requests() as u64;
        }
    }
    count
}

/// Constraint 3 [Brandenburg 2013]: every local, equal-or-lower-priority
/// task gets exactly one priority-boosting preemption opportunity per
/// time `ti` arrives (is released or resumes after a remote request).
pub fn add_local_lower_priority_constraints(
    vars: &mut VarMapper,
    info: &ResourceSharingInfo,
    locality: &ResourceLocality,
    ti: &TaskInfo,
    lp: &mut LinearProgram,
) {
    let num_arrivals = max_num_arrivals_remote(locality, ti) as f64;
    for tx in crate::contention::local_lowereq_priority_tasks_except(info.tasks(), ti) {
        let mut exp = LinearExpression::new();
        for request in tx.requests() {
            let q = request.resource_id();
            if locality.get(q) == Some(ti.cluster()) {
                for v in 0..request_instance_count(request, tx, ti) {
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Preempt));
                }
            }
        }
        lp.add_equality(exp, num_arrivals);
    }
}

/// Constraint 10 [Brandenburg 2013]: under shared-memory protocols, a
/// remote task cannot preempt `ti` since it is not even scheduled on
/// `ti`'s processor.
pub fn add_topology_constraints_shm(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let mut exp = LinearExpression::new();
    for tx in crate::contention::remote_tasks(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Preempt));
            }
        }
    }
    lp.add_equality(exp, 0.0);
}

/// Constraint 9 [Brandenburg 2013]: under partitioned shared-memory
/// protocols, a local *higher*-priority task never blocks `ti` at all
/// (it simply runs first).
pub fn add_local_higher_priority_constraints_shm(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let mut exp = LinearExpression::new();
    for tx in crate::contention::local_tasks(info.tasks(), ti) {
        if tx.priority() >= ti.priority() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Preempt));
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
            }
        }
    }
    lp.add_equality(exp, 0.0);
}

fn max_num_arrivals_shm(info: &ResourceSharingInfo, ti: &TaskInfo) -> u64 {
    let mut request_counts = std::collections::HashMap::new();
    for req in ti.requests() {
        request_counts.entry(req.resource_id()).or_insert(0u64);
    }
    for tx in crate::contention::remote_tasks(info.tasks(), ti) {
        for req in tx.requests() {
            if let Some(slot) = request_counts.get_mut(&req.resource_id()) {
                *slot += request_instance_count(req, tx, ti);
            }
        }
    }
    let mut total = 1;
    for req in ti.requests() {
        total += request_counts[&req.resource_id()].min(req.num_requests() as u64);
    }
    total
}

/// Constraint 11 [Brandenburg 2013]: under partitioned shared-memory
/// protocols, a local equal-or-lower-priority task blocks at most once
/// per time `ti` suspends (plus once after release).
pub fn add_local_lower_priority_constraints_shm(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let num_arrivals = max_num_arrivals_shm(info, ti) as f64;
    for tx in crate::contention::local_lowereq_priority_tasks_except(info.tasks(), ti) {
        let mut exp = LinearExpression::new();
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request_instance_count(request, tx, ti) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Preempt));
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
            }
        }
        lp.add_equality(exp, num_arrivals);
    }
}

/// One task's freshly built LP, paired with the number of variables its
/// [`VarMapper`] ended up allocating (needed to size a merged program).
pub struct TaskLp {
    pub task_id: usize,
    pub program: LinearProgram,
    pub num_vars: u32,
}

/// Solve each task's LP independently ("per-task LPs", spec.md §4.4.8).
/// `Unlimited` on solver failure, per spec.md §7 (`SolverFailure`).
pub fn solve_per_task<S: Solver>(solver: &S, lps: &[TaskLp], epsilon: f64) -> Vec<crate::bound::Bound<u64>> {
    lps.iter()
        .map(|task_lp| solve_one(solver, &task_lp.program, epsilon))
        .collect()
}

fn solve_one<S: Solver>(solver: &S, lp: &LinearProgram, epsilon: f64) -> crate::bound::Bound<u64> {
    match solver.solve(lp) {
        Ok(solution) => crate::bound::Bound::Bounded(round_up_with_epsilon(solution.evaluate(lp.objective()), epsilon)),
        Err(SolveError::Infeasible) | Err(SolveError::DidNotConverge) => crate::bound::Bound::Unlimited,
    }
}

fn shift_expression(expr: &LinearExpression, offset: u32) -> LinearExpression {
    let mut shifted = LinearExpression::new();
    for &(coeff, var) in expr.terms() {
        shifted.add_term(coeff, var + offset);
    }
    shifted
}

/// Solve every task's LP as one larger program with disjoint variable
/// ranges ("merged LP", spec.md §4.4.8) — "an optimization; both must
/// agree on the result" (see the regression test in
/// `tests/scenarios.rs` pinning both paths for the same input).
pub fn solve_merged<S: Solver>(solver: &S, lps: &[TaskLp], epsilon: f64) -> Vec<crate::bound::Bound<u64>> {
    let mut merged = LinearProgram::new();
    let mut offsets = Vec::with_capacity(lps.len());
    let mut next_offset = 0u32;

    for task_lp in lps {
        offsets.push(next_offset);
        for c in task_lp.program.equalities() {
            merged.add_equality(shift_expression(&c.expression, next_offset), c.bound);
        }
        for c in task_lp.program.inequalities() {
            merged.add_inequality(shift_expression(&c.expression, next_offset), c.bound);
        }
        for &v in task_lp.program.integer_variables() {
            merged.declare_variable_integer(v + next_offset);
        }
        for &v in task_lp.program.binary_variables() {
            merged.declare_variable_binary(v + next_offset);
        }
        for r in task_lp.program.non_default_variable_ranges() {
            merged.declare_variable_bounds(r.variable_id + next_offset, r.lower_bound, r.upper_bound);
        }
        next_offset += task_lp.num_vars;
    }

    match solver.solve(&merged) {
        Ok(solution) => lps
            .iter()
            .zip(&offsets)
            .map(|(task_lp, &offset)| {
                let shifted_objective = shift_expression(task_lp.program.objective(), offset);
                crate::bound::Bound::Bounded(round_up_with_epsilon(solution.evaluate(&shifted_objective), epsilon))
            })
            .collect(),
        Err(_) => vec![crate::bound::Bound::Unlimited; lps.len()],
    }
}
