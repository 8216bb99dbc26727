/*! LP-based Multiprocessor Priority Ceiling Protocol (MPCP) blocking
bound.

Grounded in `native/src/blocking/linprog/lp_mpcp.cpp`. Reuses the
closed-form [`crate::blocking::mpcp`]'s priority-ceiling and global
critical-section (gcs) response-time fixed point
([`crate::blocking::mpcp::mpcp_ceilings`],
[`crate::blocking::mpcp::gcs_response_times`],
[`crate::blocking::mpcp::remote_blocking_for_resource`]) rather than
re-deriving it: `lp_mpcp.cpp`'s own `GcsResponseTimes` class is exactly
that fixed point, and `apply_mpcp_bounds_for_task` only ever consults it
through `get_max_remote_delay`, never rebuilds it per task.

Differs from the closed-form bound by charging direct and indirect
blocking through the LP's per-request variables (capped by the gcs
response-time fixed point, Constraints 15/16/17/18/19/20) instead of
summing every remote request's worst case unconditionally, at the cost
of needing the whole-taskset ceiling/response-time tables up front.

Unlike [`super::dpcp`], this module takes no [`crate::resource::ResourceLocality`]:
MPCP's critical sections always execute on their owning task's
processor, so "local"/"remote" is simply "same cluster as `ti`" — the
same partitioned shared-memory convention [`super::common::set_blocking_objective_part_shm`]
and its `_shm`-suffixed constraint siblings already assume.

This module does not reproduce the closed-form bound's separate
local/remote decomposition (`BlockingBounds::local_blocking`/
`remote_blocking`): like every other `lp_blocking::*` analysis, it
reports only the combined per-task bound.
*/

use std::collections::HashMap;

use crate::blocking::mpcp::{gcs_response_times, mpcp_ceilings, remote_blocking_for_resource};
use crate::bound::Bound;
use crate::contention::{local_tasks, local_tasks_except, remote_tasks, request_instances, split_by_cluster, Cluster};
use crate::lp::model::{LinearExpression, LinearProgram};
use crate::lp::solver::Solver;
use crate::lp::varmapper::{BlockingType, VarMapper};
use crate::resource::{BlockingBounds, Interference, RequestBound, ResourceSharingInfo, TaskInfo};
use crate::time::Duration;

use super::common::{
    add_local_higher_priority_constraints_shm, add_local_lower_priority_constraints_shm, add_mutex_constraints, add_topology_constraints_shm,
    set_blocking_objective_part_shm, solve_merged, solve_per_task, TaskLp,
};

/// How many times `ti` itself requests each resource it accesses, used
/// to cap both direct and indirect blocking per resource ([LNR:09]
/// Constraints 15/16/19's `per_resource_counts`).
fn per_resource_counts(ti: &TaskInfo) -> HashMap<usize, u64> {
    let mut counts = HashMap::new();
    for req in ti.requests() {
        *counts.entry(req.resource_id()).or_insert(0u64) += req.num_requests() as u64;
    }
    counts
}

/// Constraints 15, 16, 19 [LNR:09]: caps direct blocking per resource
/// `ti` itself accesses, tightening the higher-priority-remote case
/// with the gcs remote-delay fixed point when it converges. Returns,
/// for every other task's contribution to each resource, the maximum
/// number of direct-blocking requests it can issue against `ti` — the
/// `db_bounds` table Constraints 17/18/20 are built from.
fn add_direct_blocking_constraints(
    vars: &mut VarMapper,
    info: &ResourceSharingInfo,
    ti: &TaskInfo,
    max_remote_delay: &impl Fn(usize) -> Bound<Duration>,
    lp: &mut LinearProgram,
) -> HashMap<(usize, usize), u64> {
    let counts = per_resource_counts(ti);
    let mut db_bounds = HashMap::new();
    let mut per_resource_exprs: HashMap<usize, LinearExpression> = HashMap::new();

    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        let hiprio = tx.priority() < ti.priority();
        for request in tx.requests() {
            let q = request.resource_id();
            let accessed = counts.contains_key(&q);
            db_bounds.insert((tx.id(), q), 0);

            if !hiprio || !accessed {
                let exp = per_resource_exprs.entry(q).or_default();
                for v in request_instances(request, ti) {
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                }
                if accessed {
                    let cap = request.max_num_requests(tx, ti.response()).min(counts[&q]);
                    db_bounds.insert((tx.id(), q), cap);
                }
            } else if let Bound::Bounded(interval) = max_remote_delay(q) {
                let recurrences = request.max_num_requests(tx, interval) * counts[&q];
                let cap = request.max_num_requests(tx, ti.response()).min(recurrences);
                db_bounds.insert((tx.id(), q), cap);

                let mut exp = LinearExpression::new();
                for v in request_instances(request, ti) {
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                }
                lp.add_inequality(exp, recurrences as f64);
            }
        }
    }

    for (q, exp) in per_resource_exprs {
        let bound = *counts.get(&q).unwrap_or(&0);
        lp.add_inequality(exp, bound as f64);
    }

    db_bounds
}

/// Constraint 17 [LNR:09]: the total indirect blocking a whole remote
/// task `tx` can impose on `ti` is bounded by the sum, over every local
/// peer of `tx` whose priority ceiling could boost one of `tx`'s own
/// gcs requests, of that peer's direct-blocking opportunities.
fn add_per_task_indirect_constraints(
    vars: &mut VarMapper,
    info: &ResourceSharingInfo,
    ti: &TaskInfo,
    db_bounds: &HashMap<(usize, usize), u64>,
    ceilings: &[Vec<u32>],
    lp: &mut LinearProgram,
) {
    let mut bounds: HashMap<usize, u64> = remote_tasks(info.tasks(), ti).map(|t| (t.id(), 0)).collect();

    for tx in remote_tasks(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            let db = *db_bounds.get(&(tx.id(), q)).unwrap_or(&0);
            if db == 0 {
                continue;
            }
            let prio = ceilings[tx.cluster()][q];
            for tl in local_tasks_except(info.tasks(), tx) {
                let can_preempt = tl.requests().iter().any(|lreq| ceilings[tl.cluster()][lreq.resource_id()] <= prio);
                if can_preempt {
                    *bounds.entry(tl.id()).or_insert(0) += db;
                }
            }
        }
    }

    for tx in remote_tasks(info.tasks(), ti) {
        let mut exp = LinearExpression::new();
        for request in tx.requests() {
            let q = request.resource_id();
            for v in request_instances(request, ti) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
            }
        }
        lp.add_inequality(exp, *bounds.get(&tx.id()).unwrap_or(&0) as f64);
    }
}

/// How many times a local peer of `owner` could preempt-and-boost past
/// `req`'s own priority ceiling while `req`'s gcs is held, counted from
/// the other peer's own direct-blocking opportunities on resources
/// other than `req`'s own — the per-request tightening Constraint 18
/// applies on top of Constraint 17's whole-task sum.
fn count_gcs_preemption_opportunities(
    info: &ResourceSharingInfo,
    req: &RequestBound,
    owner: &TaskInfo,
    ti: &TaskInfo,
    db_bounds: &HashMap<(usize, usize), u64>,
    ceilings: &[Vec<u32>],
) -> u64 {
    let req_prio = ceilings[owner.cluster()][req.resource_id()];
    let mut count = 0u64;

    for tx in local_tasks(info.tasks(), owner) {
        if tx.id() == owner.id() || tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            if q == req.resource_id() {
                continue;
            }
            let db = *db_bounds.get(&(tx.id(), q)).unwrap_or(&0);
            if db == 0 {
                continue;
            }
            if ceilings[tx.cluster()][q] >= req_prio {
                count += db;
            }
        }
    }
    count
}

/// Constraint 18 [LNR:09]: per-request-instance cap on indirect
/// blocking, tighter than Constraint 17's per-task sum since it only
/// counts preemption opportunities that can occur while this specific
/// gcs is held.
fn add_per_request_indirect_constraints(
    vars: &mut VarMapper,
    info: &ResourceSharingInfo,
    ti: &TaskInfo,
    db_bounds: &HashMap<(usize, usize), u64>,
    ceilings: &[Vec<u32>],
    lp: &mut LinearProgram,
) {
    for tx in remote_tasks(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            let mut exp = LinearExpression::new();
            for v in request_instances(request, ti) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
            }
            let bound = count_gcs_preemption_opportunities(info, request, tx, ti, db_bounds, ceilings);
            lp.add_inequality(exp, bound as f64);
        }
    }
}

/// Constraint 20 [LNR:09]: the total length of remote (direct +
/// indirect) blocking is capped by the sum, over every resource `ti`
/// itself requests, of that resource's gcs remote-delay fixed point —
/// the same quantity the closed-form bound adds up directly.
fn add_remote_blocking_constraint(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, remote_blocking_bound: u64, lp: &mut LinearProgram) {
    let mut exp = LinearExpression::new();
    for tx in remote_tasks(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            let length = request.request_length() as f64;
            for v in request_instances(request, ti) {
                exp.add_term(length, vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                exp.add_term(length, vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
            }
        }
    }
    lp.add_inequality(exp, remote_blocking_bound as f64);
}

/// Builds `ti`'s LP, or `None` if the gcs remote-delay fixed point does
/// not converge for one of `ti`'s own requests — in that case the
/// task's blocking is `Bound::Unlimited` outright and there is nothing
/// useful left to bound with an LP (Constraint 20 would have no finite
/// right-hand side).
fn build_task_lp(
    info: &ResourceSharingInfo,
    ti: &TaskInfo,
    ceilings: &[Vec<u32>],
    max_remote_delay: &impl Fn(usize) -> Bound<Duration>,
) -> Option<TaskLp> {
    let mut remote_blocking_bound = 0u64;
    for req in ti.requests() {
        match max_remote_delay(req.resource_id()) {
            Bound::Bounded(delay) => remote_blocking_bound += delay * req.num_requests() as u64,
            Bound::Unlimited => return None,
        }
    }

    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();

    set_blocking_objective_part_shm(&mut vars, info, ti, &mut lp, None, None);
    add_mutex_constraints(&mut vars, info, ti, &mut lp);
    add_local_higher_priority_constraints_shm(&mut vars, info, ti, &mut lp);
    add_topology_constraints_shm(&mut vars, info, ti, &mut lp);
    add_local_lower_priority_constraints_shm(&mut vars, info, ti, &mut lp);

    let db_bounds = add_direct_blocking_constraints(&mut vars, info, ti, max_remote_delay, &mut lp);
    add_per_task_indirect_constraints(&mut vars, info, ti, &db_bounds, ceilings, &mut lp);
    add_per_request_indirect_constraints(&mut vars, info, ti, &db_bounds, ceilings, &mut lp);
    add_remote_blocking_constraint(&mut vars, info, ti, remote_blocking_bound, &mut lp);

    vars.seal();
    Some(TaskLp { task_id: ti.id(), program: lp, num_vars: vars.num_vars() })
}

/// The LP-based MPCP blocking bound. `use_merged_lp` selects the merged
/// (spec.md §4.4.8) solving path over the per-task one; both must agree.
pub fn bounds<S: Solver>(info: &ResourceSharingInfo, solver: &S, use_merged_lp: bool) -> BlockingBounds {
    let ceilings = mpcp_ceilings(info);
    let clusters = split_by_cluster(info, None);
    let times: Vec<Vec<Vec<Duration>>> = clusters.iter().map(|c: &Cluster<'_>| gcs_response_times(c, &ceilings)).collect();

    let mut unlimited = Vec::new();
    let mut task_lps = Vec::new();

    for ti in info.tasks() {
        let max_remote_delay = |q: usize| remote_blocking_for_resource(q, ti, &clusters, &times);
        match build_task_lp(info, ti, &ceilings, &max_remote_delay) {
            Some(task_lp) => task_lps.push(task_lp),
            None => unlimited.push(ti.id()),
        }
    }

    let results = if use_merged_lp {
        solve_merged(solver, &task_lps, 1e-6)
    } else {
        solve_per_task(solver, &task_lps, 1e-6)
    };

    let mut bounds = BlockingBounds::for_info(info);
    for id in unlimited {
        bounds[id] = Interference::new(0, Duration::MAX);
    }
    for (task_lp, result) in task_lps.iter().zip(results) {
        let total = result.unwrap_or(u64::MAX);
        bounds[task_lp.task_id] = Interference::new(0, total);
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::solver::brute_force::BruteForceSolver;

    /// Mirrors `tests/scenarios.rs`'s S4: task 0's only remote
    /// contender on its one resource is task 2, whose gcs response time
    /// is its own request length (no local preemptor boosts past its
    /// ceiling). The LP-based bound must agree with the closed-form one
    /// computed by hand in that scenario.
    #[test]
    fn agrees_with_closed_form_gcs_response_time() {
        let mut info = ResourceSharingInfo::with_capacity(4);
        info.add_task(100, 10, 0, 0, 10, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 0, 1, 10, 0);
        info.add_request(1, 1, 1);
        info.add_task(100, 10, 1, 2, 10, 0);
        info.add_request(0, 1, 2);
        info.add_task(100, 10, 1, 3, 10, 0);
        info.add_request(1, 1, 1);

        let solver = BruteForceSolver { num_vars: 20 };
        let bounds = bounds(&info, &solver, false);
        assert_eq!(bounds.blocking_term(0), 3);
    }

    #[test]
    fn independent_task_is_never_blocked() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(0, 1, 3);

        let solver = BruteForceSolver { num_vars: 8 };
        let bounds = bounds(&info, &solver, false);
        assert_eq!(bounds.blocking_term(0), 0);
    }

    #[test]
    fn merged_and_per_task_paths_agree() {
        let mut info = ResourceSharingInfo::with_capacity(4);
        info.add_task(100, 10, 0, 0, 10, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 0, 1, 10, 0);
        info.add_request(1, 1, 1);
        info.add_task(100, 10, 1, 2, 10, 0);
        info.add_request(0, 1, 2);
        info.add_task(100, 10, 1, 3, 10, 0);
        info.add_request(1, 1, 1);

        let solver = BruteForceSolver { num_vars: 20 };
        let per_task = bounds(&info, &solver, false);
        let merged = bounds(&info, &solver, true);
        for i in 0..info.tasks().len() {
            assert_eq!(per_task.blocking_term(i), merged.blocking_term(i));
        }
    }
}
