/*! Distributed FIFO Locking Protocol blocking bound (spec.md §4.4.7).

Grounded in `native/src/blocking/linprog/lp_dflp.cpp`. DFLP serves each
resource's FIFO queue per-cluster rather than per-task: a job can be
blocked by at most one contending request *per remote cluster* that
shares a resource with it, not one per contending task, since same-
cluster contenders are themselves serialized behind the same local
queue slot. This module reuses [`super::partitioned`]'s skeleton but
replaces its per-task arrival cap with a per-cluster one.
*/

use std::collections::HashMap;

use crate::lp::model::{LinearExpression, LinearProgram};
use crate::lp::solver::Solver;
use crate::lp::varmapper::{BlockingType, VarMapper};
use crate::resource::{BlockingBounds, Interference, ResourceSharingInfo, TaskInfo};

use super::common::{solve_merged, solve_per_task, TaskLp};
use super::partitioned::{add_mutex_constraints_sob, add_no_higher_priority_blocking_sob, add_non_access_constraint_sob, set_objective, EPSILON};

fn add_per_cluster_fifo_blocking(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    let num_arrivals = (1 + ti.total_num_requests()) as f64;

    let mut by_cluster: HashMap<usize, LinearExpression> = HashMap::new();
    for tx in crate::contention::lowereq_priority_tasks_except(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            let exp = by_cluster.entry(tx.cluster()).or_default();
            for v in 0..request.max_num_requests(tx, ti.response()) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Other));
            }
        }
    }

    for exp in by_cluster.into_values() {
        lp.add_inequality(exp, num_arrivals);
    }
}

fn build_task_lp(info: &ResourceSharingInfo, ti: &TaskInfo) -> TaskLp {
    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();

    set_objective(&mut vars, info, ti, &mut lp);
    add_mutex_constraints_sob(&mut vars, info, ti, &mut lp);
    add_no_higher_priority_blocking_sob(&mut vars, info, ti, &mut lp);
    add_per_cluster_fifo_blocking(&mut vars, info, ti, &mut lp);
    add_non_access_constraint_sob(&mut vars, info, ti, &mut lp);

    vars.seal();
    TaskLp { task_id: ti.id(), program: lp, num_vars: vars.num_vars() }
}

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
    fn same_cluster_contenders_share_one_fifo_slot() {
        let mut info = ResourceSharingInfo::with_capacity(3);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_request(0, 1, 5);
        info.add_task(100, 10, 1, 1, 3, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 1, 2, 3, 0);
        info.add_request(0, 1, 3);

        let solver = BruteForceSolver { num_vars: 24 };
        let bounds = bounds(&info, &solver, false);
        // both remote contenders sit in the same cluster (1), so only
        // one fifo slot's worth of delay (the longer of the two) can be
        // charged, not both.
        assert_eq!(bounds.blocking_term(0), 4);
    }
}
