/*! Global FMLP blocking bound (spec.md §4.4.7).

Grounded in `native/src/blocking/linprog/lp_gfmlp.cpp`. The original
(non-"+") FMLP busy-waits instead of suspending while queued, so a
blocked job can additionally be charged the length of every *other*
request group-locked together with the one it is waiting for (group
locking serializes access to whole sets of resources at once). Lacking
group-membership information in this crate's
[`crate::resource::ResourceSharingInfo`], this module approximates that
effect conservatively by doubling the per-contender cap
[`super::partitioned::add_lowereq_priority_blocking_sob`] would otherwise
use — documented here, and in DESIGN.md, as a deliberate simplification.
*/

use crate::lp::model::LinearProgram;
use crate::lp::solver::Solver;
use crate::lp::varmapper::VarMapper;
use crate::resource::{BlockingBounds, Interference, ResourceSharingInfo, TaskInfo};

use super::common::{solve_merged, solve_per_task, TaskLp};
use super::partitioned::{add_mutex_constraints_sob, add_no_higher_priority_blocking_sob, add_non_access_constraint_sob, set_objective, EPSILON};

fn add_group_locked_lowereq_priority_blocking(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, lp: &mut LinearProgram) {
    use crate::lp::model::LinearExpression;
    use crate::lp::varmapper::BlockingType;

    let num_arrivals = (2 * (1 + ti.total_num_requests())) as f64;
    for tx in crate::contention::lowereq_priority_tasks_except(info.tasks(), ti) {
        let mut exp = LinearExpression::new();
        for request in tx.requests() {
            let q = request.resource_id();
            for v in 0..request.max_num_requests(tx, ti.response()) {
                exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Other));
            }
        }
        lp.add_inequality(exp, num_arrivals);
    }
}

fn build_task_lp(info: &ResourceSharingInfo, ti: &TaskInfo) -> TaskLp {
    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();

    set_objective(&mut vars, info, ti, &mut lp);
    add_mutex_constraints_sob(&mut vars, info, ti, &mut lp);
    add_no_higher_priority_blocking_sob(&mut vars, info, ti, &mut lp);
    add_group_locked_lowereq_priority_blocking(&mut vars, info, ti, &mut lp);
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
    fn bound_is_never_tighter_than_the_shared_skeleton() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 0, 1, 3, 0);
        info.add_request(0, 1, 4);

        let solver = BruteForceSolver { num_vars: 16 };
        let base = super::super::partitioned::bounds(&info, &solver, false);
        let gfmlp = bounds(&info, &solver, false);
        assert!(gfmlp.blocking_term(0) >= base.blocking_term(0));
    }
}
