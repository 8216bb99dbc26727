/*! Global no-progress spin-lock LP (spec.md §4.4.6).

Grounded in `native/src/blocking/linprog/lp_no_progress_{fifo,priority}.cpp`.
A no-progress spin lock gives no liveness guarantee to a waiting job
beyond eventually acquiring the lock, so the per-task slack refinement
[`super::global::add_slack_constraints`] relies on (an individual cap
derived from *that* task's own workload bound) does not hold: any other
task may in principle spin for as long as the aggregate workload
constraint allows. This wrapper therefore omits the slack constraints
and keeps only the aggregate workload cap, documented here as the
deliberate simplification relative to the original's detailed
per-variant busy-period argument.
*/

use crate::lp::model::LinearProgram;
use crate::lp::solver::Solver;
use crate::lp::varmapper::VarMapper;
use crate::resource::{BlockingBounds, Interference, ResourceLocality, ResourceSharingInfo, TaskInfo};

use super::common::{add_local_lower_priority_constraints, add_mutex_constraints, add_topology_constraints, solve_merged, solve_per_task, TaskLp};
use super::global::{add_generic_non_access_direct_constraints, add_stalling_interference_for_independent_tasks, add_workload_constraints, set_global_objective, EPSILON};

fn build_task_lp(info: &ResourceSharingInfo, locality: &ResourceLocality, ti: &TaskInfo, num_procs: usize) -> TaskLp {
    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();

    set_global_objective(&mut vars, info, ti, num_procs, &mut lp);
    add_mutex_constraints(&mut vars, info, ti, &mut lp);
    add_topology_constraints(&mut vars, info, locality, ti, &mut lp);
    add_local_lower_priority_constraints(&mut vars, info, locality, ti, &mut lp);
    add_workload_constraints(&mut vars, info, ti, &mut lp);
    add_stalling_interference_for_independent_tasks(&mut vars, info, ti, &mut lp);
    add_generic_non_access_direct_constraints(&mut vars, info, ti, &mut lp);

    vars.seal();
    TaskLp { task_id: ti.id(), program: lp, num_vars: vars.num_vars() }
}

pub fn bounds<S: Solver>(info: &ResourceSharingInfo, locality: &ResourceLocality, solver: &S, num_procs: usize, use_merged_lp: bool) -> BlockingBounds {
    let task_lps: Vec<TaskLp> = info.tasks().iter().map(|ti| build_task_lp(info, locality, ti, num_procs)).collect();

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
    fn no_progress_bound_is_never_worse_than_the_slack_refined_one() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_request(0, 1, 3);
        info.add_task(100, 10, 1, 1, 3, 0);
        info.add_request(0, 1, 3);

        let locality = ResourceLocality::new();
        let solver = BruteForceSolver { num_vars: 20 };
        let relaxed = bounds(&info, &locality, &solver, 2, false);
        let refined = super::super::global::bounds(&info, &locality, &solver, 2, false);
        assert!(relaxed.blocking_term(1) >= refined.blocking_term(1));
    }
}
