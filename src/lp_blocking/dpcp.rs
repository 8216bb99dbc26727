/*! LP-based Distributed Priority Ceiling Protocol (DPCP) blocking bound.

Grounded in `native/src/blocking/linprog/lp_dpcp.cpp`. Differs from the
closed-form [`crate::blocking::dpcp`] bound by bounding each higher- and
lower-priority task's contribution precisely through the LP's
direct/indirect blocking variables instead of a single greedy sum, at
the cost of needing a per-resource maximum-wait-time fixed point
([`MaxWaitTimes`]) to cap how many times a higher-priority remote
request can recur within the window `ti` might wait.
*/

use std::collections::HashMap;

use crate::bound::Bound;
use crate::contention::{higher_priority_tasks, lowereq_priority_tasks_except, priority_ceilings, requests_in_cluster};
use crate::lp::model::{LinearExpression, LinearProgram};
use crate::lp::solver::Solver;
use crate::lp::varmapper::{BlockingType, VarMapper};
use crate::resource::{BlockingBounds, Cpu, ResourceLocality, ResourceSharingInfo, TaskInfo};
use crate::time::Duration;

use super::common::{
    add_local_lower_priority_constraints, add_mutex_constraints, add_topology_constraints, set_blocking_objective, solve_merged,
    solve_per_task, TaskLp,
};

/// Memoized per-resource maximum wait time for one analyzed task, per
/// `lp_dpcp.cpp`'s `MaxWaitTimes`: a response-time-like fixed point
/// bounding how long `ti` can wait to acquire a given resource, used to
/// cap how many higher-priority remote requests can appear in that
/// window (spec.md §4.4.5 "Wait-time caps").
struct MaxWaitTimes<'a> {
    info: &'a ResourceSharingInfo,
    locality: &'a ResourceLocality,
    ti: &'a TaskInfo,
    ceilings: &'a [u32],
    cache: HashMap<usize, Bound<Duration>>,
}

impl<'a> MaxWaitTimes<'a> {
    fn new(info: &'a ResourceSharingInfo, locality: &'a ResourceLocality, ti: &'a TaskInfo, ceilings: &'a [u32]) -> Self {
        MaxWaitTimes { info, locality, ti, ceilings, cache: HashMap::new() }
    }

    fn get(&mut self, res_id: usize) -> Bound<Duration> {
        if let Some(&v) = self.cache.get(&res_id) {
            return v;
        }
        let v = self.bound_wait_time(res_id);
        self.cache.insert(res_id, v);
        v
    }

    fn bound_wait_time(&self, res_id: usize) -> Bound<Duration> {
        let cluster: Cpu = self.locality.get(res_id);

        let own_length = self
            .ti
            .requests()
            .iter()
            .filter(|r| r.resource_id() == res_id)
            .map(|r| r.request_length())
            .max()
            .unwrap_or(0);

        let mut delay_by_lower = 0;
        for tx in lowereq_priority_tasks_except(self.info.tasks(), self.ti) {
            if let Some(c) = cluster {
                for request in requests_in_cluster(tx.requests(), self.locality, c) {
                    let q = request.resource_id();
                    if self.ceilings[q] <= self.ti.priority() {
                        delay_by_lower = delay_by_lower.max(request.request_length());
                    }
                }
            }
        }

        let mut next_estimate = own_length + delay_by_lower;
        let mut estimate = 0;

        while next_estimate <= self.ti.response() && next_estimate != estimate {
            estimate = next_estimate;
            let mut delay_by_higher = 0;
            if let Some(c) = cluster {
                for tx in higher_priority_tasks(self.info.tasks(), self.ti) {
                    for request in requests_in_cluster(tx.requests(), self.locality, c) {
                        let nreqs = request.max_num_requests(tx, estimate);
                        delay_by_higher += nreqs * request.request_length();
                    }
                }
            }
            next_estimate = own_length + delay_by_lower + delay_by_higher;
        }

        if estimate <= self.ti.response() {
            Bound::Bounded(estimate)
        } else {
            Bound::Unlimited
        }
    }
}

/// Constraint 8: `ti`'s maximum wait times in each cluster it accesses
/// limit how many times higher-priority remote requests can directly or
/// indirectly delay it.
fn add_max_wait_time_constraints(
    vars: &mut VarMapper,
    info: &ResourceSharingInfo,
    locality: &ResourceLocality,
    ti: &TaskInfo,
    ceilings: &[u32],
    lp: &mut LinearProgram,
) {
    let mut max_wait = MaxWaitTimes::new(info, locality, ti, ceilings);

    for tx in higher_priority_tasks(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            let Some(c) = locality.get(q) else { continue };

            let mut max_num_reqs = 0u64;
            let mut bounded = true;
            for ti_req in requests_in_cluster(ti.requests(), locality, c) {
                match max_wait.get(ti_req.resource_id()) {
                    Bound::Unlimited => {
                        bounded = false;
                        break;
                    }
                    Bound::Bounded(wait) => {
                        max_num_reqs += request.max_num_requests(ti, wait) * ti_req.num_requests() as u64;
                    }
                }
            }

            if bounded {
                let mut exp = LinearExpression::new();
                for v in 0..request.max_num_requests(tx, ti.response()) {
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                }
                lp.add_inequality(exp, max_num_reqs as f64);
            }
        }
    }
}

/// Substitute for constraint 8 when `use_rta` is false: simply forbid
/// blocking from resources in clusters `ti` never accesses at all.
fn add_independent_cluster_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, locality: &ResourceLocality, ti: &TaskInfo, lp: &mut LinearProgram) {
    let accessed: std::collections::HashSet<Cpu> = ti.requests().iter().map(|r| locality.get(r.resource_id())).collect();

    let mut exp = LinearExpression::new();
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            if !accessed.contains(&locality.get(q)) {
                for v in 0..request.max_num_requests(tx, ti.response()) {
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                }
            }
        }
    }
    lp.add_equality(exp, 0.0);
}

/// Constraint 6: a resource whose priority ceiling is lower priority
/// than `ti` itself cannot block `ti` at all (by definition of the
/// priority-ceiling protocol).
fn add_conflict_set_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, ti: &TaskInfo, ceilings: &[u32], lp: &mut LinearProgram) {
    let mut exp = LinearExpression::new();
    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        for request in tx.requests() {
            let q = request.resource_id();
            if ceilings[q] > ti.priority() {
                for v in 0..request.max_num_requests(tx, ti.response()) {
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Indirect));
                }
            }
        }
    }
    lp.add_equality(exp, 0.0);
}

/// Constraint 7: each of `ti`'s requests can be directly delayed by a
/// lower-or-equal-priority task at most once per cluster access.
fn add_atmostonce_lower_prio_constraints(vars: &mut VarMapper, info: &ResourceSharingInfo, locality: &ResourceLocality, ti: &TaskInfo, ceilings: &[u32], lp: &mut LinearProgram) {
    let mut per_cluster_counts: HashMap<Cpu, u64> = HashMap::new();
    for req in ti.requests() {
        *per_cluster_counts.entry(locality.get(req.resource_id())).or_insert(0) += req.num_requests() as u64;
    }

    let mut constraints: HashMap<Cpu, LinearExpression> = HashMap::new();
    for tx in lowereq_priority_tasks_except(info.tasks(), ti) {
        for request in tx.requests() {
            let q = request.resource_id();
            if ceilings[q] <= ti.priority() {
                let c = locality.get(q);
                let exp = constraints.entry(c).or_default();
                for v in 0..request.max_num_requests(tx, ti.response()) {
                    exp.add_var(vars.lookup(tx.id(), q, v as usize, BlockingType::Direct));
                }
            }
        }
    }

    for (c, exp) in constraints {
        lp.add_inequality(exp, *per_cluster_counts.get(&c).unwrap_or(&0) as f64);
    }
}

fn build_task_lp(info: &ResourceSharingInfo, locality: &ResourceLocality, ti: &TaskInfo, ceilings: &[u32], use_rta: bool) -> TaskLp {
    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();

    set_blocking_objective(&mut vars, info, locality, ti, &mut lp, None, None);
    add_mutex_constraints(&mut vars, info, ti, &mut lp);
    add_topology_constraints(&mut vars, info, locality, ti, &mut lp);
    add_local_lower_priority_constraints(&mut vars, info, locality, ti, &mut lp);
    add_atmostonce_lower_prio_constraints(&mut vars, info, locality, ti, ceilings, &mut lp);
    add_conflict_set_constraints(&mut vars, info, ti, ceilings, &mut lp);

    if use_rta {
        add_max_wait_time_constraints(&mut vars, info, locality, ti, ceilings, &mut lp);
    } else {
        add_independent_cluster_constraints(&mut vars, info, locality, ti, &mut lp);
    }

    vars.seal();
    TaskLp { task_id: ti.id(), program: lp, num_vars: vars.num_vars() }
}

/// The LP-based DPCP blocking bound. `use_merged_lp` selects the merged
/// (spec.md §4.4.8) solving path over the per-task one; both must agree.
pub fn bounds<S: Solver>(info: &ResourceSharingInfo, locality: &ResourceLocality, solver: &S, use_rta: bool, use_merged_lp: bool) -> BlockingBounds {
    let ceilings = priority_ceilings(info);
    let task_lps: Vec<TaskLp> = info.tasks().iter().map(|ti| build_task_lp(info, locality, ti, &ceilings, use_rta)).collect();

    let results = if use_merged_lp {
        solve_merged(solver, &task_lps, 1e-6)
    } else {
        solve_per_task(solver, &task_lps, 1e-6)
    };

    let mut bounds = BlockingBounds::for_info(info);
    for (task_lp, result) in task_lps.iter().zip(results) {
        let total = result.unwrap_or(u64::MAX);
        bounds[task_lp.task_id] = crate::resource::Interference::new(0, total);
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::solver::brute_force::BruteForceSolver;

    #[test]
    fn independent_cluster_is_never_blocked() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 3);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(1, 1, 3);

        let mut locality = ResourceLocality::new();
        locality.assign_resource(0, 0);
        locality.assign_resource(1, 1);

        let solver = BruteForceSolver { num_vars: 8 };
        let bounds = bounds(&info, &locality, &solver, false, false);
        assert_eq!(bounds.blocking_term(0), 0);
        assert_eq!(bounds.blocking_term(1), 0);
    }

    #[test]
    fn shared_resource_blocks_lower_priority_task() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(0, 1, 3);

        let mut locality = ResourceLocality::new();
        locality.assign_resource(0, 0);

        let solver = BruteForceSolver { num_vars: 8 };
        let bounds = bounds(&info, &locality, &solver, false, false);
        // task 1 (lower priority, remote) may be blocked once by task 0's
        // 4-unit request.
        assert_eq!(bounds.blocking_term(1), 4);
    }
}
