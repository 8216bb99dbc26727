/*! Nested critical-section FIFO spinlock blocking bound
(spec.md §4.4.5 "Nested locks (FIFO)").

Grounded in `native/src/blocking/linprog/lp_spinlock_nested_fifo.cpp`,
built over the data model in [`crate::nested_cs`]. A blocker's critical
section only delays the analyzed task `ti` for as long as it is
actually executing — but if that section is *nested* inside an outer
one, the blocker also holds every one of its ancestor locks for the
same span, so `ti` can be delayed by the whole chain, not just the
innermost section. Each critical section therefore gets two LP
variables instead of one:

- **Direct** ([`crate::lp::varmapper::BlockingType::Direct`]): this
  section executes and is itself the reason `ti` waits.
- **Nested** (reusing
  [`crate::lp::varmapper::BlockingType::Indirect`], the same kind of
  tag reuse [`super::spinlocks`] makes for "arrival"): this section
  executes only because one of its ancestors is (transitively)
  blocking `ti`.

Three constraint families tie them together: a section's Direct and
Nested variants are mutually exclusive (it contributes to `ti`'s delay
in at most one way at a time); a section can only be counted as Nested
if its immediate parent is itself Direct or Nested; and the outermost
section of any chain can never be Nested (it has no parent to inherit
from). This crate's version folds the original's further per-cluster
dominance constraints (which restrict the set of outer-lock subsets
that could plausibly serialize with `ti`'s job) into the blanket
per-instance mutex cap above — a simplification documented in
DESIGN.md.
*/

use std::collections::HashSet;

use crate::lp::model::{LinearExpression, LinearProgram};
use crate::lp::solver::Solver;
use crate::lp::varmapper::{BlockingType, VarMapper};
use crate::nested_cs::{CriticalSectionsOfTask, CriticalSectionsOfTaskset, NO_PARENT};
use crate::resource::{BlockingBounds, Interference, ResourceSharingInfo, TaskInfo};

use super::common::{solve_merged, solve_per_task, TaskLp};

pub const EPSILON: f64 = 1e-6;

/// A unique request id for the (critical-section index, job-instance)
/// pair, packed so that distinct critical sections or distinct
/// instances never collide.
fn req_id(cs_index: usize, instance: u64) -> usize {
    cs_index * 4096 + instance as usize
}

/// The ancestor chain of `cs_index`, root first, `cs_index` last.
fn chain_indices(task: &CriticalSectionsOfTask, cs_index: usize) -> Vec<usize> {
    let mut chain = vec![cs_index];
    let mut cur = task.cs()[cs_index].outer;
    while cur != NO_PARENT {
        chain.push(cur as usize);
        cur = task.cs()[cur as usize].outer;
    }
    chain.reverse();
    chain
}

/// Every critical section of `tx` that could delay `ti`: the union,
/// over every section accessing a resource `ti` itself requests, of
/// that section's whole ancestor chain.
fn relevant_sections(tx_cs: &CriticalSectionsOfTask, accessed: &HashSet<usize>) -> HashSet<usize> {
    let mut relevant = HashSet::new();
    for (idx, cs) in tx_cs.cs().iter().enumerate() {
        if accessed.contains(&cs.resource_id) {
            for node in chain_indices(tx_cs, idx) {
                relevant.insert(node);
            }
        }
    }
    relevant
}

fn build_task_lp(info: &ResourceSharingInfo, nested: &CriticalSectionsOfTaskset, ti: &TaskInfo) -> TaskLp {
    let mut vars = VarMapper::new();
    let mut lp = LinearProgram::new();
    let mut objective = LinearExpression::new();

    let accessed: HashSet<usize> = ti.requests().iter().map(|r| r.resource_id()).collect();

    for tx in info.tasks() {
        if tx.id() == ti.id() {
            continue;
        }
        let tx_cs = &nested.tasks()[tx.id()];
        let relevant = relevant_sections(tx_cs, &accessed);
        if relevant.is_empty() {
            continue;
        }

        let instances = tx.max_num_jobs(ti.response());
        for &idx in &relevant {
            let cs = tx_cs.cs()[idx];
            for v in 0..instances {
                let rid = req_id(idx, v);
                let direct = vars.lookup(tx.id(), cs.resource_id, rid, BlockingType::Direct);
                let nested_var = vars.lookup(tx.id(), cs.resource_id, rid, BlockingType::Indirect);

                let mut mutex = LinearExpression::new();
                mutex.add_var(direct);
                mutex.add_var(nested_var);
                lp.add_inequality(mutex, 1.0);

                if cs.outer == NO_PARENT {
                    let mut exp = LinearExpression::new();
                    exp.add_var(nested_var);
                    lp.add_equality(exp, 0.0);
                } else {
                    let parent_idx = cs.outer as usize;
                    let parent_cs = tx_cs.cs()[parent_idx];
                    let parent_rid = req_id(parent_idx, v);
                    let parent_direct = vars.lookup(tx.id(), parent_cs.resource_id, parent_rid, BlockingType::Direct);
                    let parent_nested = vars.lookup(tx.id(), parent_cs.resource_id, parent_rid, BlockingType::Indirect);

                    let mut implication = LinearExpression::new();
                    implication.add_var(nested_var);
                    implication.sub_var(parent_direct);
                    implication.sub_var(parent_nested);
                    lp.add_inequality(implication, 0.0);
                }

                let length = cs.length as f64;
                objective.add_term(length, direct);
                objective.add_term(length, nested_var);
            }
        }
    }

    lp.set_objective(objective);
    vars.seal();
    TaskLp { task_id: ti.id(), program: lp, num_vars: vars.num_vars() }
}

/// The nested-critical-section FIFO spinlock blocking bound.
pub fn bounds<S: Solver>(info: &ResourceSharingInfo, nested: &CriticalSectionsOfTaskset, solver: &S, use_merged_lp: bool) -> BlockingBounds {
    let task_lps: Vec<TaskLp> = info.tasks().iter().map(|ti| build_task_lp(info, nested, ti)).collect();

    let results = if use_merged_lp { solve_merged(solver, &task_lps, EPSILON) } else { solve_per_task(solver, &task_lps, EPSILON) };

    let mut out = BlockingBounds::for_info(info);
    for (task_lp, result) in task_lps.iter().zip(results) {
        out[task_lp.task_id] = Interference::new(0, result.unwrap_or(u64::MAX));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::solver::brute_force::BruteForceSolver;

    #[test]
    fn nested_blocker_charges_the_whole_chain() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(1, 1, 0); // ti requests only resource 1 (r)
        info.add_task(100, 10, 0, 1, 5, 0);
        info.add_request(0, 1, 0);
        info.add_request(1, 1, 0);

        let mut nested = CriticalSectionsOfTaskset::new();
        nested.new_task(); // ti: no critical sections of its own modeled here
        {
            let blocker = nested.new_task();
            let q = blocker.add(0, 2, NO_PARENT); // outer: resource 0, length 2
            blocker.add(1, 3, q as i32); // inner: resource 1, length 3
        }

        let solver = BruteForceSolver { num_vars: 20 };
        let bounds = bounds(&info, &nested, &solver, false);
        assert_eq!(bounds.blocking_term(0), 5); // L_q + L_r
    }

    #[test]
    fn unrelated_resource_contributes_nothing() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(2, 1, 0);
        info.add_task(100, 10, 0, 1, 5, 0);
        info.add_request(0, 1, 0);
        info.add_request(1, 1, 0);

        let mut nested = CriticalSectionsOfTaskset::new();
        nested.new_task();
        {
            let blocker = nested.new_task();
            let q = blocker.add(0, 2, NO_PARENT);
            blocker.add(1, 3, q as i32);
        }

        let solver = BruteForceSolver { num_vars: 20 };
        let bounds = bounds(&info, &nested, &solver, false);
        assert_eq!(bounds.blocking_term(0), 0);
    }
}
