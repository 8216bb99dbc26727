/*! Schedulability tests for *earliest-deadline first* (**EDF**) scheduling

This module collects the task-set-wide classical schedulability tests
for global/partitioned EDF on *m* identical processors ([`baker`],
[`gfb`], [`bcl`], [`bcl_iterative`], [`rta_gedf`], [`baruah`],
[`ffdbf`], [`load`], [`la`], [`qpa`], [`gel_pl`]), each grounded in
`schedcat`'s `native/src/edf/*.cpp`.

## Citation

Each test cites its own originating paper in its module doc comment.

Please cite the relevant paper(s) when using functionality from this module
for academic work.

 */

use thiserror::Error;

use crate::task::TaskSet;

pub mod baker;
pub mod baruah;
pub mod bcl;
pub mod bcl_iterative;
pub mod ffdbf;
pub mod gel_pl;
pub mod gfb;
pub mod la;
pub mod load;
pub mod qpa;
pub mod rta_gedf;

/// Preconditions a particular classical EDF schedulability test requires of
/// its input task set (spec.md §7: `InfeasibleInput` / `PreconditionMismatch`).
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum PreconditionError {
    #[error("task set contains an infeasible task (C == 0, or D/T < C + S)")]
    Infeasible,
    #[error("task set utilization exceeds the number of available processors")]
    Overutilized,
    #[error("this test requires constrained deadlines (D <= T)")]
    UnconstrainedDeadline,
    #[error("this test does not support self-suspending tasks")]
    SelfSuspending,
}

/// Check the precondition bundle most classical global-EDF tests share.
/// Every `is_schedulable` entry point in this module calls this internally
/// and downgrades a failure to `false`, matching spec.md §7
/// ("surfaced as 'not schedulable' unless the caller disables checks");
/// `try_is_schedulable` variants propagate the concrete reason instead.
pub(crate) fn check_common(
    ts: &TaskSet,
    m: usize,
    require_constrained: bool,
    forbid_suspension: bool,
) -> Result<(), PreconditionError> {
    if !ts.has_only_feasible_tasks() {
        return Err(PreconditionError::Infeasible);
    }
    if !ts.is_not_overutilized(m) {
        return Err(PreconditionError::Overutilized);
    }
    if require_constrained && !ts.has_only_constrained_deadlines() {
        return Err(PreconditionError::UnconstrainedDeadline);
    }
    if forbid_suspension && !ts.has_no_self_suspending_tasks() {
        return Err(PreconditionError::SelfSuspending);
    }
    Ok(())
}
