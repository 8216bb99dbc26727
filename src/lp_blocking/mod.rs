/*! LP-based blocking analyses (spec.md §4.4-§4.6).

Grounded in `native/src/blocking/linprog/*.cpp`. Every analysis in this
module builds one [`crate::lp::LinearProgram`] per task (or a single
merged program for the whole task set, see [`common::solve_merged`]) by
calling a sequence of free functions that each add one constraint
family, then hands it to an external [`crate::lp::Solver`]. The shared
infrastructure lives in [`common`]; each protocol-specific submodule is
either a thin wrapper adding one restriction to a shared skeleton
([`global`] and its five variants; [`partitioned`] and its four) or,
for DPCP/spinlocks/PEDF, a family large enough to warrant its own
module.

- [`common`]: shared objective/constraint-building functions and the
  per-task/merged LP batch driver.
- [`partitioned`]: shared suspension-oblivious skeleton for
  [`fmlp_plus`], [`gfmlp`], [`dflp`] and [`omip`].
- [`global`]: shared suspension-aware skeleton for [`global_pip`],
  [`global_ppcp`], [`global_fmlp_plus`], [`global_rsb`] and
  [`global_no_progress`].
- [`dpcp`]: the LP-based Distributed Priority Ceiling Protocol bound.
- [`fmlp_plus`], [`gfmlp`], [`dflp`], [`omip`]: suspension-oblivious
  protocol bounds built on [`partitioned`].
- [`global_pip`], [`global_ppcp`], [`global_fmlp_plus`],
  [`global_rsb`], [`global_no_progress`]: suspension-aware
  multiprocessor locking-protocol bounds built on [`global`].
- [`spinlocks`]: non-nested spinlock protocol family (unordered,
  priority-based, priority-FIFO, preemptive-FIFO, MSRP).
- [`mpcp`]: the LP-based Multiprocessor Priority Ceiling Protocol bound,
  reusing [`crate::blocking::mpcp`]'s ceiling and gcs response-time
  fixed point.
- [`nested_fifo`]: the nested-critical-section FIFO spinlock bound
  built on [`crate::nested_cs`].
- [`pedf`]: partitioned-EDF blocking analysis driving
  [`crate::edf::qpa`] per cluster.
*/

pub mod common;
pub mod dflp;
pub mod dpcp;
pub mod fmlp_plus;
pub mod gfmlp;
pub mod global;
pub mod global_fmlp_plus;
pub mod global_no_progress;
pub mod global_pip;
pub mod global_ppcp;
pub mod global_rsb;
pub mod mpcp;
pub mod nested_fifo;
pub mod omip;
pub mod partitioned;
pub mod pedf;
pub mod spinlocks;
