/*! Linear-program framework underlying every `lp_blocking::*` analysis.

Grounded in `native/include/linprog/{varmapperbase,model,solver}.h` and
`native/include/lp_common.h`. Three concerns, one module each:

- [`varmapper`]: stable, hash-keyed variable numbering
  ([`varmapper::VarMapper`]).
- [`model`]: the LP/ILP itself ([`model::LinearProgram`],
  [`model::LinearExpression`]).
- [`solver`]: the external solver boundary ([`solver::Solver`],
  [`solver::Solution`]) — no concrete solver ships with this crate.

A `lp_blocking::*` analysis builds one `LinearProgram` per task (or one
shared program for every task, in merged-LP mode — see
[`crate::lp_blocking::common`]) by calling a sequence of free functions
that each add one constraint family, mirroring the original's multiple
base classes collapsed into composable functions over `&mut
LinearProgram`.
*/

pub mod model;
pub mod solver;
pub mod varmapper;

pub use model::{LinearExpression, LinearProgram};
pub use solver::{SolveError, Solution, Solver};
pub use varmapper::{BlockingType, InterferenceKind, VarMapper};
