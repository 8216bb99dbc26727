/*! The `Solver`/`Solution` collaborator interface.

Grounded in `native/include/linprog/solver.h`. The original's
`linprog_solve` macro dispatches at compile time to `cpx_solve` (CPLEX)
or `glpk_solve` (GLPK) and falls back to `assert(0)` if neither is
configured in — confirming that a concrete solver was always an
external, optional collaborator rather than part of the core library.
This crate carries that same boundary forward as a trait: no concrete
MIP/LP solver is shipped, only the interface and (for this crate's own
tests) a small brute-force implementation.
*/

use auto_impl::auto_impl;
use thiserror::Error;

use super::model::LinearProgram;

/// Why a [`Solver`] could not produce a solution.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum SolveError {
    /// The LP/ILP has no feasible solution.
    #[error("linear program is infeasible")]
    Infeasible,
    /// The solver gave up (e.g. iteration or time limit) without
    /// deciding feasibility either way.
    #[error("solver did not converge to a solution")]
    DidNotConverge,
}

/// A solved assignment of values to every variable a [`LinearProgram`]
/// declared. Grounded in `solver.h`'s `Solution` class: `get_value` is
/// the only primitive a concrete solver backend must provide,
/// `evaluate` is implemented once in terms of it.
pub trait Solution {
    fn value_of(&self, variable: u32) -> f64;

    /// Evaluates a linear expression under this solution, i.e.
    /// `sum(coefficient * value_of(variable))` over its terms.
    /// Mirrors `Solution::evaluate`'s default implementation.
    fn evaluate(&self, expression: &super::model::LinearExpression) -> f64 {
        expression.terms().iter().map(|&(coeff, var)| coeff * self.value_of(var)).sum()
    }
}

/// An external LP/ILP solver. Never implemented by this crate itself
/// outside of tests — callers supply their own backend (e.g. a CPLEX or
/// GLPK binding) the same way the original required `CONFIG_HAVE_CPLEX`/
/// `CONFIG_HAVE_GLPK` to be configured in.
#[auto_impl(&, Box, Rc)]
pub trait Solver {
    fn solve(&self, lp: &LinearProgram) -> Result<Box<dyn Solution>, SolveError>;
}

/// Rounds a raw LP objective value up to the nearest integer, treating
/// floating-point noise within `epsilon` of the next integer as if it
/// had already reached it. Mirrors `GlobalSuspensionAwareLP::solve`'s
/// snapping of `assumed_interference` before truncation.
pub fn round_up_with_epsilon(value: f64, epsilon: f64) -> u64 {
    let ceil = value.ceil();
    if ceil - value < epsilon {
        ceil as u64
    } else {
        value.floor() as u64
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_snaps_floating_point_noise() {
        assert_eq!(round_up_with_epsilon(2.9999999, 1e-6), 3);
        assert_eq!(round_up_with_epsilon(2.5, 1e-6), 2);
    }
}
