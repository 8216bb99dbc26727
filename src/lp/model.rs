/*! The LP/ILP model built by a constraint pass: objective, equalities,
inequalities, and variable kind/bound declarations.

Grounded in `native/include/linprog/model.h`'s `LinearExpression` and
`LinearProgram`. The original manages `LinearExpression` lifetimes with
raw `new`/`delete`; here expressions are owned values and `LinearProgram`
just stores them directly, with no analogue needed for its destructor.
*/

/// One term of a linear expression: `coefficient * variable`.
pub type Term = (f64, u32);

/// A sum of [`Term`]s, built incrementally by a constraint-adding pass.
#[derive(Debug, Clone, Default)]
pub struct LinearExpression {
    terms: Vec<Term>,
}

impl LinearExpression {
    pub fn new() -> Self {
        LinearExpression::default()
    }

    pub fn add_term(&mut self, coefficient: f64, variable: u32) -> &mut Self {
        self.terms.push((coefficient, variable));
        self
    }

    pub fn sub_term(&mut self, coefficient: f64, variable: u32) -> &mut Self {
        self.add_term(-coefficient, variable)
    }

    /// Adds `variable` with an implicit coefficient of 1.
    pub fn add_var(&mut self, variable: u32) -> &mut Self {
        self.add_term(1.0, variable)
    }

    pub fn sub_var(&mut self, variable: u32) -> &mut Self {
        self.sub_term(1.0, variable)
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn has_terms(&self) -> bool {
        !self.terms.is_empty()
    }
}

/// A non-default lower/upper bound on one variable. By default every
/// variable in this crate's LPs has a lower bound of 0 and no upper
/// bound (constraint 1-families already cap indicator variables at 1
/// where that matters); exceptions are recorded here, mirroring
/// `model.h`'s `VariableRange`.
#[derive(Debug, Clone, Copy)]
pub struct VariableRange {
    pub variable_id: u32,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

/// `exp <= bound` or `exp == bound`, depending on which list it lives
/// in on [`LinearProgram`].
#[derive(Debug, Clone)]
pub struct Constraint {
    pub expression: LinearExpression,
    pub bound: f64,
}

/// A maximization problem, built incrementally the way every
/// `lp_blocking::*` constraint-adding function does: start from an
/// empty program, call a sequence of `add_*_constraints` functions over
/// `&mut LinearProgram`, then hand it to a [`super::solver::Solver`].
#[derive(Debug, Default)]
pub struct LinearProgram {
    objective: LinearExpression,
    equalities: Vec<Constraint>,
    inequalities: Vec<Constraint>,
    integer_variables: std::collections::BTreeSet<u32>,
    binary_variables: std::collections::BTreeSet<u32>,
    non_default_bounds: Vec<VariableRange>,
}

impl LinearProgram {
    pub fn new() -> Self {
        LinearProgram::default()
    }

    pub fn declare_variable_integer(&mut self, variable: u32) {
        self.integer_variables.insert(variable);
    }

    pub fn declare_variable_binary(&mut self, variable: u32) {
        self.binary_variables.insert(variable);
    }

    pub fn declare_variable_bounds(&mut self, variable: u32, lower: Option<f64>, upper: Option<f64>) {
        self.non_default_bounds.push(VariableRange {
            variable_id: variable,
            lower_bound: lower,
            upper_bound: upper,
        });
    }

    pub fn set_objective(&mut self, expression: LinearExpression) {
        self.objective = expression;
    }

    /// Adds `expression <= bound`, unless `expression` is empty (an
    /// always-trivially-true constraint is simply dropped, per
    /// `LinearProgram::add_inequality`).
    pub fn add_inequality(&mut self, expression: LinearExpression, bound: f64) {
        if expression.has_terms() {
            self.inequalities.push(Constraint { expression, bound });
        }
    }

    /// Adds `expression == value`, unless `expression` is empty.
    pub fn add_equality(&mut self, expression: LinearExpression, value: f64) {
        if expression.has_terms() {
            self.equalities.push(Constraint { expression, bound: value });
        }
    }

    pub fn objective(&self) -> &LinearExpression {
        &self.objective
    }

    pub fn objective_mut(&mut self) -> &mut LinearExpression {
        &mut self.objective
    }

    pub fn equalities(&self) -> &[Constraint] {
        &self.equalities
    }

    pub fn inequalities(&self) -> &[Constraint] {
        &self.inequalities
    }

    pub fn integer_variables(&self) -> &std::collections::BTreeSet<u32> {
        &self.integer_variables
    }

    pub fn binary_variables(&self) -> &std::collections::BTreeSet<u32> {
        &self.binary_variables
    }

    pub fn has_integer_variables(&self) -> bool {
        !self.integer_variables.is_empty()
    }

    pub fn has_binary_variables(&self) -> bool {
        !self.binary_variables.is_empty()
    }

    pub fn is_integer_variable(&self, variable: u32) -> bool {
        self.integer_variables.contains(&variable)
    }

    pub fn is_binary_variable(&self, variable: u32) -> bool {
        self.binary_variables.contains(&variable)
    }

    pub fn non_default_variable_ranges(&self) -> &[VariableRange] {
        &self.non_default_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inequality_is_dropped() {
        let mut lp = LinearProgram::new();
        lp.add_inequality(LinearExpression::new(), 5.0);
        assert!(lp.inequalities().is_empty());
    }

    #[test]
    fn nonempty_inequality_is_kept() {
        let mut lp = LinearProgram::new();
        let mut exp = LinearExpression::new();
        exp.add_var(0).sub_term(2.0, 1);
        lp.add_inequality(exp, 3.0);
        assert_eq!(lp.inequalities().len(), 1);
        assert_eq!(lp.inequalities()[0].expression.terms(), &[(1.0, 0), (-2.0, 1)]);
    }

    #[test]
    fn variable_kind_declarations_are_queryable() {
        let mut lp = LinearProgram::new();
        lp.declare_variable_binary(4);
        lp.declare_variable_integer(7);
        assert!(lp.is_binary_variable(4));
        assert!(!lp.is_binary_variable(7));
        assert!(lp.is_integer_variable(7));
        assert!(lp.has_binary_variables());
        assert!(lp.has_integer_variables());
    }
}
