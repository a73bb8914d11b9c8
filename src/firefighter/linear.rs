use std::collections::BTreeMap;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::firefighter::variables::VarId;

/// Sparse linear expression `Σ c·x + constant`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearExpr {
    pub terms: BTreeMap<VarId, f64>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_const(constant: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant,
        }
    }

    pub fn from_var(var: VarId) -> Self {
        Self::from_const(0.0).plus(var, 1.0)
    }

    /// Sum of all `vars` with coefficient 1
    pub fn sum<I: IntoIterator<Item=VarId>>(vars: I) -> Self {
        vars.into_iter().fold(Self::zero(), |expr, var| expr.plus(var, 1.0))
    }

    /// Add `coef * var` to this expression
    pub fn plus(mut self, var: VarId, coef: f64) -> Self {
        let c = self.terms.entry(var).or_insert(0.0);
        *c += coef;
        if *c == 0.0 {
            self.terms.remove(&var);
        }
        self
    }

    /// Subtract `var` from this expression
    pub fn minus(self, var: VarId) -> Self {
        self.plus(var, -1.0)
    }

    pub fn sub(mut self, other: &LinearExpr) -> Self {
        self.constant -= other.constant;
        for (&var, &coef) in &other.terms {
            self = self.plus(var, -coef);
        }
        self
    }

    /// Evaluate the expression for a dense 0/1 assignment
    pub fn eval(&self, values: &[bool]) -> f64 {
        self.terms.iter()
            .filter(|(var, _)| values[var.0])
            .map(|(_, coef)| coef)
            .sum::<f64>() + self.constant
    }
}

/// Comparison sense of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "=",
        }
    }
}

/// Semantic family a constraint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
         Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintTag {
    InitialCondition,
    ActionBudget,
    ActionLegality,
    BurningPersistence,
    FireSpread,
    FireJustification,
    DefendedPersistence,
    DefenseEffect,
    DefenseSpread,
    DefenseJustification,
    MutualExclusion,
}

/// A labelled linear constraint `Σ c·x ⋈ rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub label: String,
    pub tag: ConstraintTag,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Create the constraint `lhs ⋈ rhs`, moving every variable to the left
    /// and every constant to the right
    pub fn new(label: String, tag: ConstraintTag, lhs: LinearExpr, sense: Sense, rhs: LinearExpr) -> Self {
        let mut expr = lhs.sub(&rhs);
        let rhs = -expr.constant;
        expr.constant = 0.0;
        Self {
            label,
            tag,
            expr,
            sense,
            rhs,
        }
    }

    /// Is the constraint satisfied by the dense 0/1 assignment `values`?
    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        let lhs = self.expr.eval(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + 1e-9,
            Sense::Ge => lhs >= self.rhs - 1e-9,
            Sense::Eq => (lhs - self.rhs).abs() <= 1e-9,
        }
    }
}
