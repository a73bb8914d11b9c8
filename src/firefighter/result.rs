use serde::Serialize;
use strum_macros::Display;

use crate::firefighter::variables::VarId;

/// Outcome reported by a solving engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NotSolved,
}

/// Dense 0/1 values of all variables of a model, indexed by `VarId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    pub fn new(values: Vec<bool>) -> Self {
        Self {
            values,
        }
    }

    /// All variables set to 0
    pub fn zeros(len: usize) -> Self {
        Self::new(vec![false; len])
    }

    /// Round relaxed solver values to binaries
    pub fn from_values<I: IntoIterator<Item=f64>>(values: I) -> Self {
        Self::new(values.into_iter().map(|value| value > 0.5).collect())
    }

    pub fn get(&self, var: VarId) -> bool {
        self.values[var.0]
    }

    pub fn set(&mut self, var: VarId, value: bool) {
        self.values[var.0] = value;
    }

    pub fn values(&self) -> &[bool] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of one solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    pub assignment: Option<Assignment>,
}

impl SolveResult {
    /// A result without any solution values
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            objective_value: None,
            assignment: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}
