use std::collections::BTreeMap;

use crate::firefighter::{constraints::ConstraintBuilder,
                         error::ModelError,
                         instance::GraphSpec,
                         linear::{Constraint, ConstraintTag, LinearExpr},
                         objective,
                         result::Assignment,
                         settings::FormulationSettings,
                         variables::VariableSpace};

/// A complete 0/1 maximisation model, read-only once assembled
#[derive(Debug, Clone)]
pub struct Model {
    space: VariableSpace,
    settings: FormulationSettings,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

/// Lower `spec` into a model. Every validation error is raised here, before any solve.
pub fn build_model(spec: &GraphSpec, settings: &FormulationSettings) -> Result<Model, ModelError> {
    let space = VariableSpace::new(spec)?;
    let constraints = ConstraintBuilder::new(spec, &space, settings)?.build();
    let objective = objective::saved_vertices(&space);
    ModelAssembler::assemble(space, settings.clone(), constraints, objective)
}

/// Combines variables, constraints and objective into a `Model`
pub struct ModelAssembler;

impl ModelAssembler {
    pub fn assemble(space: VariableSpace,
                    settings: FormulationSettings,
                    constraints: Vec<Constraint>,
                    objective: LinearExpr) -> Result<Model, ModelError> {
        if constraints.is_empty() {
            log::warn!("Refusing to assemble a model without constraints");
            return Err(ModelError::EmptyModel);
        }

        let model = Model {
            space,
            settings,
            constraints,
            objective,
        };

        for (tag, count) in model.tag_counts() {
            log::debug!("Generated {} {} constraints", count, tag);
        }
        log::info!("Assembled model. vertices={}, horizon={}, variables={}, constraints={}.",
            model.space.num_vertices(), model.space.horizon(), model.space.len(),
            model.constraints.len());

        Ok(model)
    }
}

impl Model {
    pub fn space(&self) -> &VariableSpace {
        &self.space
    }

    pub fn settings(&self) -> &FormulationSettings {
        &self.settings
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// All constraints of the family `tag`
    pub fn constraints_tagged(&self, tag: ConstraintTag) -> impl Iterator<Item=&Constraint> {
        self.constraints.iter().filter(move |c| c.tag == tag)
    }

    /// Number of constraints per family
    pub fn tag_counts(&self) -> BTreeMap<ConstraintTag, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.constraints {
            *counts.entry(c.tag).or_insert(0) += 1;
        }
        counts
    }

    /// Constraints violated by `assignment`
    pub fn violations<'a>(&'a self, assignment: &Assignment) -> Result<Vec<&'a Constraint>, ModelError> {
        self.check_len(assignment)?;
        Ok(self.constraints.iter()
            .filter(|c| !c.is_satisfied(assignment.values()))
            .collect())
    }

    /// Does `assignment` satisfy every constraint?
    pub fn is_feasible(&self, assignment: &Assignment) -> Result<bool, ModelError> {
        self.check_len(assignment)?;
        Ok(self.constraints.iter().all(|c| c.is_satisfied(assignment.values())))
    }

    /// Value of the objective under `assignment`
    pub fn objective_value(&self, assignment: &Assignment) -> Result<f64, ModelError> {
        self.check_len(assignment)?;
        Ok(self.objective.eval(assignment.values()))
    }

    fn check_len(&self, assignment: &Assignment) -> Result<(), ModelError> {
        if assignment.len() != self.space.len() {
            return Err(ModelError::IncompleteAssignment {
                expected: self.space.len(),
                found: assignment.len(),
            });
        }
        Ok(())
    }

    /// Render the model in CPLEX LP format
    pub fn to_lp(&self) -> String {
        let mut out = String::new();
        out.push_str("Maximize\n obj: ");
        out.push_str(&self.fmt_lin(&self.objective));
        out.push_str("\nSubject To\n");
        for c in &self.constraints {
            out.push_str(&format!(" {}: {} {} {}\n",
                                  c.label, self.fmt_lin(&c.expr), c.sense.symbol(), fmt_num(c.rhs)));
        }
        out.push_str("Binary\n");
        for var in self.space.variables() {
            out.push_str(&format!(" {}\n", var.name));
        }
        out.push_str("End\n");
        out
    }

    fn fmt_lin(&self, expr: &LinearExpr) -> String {
        let mut parts: Vec<String> = expr.terms.iter()
            .map(|(&var, &coef)| format!("{} {}", fmt_coef(coef), self.space.variable(var).name))
            .collect();
        if parts.is_empty() {
            parts.push("0".to_string());
        }
        if expr.constant != 0.0 {
            parts.push(format!("{:+}", expr.constant));
        }
        parts.join(" ")
    }
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.6}", v)
    }
}

fn fmt_coef(c: f64) -> String {
    if c >= 0.0 {
        format!("+{}", fmt_num(c))
    } else {
        format!("-{}", fmt_num(-c))
    }
}
