use rayon::prelude::*;

use crate::firefighter::{error::ModelError,
                         instance::GraphSpec,
                         linear::{Constraint, ConstraintTag, LinearExpr, Sense},
                         settings::{DefenceModel, DefenseTiming, FormulationSettings},
                         variables::VariableSpace,
                         TimeUnit};

/// A constraint family: a pure function of the builder's inputs
pub type Rule = fn(&ConstraintBuilder) -> Vec<Constraint>;

/// All constraint families in emission order
pub const RULES: [Rule; 11] = [
    initial_conditions,
    action_budget,
    action_legality,
    burning_persistence,
    fire_spread,
    fire_justification,
    defended_persistence,
    defense_effect,
    defense_spread,
    defense_justification,
    mutual_exclusion,
];

/// Generates the linear constraints of the time-expanded firefighter formulation
#[derive(Debug)]
pub struct ConstraintBuilder<'a> {
    space: &'a VariableSpace,
    settings: &'a FormulationSettings,
    /// Neighbours of every vertex by dense index
    neighbours: Vec<Vec<usize>>,
}

impl<'a> ConstraintBuilder<'a> {
    /// Create a builder for `spec`, whose variables were allocated in `space`.
    /// Fails if the adjacency references unknown vertices or is not symmetric.
    pub fn new(spec: &GraphSpec, space: &'a VariableSpace, settings: &'a FormulationSettings)
               -> Result<Self, ModelError> {
        if settings.budget == 0 {
            log::warn!("Rejecting defense budget 0");
            return Err(ModelError::InvalidBudget);
        }

        let mut neighbours = vec![Vec::new(); space.num_vertices()];
        for (&v, adjacent) in spec.adjacency() {
            for &u in adjacent {
                let (vi, ui) = match (space.vertex_index(&v), space.vertex_index(&u)) {
                    (Some(vi), Some(ui)) => (vi, ui),
                    _ => {
                        log::warn!("Adjacency entry {} -> {} references an unknown vertex", v, u);
                        return Err(ModelError::DanglingAdjacency { vertex: v, neighbour: u });
                    }
                };
                if !spec.adjacency().get(&u).map_or(false, |adjacent| adjacent.contains(&v)) {
                    log::warn!("Adjacency entry {} -> {} has no reverse entry", v, u);
                    return Err(ModelError::AsymmetricAdjacency { vertex: v, neighbour: u });
                }
                neighbours[vi].push(ui);
            }
        }

        Ok(Self {
            space,
            settings,
            neighbours,
        })
    }

    pub fn space(&self) -> &VariableSpace {
        self.space
    }

    pub fn settings(&self) -> &FormulationSettings {
        self.settings
    }

    /// Neighbours of the vertex with dense index `vi`
    pub fn neighbours(&self, vi: usize) -> &[usize] {
        &self.neighbours[vi]
    }

    /// Emit all constraint families, each family evaluated on its own worker
    pub fn build(&self) -> Vec<Constraint> {
        let families: Vec<Vec<Constraint>> = RULES.par_iter()
            .map(|rule| rule(self))
            .collect();

        families.into_iter()
            .flatten()
            .collect()
    }

    /// Vertex id of the dense index `vi`, used for labels
    fn id(&self, vi: usize) -> usize {
        self.space.vertices()[vi]
    }

    /// `(t, vi)` for all `t` in `1..=T` and all vertices
    fn transitions(&self) -> impl Iterator<Item=(TimeUnit, usize)> + '_ {
        let n = self.space.num_vertices();
        (1..=self.space.horizon()).flat_map(move |t| (0..n).map(move |vi| (t, vi)))
    }
}

/// `B[0,v] = [v is a root]` and `D[0,v] = 0`
fn initial_conditions(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::InitialCondition;
    (0..space.num_vertices())
        .flat_map(|vi| {
            let burning = if space.is_root(vi) { 1.0 } else { 0.0 };
            [
                Constraint::new(format!("{}_burning_{}", tag, b.id(vi)), tag,
                                LinearExpr::from_var(space.burning(0, vi)),
                                Sense::Eq,
                                LinearExpr::from_const(burning)),
                Constraint::new(format!("{}_defended_{}", tag, b.id(vi)), tag,
                                LinearExpr::from_var(space.defended(0, vi)),
                                Sense::Eq,
                                LinearExpr::from_const(0.0)),
            ]
        })
        .collect()
}

/// `Σ_v A[t,v] <= k`
fn action_budget(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::ActionBudget;
    (1..=space.horizon())
        .map(|t| Constraint::new(
            format!("{}_{}", tag, t), tag,
            LinearExpr::sum((0..space.num_vertices()).map(|vi| space.action(t, vi))),
            Sense::Le,
            LinearExpr::from_const(b.settings().budget as f64)))
        .collect()
}

/// `A[t,v] <= 1 - B[t-1,v] - D[t-1,v]`
fn action_legality(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::ActionLegality;
    b.transitions()
        .map(|(t, vi)| Constraint::new(
            format!("{}_{}_{}", tag, t, b.id(vi)), tag,
            LinearExpr::from_var(space.action(t, vi)),
            Sense::Le,
            LinearExpr::from_const(1.0)
                .minus(space.burning(t - 1, vi))
                .minus(space.defended(t - 1, vi))))
        .collect()
}

/// `B[t,v] >= B[t-1,v]`
fn burning_persistence(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::BurningPersistence;
    b.transitions()
        .map(|(t, vi)| Constraint::new(
            format!("{}_{}_{}", tag, t, b.id(vi)), tag,
            LinearExpr::from_var(space.burning(t, vi)),
            Sense::Ge,
            LinearExpr::from_var(space.burning(t - 1, vi))))
        .collect()
}

/// `B[t,v] >= B[t-1,u] - D[τ,v]` for every neighbour `u`,
/// with `τ = t` for immediate and `τ = t - 1` for delayed defense
fn fire_spread(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::FireSpread;
    b.transitions()
        .flat_map(|(t, vi)| {
            let guard = match b.settings().timing {
                DefenseTiming::Immediate => space.defended(t, vi),
                DefenseTiming::Delayed => space.defended(t - 1, vi),
            };
            b.neighbours(vi).iter().map(move |&ui| Constraint::new(
                format!("{}_{}_{}_{}", tag, t, b.id(vi), b.id(ui)), tag,
                LinearExpr::from_var(space.burning(t, vi)),
                Sense::Ge,
                LinearExpr::from_var(space.burning(t - 1, ui)).minus(guard)))
        })
        .collect()
}

/// `B[t,v] <= B[t-1,v] + Σ_u B[t-1,u]`: a vertex only catches fire from a burning neighbour
fn fire_justification(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::FireJustification;
    b.transitions()
        .map(|(t, vi)| Constraint::new(
            format!("{}_{}_{}", tag, t, b.id(vi)), tag,
            LinearExpr::from_var(space.burning(t, vi)),
            Sense::Le,
            b.neighbours(vi).iter()
                .fold(LinearExpr::from_var(space.burning(t - 1, vi)),
                      |expr, &ui| expr.plus(space.burning(t - 1, ui), 1.0))))
        .collect()
}

/// `D[t,v] >= D[t-1,v]`
fn defended_persistence(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::DefendedPersistence;
    b.transitions()
        .map(|(t, vi)| Constraint::new(
            format!("{}_{}_{}", tag, t, b.id(vi)), tag,
            LinearExpr::from_var(space.defended(t, vi)),
            Sense::Ge,
            LinearExpr::from_var(space.defended(t - 1, vi))))
        .collect()
}

/// `D[t,v] >= A[t,v]`
fn defense_effect(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::DefenseEffect;
    b.transitions()
        .map(|(t, vi)| Constraint::new(
            format!("{}_{}_{}", tag, t, b.id(vi)), tag,
            LinearExpr::from_var(space.defended(t, vi)),
            Sense::Ge,
            LinearExpr::from_var(space.action(t, vi))))
        .collect()
}

/// `D[t,v] >= D[t-1,u] - B[t-1,v]` for every neighbour `u`, infectious defence only
fn defense_spread(b: &ConstraintBuilder) -> Vec<Constraint> {
    if b.settings().defence != DefenceModel::Infectious {
        return Vec::new();
    }

    let space = b.space();
    let tag = ConstraintTag::DefenseSpread;
    b.transitions()
        .flat_map(|(t, vi)| b.neighbours(vi).iter().map(move |&ui| Constraint::new(
            format!("{}_{}_{}_{}", tag, t, b.id(vi), b.id(ui)), tag,
            LinearExpr::from_var(space.defended(t, vi)),
            Sense::Ge,
            LinearExpr::from_var(space.defended(t - 1, ui)).minus(space.burning(t - 1, vi)))))
        .collect()
}

/// `D[t,v] <= D[t-1,v] + A[t,v]`, plus `Σ_u D[t-1,u]` for infectious defence
fn defense_justification(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::DefenseJustification;
    let infectious = b.settings().defence == DefenceModel::Infectious;
    b.transitions()
        .map(|(t, vi)| {
            let mut rhs = LinearExpr::from_var(space.defended(t - 1, vi))
                .plus(space.action(t, vi), 1.0);
            if infectious {
                for &ui in b.neighbours(vi) {
                    rhs = rhs.plus(space.defended(t - 1, ui), 1.0);
                }
            }
            Constraint::new(
                format!("{}_{}_{}", tag, t, b.id(vi)), tag,
                LinearExpr::from_var(space.defended(t, vi)),
                Sense::Le,
                rhs)
        })
        .collect()
}

/// `B[t,v] + D[t,v] <= 1` for all `t` in `0..=T`
fn mutual_exclusion(b: &ConstraintBuilder) -> Vec<Constraint> {
    let space = b.space();
    let tag = ConstraintTag::MutualExclusion;
    (0..=space.horizon())
        .flat_map(|t| (0..space.num_vertices()).map(move |vi| Constraint::new(
            format!("{}_{}_{}", tag, t, b.id(vi)), tag,
            LinearExpr::from_var(space.burning(t, vi)).plus(space.defended(t, vi), 1.0),
            Sense::Le,
            LinearExpr::from_const(1.0))))
        .collect()
}
