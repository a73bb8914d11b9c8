use good_lp::{constraint, solvers::microlp::microlp, variable, Expression, ProblemVariables,
              ResolutionError, Solution, SolverModel, Variable};

use crate::firefighter::{linear::{LinearExpr, Sense},
                         model::Model,
                         result::{Assignment, SolveResult, SolveStatus}};

/// Boundary to an external MILP solving engine
pub trait Solver: Send + Sync {
    /// Solve `model`. Every outcome of the engine, including failures, is reported
    /// as a `SolveStatus`.
    fn solve(&self, model: &Model) -> SolveResult;

    /// Get the solver name for logging
    fn name(&self) -> &str;
}

/// Solves models with the pure-Rust `microlp` branch-and-bound engine
#[derive(Debug, Default, Clone, Copy)]
pub struct MicroLpSolver;

impl MicroLpSolver {
    fn expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
        expr.terms.iter()
            .map(|(var, &coef)| coef * vars[var.0])
            .sum()
    }

    /// Turn a rounded engine solution into a result, provided it satisfies every constraint
    fn verified(model: &Model, assignment: Assignment) -> SolveResult {
        let violated: Vec<_> = match model.violations(&assignment) {
            Ok(violated) => violated.iter().map(|c| c.label.clone()).collect(),
            Err(err) => {
                log::error!("Solver returned an unusable solution: {}", err);
                return SolveResult::without_solution(SolveStatus::NotSolved);
            }
        };
        if !violated.is_empty() {
            log::error!("Rounded solution violates {} constraints, first {}", violated.len(), violated[0]);
            return SolveResult::without_solution(SolveStatus::NotSolved);
        }

        let objective_value = model.objective().eval(assignment.values());
        log::info!("Solver finished. status=Optimal, objective={}.", objective_value);
        SolveResult {
            status: SolveStatus::Optimal,
            objective_value: Some(objective_value),
            assignment: Some(assignment),
        }
    }
}

impl Solver for MicroLpSolver {
    fn solve(&self, model: &Model) -> SolveResult {
        let mut problem_vars = ProblemVariables::new();
        let vars: Vec<Variable> = model.space().variables().iter()
            .map(|var| problem_vars.add(variable().binary().name(var.name.clone())))
            .collect();

        let objective = Self::expression(model.objective(), &vars);
        let problem = model.constraints().iter()
            .fold(problem_vars.maximise(objective).using(microlp), |problem, c| {
                let lhs = Self::expression(&c.expr, &vars);
                problem.with(match c.sense {
                    Sense::Le => constraint::leq(lhs, c.rhs),
                    Sense::Ge => constraint::geq(lhs, c.rhs),
                    Sense::Eq => constraint::eq(lhs, c.rhs),
                })
            });

        log::info!("Solving model with {}. variables={}, constraints={}.",
            self.name(), vars.len(), model.constraints().len());

        match problem.solve() {
            Ok(solution) => {
                let assignment = Assignment::from_values(vars.iter().map(|&var| solution.value(var)));
                Self::verified(model, assignment)
            }
            Err(ResolutionError::Infeasible) => {
                log::info!("Solver finished. status=Infeasible.");
                SolveResult::without_solution(SolveStatus::Infeasible)
            }
            Err(ResolutionError::Unbounded) => {
                log::info!("Solver finished. status=Unbounded.");
                SolveResult::without_solution(SolveStatus::Unbounded)
            }
            Err(err) => {
                log::warn!("Solver failed: {}", err);
                SolveResult::without_solution(SolveStatus::NotSolved)
            }
        }
    }

    fn name(&self) -> &str {
        "microlp"
    }
}

#[cfg(test)]
mod test {
    use crate::firefighter::{extract::{encode, extract, replay},
                             instance::GraphSpec,
                             model::build_model,
                             result::{Assignment, SolveStatus},
                             settings::{DefenceModel, DefenseTiming, FormulationSettings},
                             solver::{MicroLpSolver, Solver}};

    fn solve(spec: &GraphSpec, settings: &FormulationSettings) -> (SolveStatus, Option<f64>) {
        let model = build_model(spec, settings).unwrap();
        let result = MicroLpSolver.solve(&model);
        if let Some(assignment) = &result.assignment {
            assert!(model.is_feasible(assignment).unwrap(), "solver returned an infeasible point");
        }
        (result.status, result.objective_value)
    }

    #[test]
    fn test_path_immediate() {
        let spec = GraphSpec::from_edges(vec![1, 2, 3], vec![(1, 2), (2, 3)], vec![1], 2);
        let settings = FormulationSettings::default();
        let model = build_model(&spec, &settings).unwrap();
        let result = MicroLpSolver.solve(&model);

        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.objective_value, Some(2.0));

        let schedule = extract(&model, &result).unwrap();
        assert_eq!(schedule.action_at(1), Some(2));
        assert!(schedule.steps[2].burning.contains(&1));
        assert!(!schedule.steps[2].burning.contains(&2));
        assert!(!schedule.steps[2].burning.contains(&3));
        assert_eq!(schedule.saved(), 2);
    }

    #[test]
    fn test_path_delayed() {
        let spec = GraphSpec::from_edges(vec![1, 2, 3], vec![(1, 2), (2, 3)], vec![1], 2);
        let settings = FormulationSettings { timing: DefenseTiming::Delayed, ..FormulationSettings::default() };
        assert_eq!(solve(&spec, &settings), (SolveStatus::Optimal, Some(1.0)));
    }

    #[test]
    fn test_zero_horizon() {
        let spec = GraphSpec::from_edges(1..=5, vec![(1, 2), (2, 3), (3, 4)], vec![1, 4], 0);
        assert_eq!(solve(&spec, &FormulationSettings::default()), (SolveStatus::Optimal, Some(3.0)));
    }

    #[test]
    fn test_isolated_root() {
        for horizon in 0..4 {
            let spec = GraphSpec::from_edges(1..=4, vec![(2, 3), (3, 4)], vec![1], horizon);
            assert_eq!(solve(&spec, &FormulationSettings::default()), (SolveStatus::Optimal, Some(3.0)),
                       "horizon {}", horizon);
        }
    }

    #[test]
    fn test_star_budget() {
        // Centre 0 burning, leaves 1..=4
        let spec = GraphSpec::from_edges(0..=4, (1..=4).map(|leaf| (0, leaf)), vec![0], 1);

        let single = FormulationSettings::default();
        assert_eq!(solve(&spec, &single), (SolveStatus::Optimal, Some(1.0)));

        let double = FormulationSettings { budget: 2, ..FormulationSettings::default() };
        let model = build_model(&spec, &double).unwrap();
        let result = MicroLpSolver.solve(&model);
        assert_eq!(result.objective_value, Some(2.0));
        assert_eq!(extract(&model, &result).unwrap().actions_at(1).len(), 2);
    }

    #[test]
    fn test_house() {
        let spec = GraphSpec::from_edges(1..=5,
                                         vec![(1, 2), (1, 3), (2, 3), (2, 4), (3, 5), (4, 5)],
                                         vec![1],
                                         5);
        // Defend 2 and then 5 (or 3 and then 4): only 1 and one of its neighbours burn
        assert_eq!(solve(&spec, &FormulationSettings::default()), (SolveStatus::Optimal, Some(3.0)));

        let infectious = FormulationSettings { defence: DefenceModel::Infectious, ..FormulationSettings::default() };
        let (status, objective) = solve(&spec, &infectious);
        assert_eq!(status, SolveStatus::Optimal);
        assert!(objective.unwrap() >= 3.0);

        // Defending any vertex that fire reaches in the same step contradicts exclusivity,
        // and infectious defense pushes every defense into such a vertex
        let delayed = FormulationSettings { timing: DefenseTiming::Delayed, ..infectious };
        assert_eq!(solve(&spec, &delayed), (SolveStatus::Optimal, Some(0.0)));
    }

    #[test]
    fn test_rounded_solution_is_verified() {
        let spec = GraphSpec::from_edges(vec![1, 2, 3], vec![(1, 2), (2, 3)], vec![1], 2);
        let settings = FormulationSettings::default();
        let model = build_model(&spec, &settings).unwrap();

        // Nothing burning at t = 0 breaks the initial condition of the root
        let broken = MicroLpSolver::verified(&model, Assignment::zeros(model.space().len()));
        assert_eq!(broken.status, SolveStatus::NotSolved);
        assert!(broken.assignment.is_none() && broken.objective_value.is_none());

        let truncated = MicroLpSolver::verified(&model, Assignment::zeros(2));
        assert_eq!(truncated.status, SolveStatus::NotSolved);

        let schedule = replay(&spec, &settings, &[vec![2]]).unwrap();
        let verified = MicroLpSolver::verified(&model, encode(model.space(), &schedule).unwrap());
        assert_eq!(verified.status, SolveStatus::Optimal);
        assert_eq!(verified.objective_value, Some(2.0));
    }
}
