use std::collections::BTreeSet;

use serde::Serialize;

use crate::firefighter::{error::ModelError,
                         instance::GraphSpec,
                         model::Model,
                         result::{Assignment, SolveResult},
                         settings::{DefenceModel, DefenseTiming, FormulationSettings},
                         variables::{VarKind, VariableSpace},
                         TimeUnit,
                         VertexId};

/// State of the instance at one time step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleStep {
    pub time: TimeUnit,
    /// Vertices defended by an action at this step, always empty at `t = 0`
    pub actions: Vec<VertexId>,
    pub burning: BTreeSet<VertexId>,
    pub defended: BTreeSet<VertexId>,
}

/// Defense schedule together with the burning/defended partition at every time step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub num_vertices: usize,
    pub steps: Vec<ScheduleStep>,
}

impl Schedule {
    /// Last time step of the schedule
    pub fn horizon(&self) -> TimeUnit {
        self.steps.len().saturating_sub(1) as TimeUnit
    }

    pub fn step(&self, time: TimeUnit) -> Option<&ScheduleStep> {
        self.steps.get(time as usize)
    }

    /// All vertices defended by an action at `time`
    pub fn actions_at(&self, time: TimeUnit) -> &[VertexId] {
        self.step(time)
            .map(|step| step.actions.as_slice())
            .unwrap_or(&[])
    }

    /// The vertex defended at `time`, `None` if the step was skipped
    pub fn action_at(&self, time: TimeUnit) -> Option<VertexId> {
        self.actions_at(time).first().copied()
    }

    /// Number of vertices not burning at the horizon
    pub fn saved(&self) -> usize {
        let burning = self.steps.last()
            .map(|step| step.burning.len())
            .unwrap_or(0);
        self.num_vertices - burning
    }
}

/// Reconstruct the schedule from a solved model. Callers must check the status first:
/// a result without a full assignment is rejected.
pub fn extract(model: &Model, result: &SolveResult) -> Result<Schedule, ModelError> {
    let space = model.space();
    let assignment = match &result.assignment {
        Some(assignment) if assignment.len() == space.len() => assignment,
        Some(assignment) => {
            return Err(ModelError::IncompleteAssignment {
                expected: space.len(),
                found: assignment.len(),
            });
        }
        None => {
            log::warn!("Cannot extract a schedule from a {} result", result.status);
            return Err(ModelError::IncompleteAssignment {
                expected: space.len(),
                found: 0,
            });
        }
    };

    let vertices = space.vertices();
    let collect = |pred: &dyn Fn(usize) -> bool| -> Vec<VertexId> {
        (0..vertices.len())
            .filter(|&vi| pred(vi))
            .map(|vi| vertices[vi])
            .collect()
    };

    let mut steps = Vec::with_capacity(space.horizon() as usize + 1);
    for t in 0..=space.horizon() {
        let actions = if t == 0 {
            Vec::new()
        } else {
            collect(&|vi| assignment.get(space.action(t, vi)))
        };
        let burning = collect(&|vi| assignment.get(space.burning(t, vi)));
        let defended = collect(&|vi| assignment.get(space.defended(t, vi)));

        log::debug!("Step {}: defend {:?}, burning {:?}, defended {:?}",
            t, actions, burning, defended);

        steps.push(ScheduleStep {
            time: t,
            actions,
            burning: burning.into_iter().collect(),
            defended: defended.into_iter().collect(),
        });
    }

    Ok(Schedule {
        num_vertices: vertices.len(),
        steps,
    })
}

/// Encode `schedule` as an assignment of the variables in `space`. This is the inverse of
/// `extract`.
pub fn encode(space: &VariableSpace, schedule: &Schedule) -> Result<Assignment, ModelError> {
    if schedule.steps.len() != space.horizon() as usize + 1 {
        return Err(ModelError::ScheduleMismatch {
            message: format!("expected {} steps, found {}",
                             space.horizon() + 1, schedule.steps.len())
        });
    }

    let var = |kind: VarKind, t: TimeUnit, v: &VertexId| space.find(kind, t, v)
        .ok_or_else(|| ModelError::ScheduleMismatch {
            message: format!("no variable {}[{}, {}]", kind, t, v)
        });

    let mut assignment = Assignment::zeros(space.len());
    for (t, step) in schedule.steps.iter().enumerate() {
        let t = t as TimeUnit;
        for v in &step.burning {
            assignment.set(var(VarKind::Burning, t, v)?, true);
        }
        for v in &step.defended {
            assignment.set(var(VarKind::Defended, t, v)?, true);
        }
        for v in &step.actions {
            assignment.set(var(VarKind::Action, t, v)?, true);
        }
    }

    Ok(assignment)
}

/// Play the defense plan `plan` forward on `spec`, where `plan[i]` holds the vertices defended
/// at time `i + 1`. Missing steps are idle. Each step first places the defenses and then
/// spreads the fire, following the rules of the formulation configured by `settings`.
pub fn replay(spec: &GraphSpec, settings: &FormulationSettings, plan: &[Vec<VertexId>])
              -> Result<Schedule, ModelError> {
    if spec.horizon() < 0 {
        return Err(ModelError::InvalidHorizon { horizon: spec.horizon() });
    }
    VariableSpace::checked_len(spec)?;
    let horizon = spec.horizon() as TimeUnit;
    if plan.len() as TimeUnit > horizon {
        return Err(ModelError::ScheduleMismatch {
            message: format!("plan covers {} steps but the horizon is {}", plan.len(), horizon)
        });
    }

    let mut steps = vec![ScheduleStep {
        time: 0,
        actions: Vec::new(),
        burning: spec.roots().clone(),
        defended: BTreeSet::new(),
    }];

    for t in 1..=horizon {
        let prev = &steps[t as usize - 1];
        let actions = plan.get(t as usize - 1).cloned().unwrap_or_default();
        if actions.len() > settings.budget {
            return Err(ModelError::BudgetExceeded { time: t, budget: settings.budget });
        }

        // Contain the fire
        let mut defended = prev.defended.clone();
        for &v in &actions {
            if !spec.vertices().contains(&v) || prev.burning.contains(&v) || defended.contains(&v) {
                log::warn!("Illegal defense of vertex {} at time {}", v, t);
                return Err(ModelError::IllegalAction { time: t, vertex: v });
            }
            defended.insert(v);
        }
        if settings.defence == DefenceModel::Infectious {
            for v in spec.vertices() {
                if !prev.burning.contains(v) && spec.neighbours(v).any(|u| prev.defended.contains(u)) {
                    defended.insert(*v);
                }
            }
        }

        // Spread the fire
        let guard = match settings.timing {
            DefenseTiming::Immediate => &defended,
            DefenseTiming::Delayed => &prev.defended,
        };
        let mut burning = prev.burning.clone();
        for v in spec.vertices() {
            if !guard.contains(v) && spec.neighbours(v).any(|u| prev.burning.contains(u)) {
                burning.insert(*v);
            }
        }

        // Under delayed defense a vertex defended now may still catch fire now,
        // which no assignment of the model can represent
        if let Some(&v) = burning.intersection(&defended).next() {
            log::warn!("Vertex {} would be burning and defended at time {}", v, t);
            return Err(ModelError::IllegalAction { time: t, vertex: v });
        }

        steps.push(ScheduleStep {
            time: t,
            actions,
            burning,
            defended,
        });
    }

    Ok(Schedule {
        num_vertices: spec.num_vertices(),
        steps,
    })
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use rand::prelude::*;

    use crate::firefighter::{error::ModelError,
                             extract::{encode, extract, replay},
                             instance::GraphSpec,
                             model::build_model,
                             result::{SolveResult, SolveStatus},
                             settings::{DefenceModel, DefenseTiming, FormulationSettings}};

    fn house(horizon: i64) -> GraphSpec {
        GraphSpec::from_edges(1..=5,
                              vec![(1, 2), (1, 3), (2, 3), (2, 4), (3, 5), (4, 5)],
                              vec![1],
                              horizon)
    }

    /// Random connected-ish graph with `n` vertices and roughly `p * n^2 / 2` edges
    fn random_spec(rng: &mut ThreadRng, n: usize, horizon: i64) -> GraphSpec {
        let mut edges = Vec::new();
        for a in 0..n {
            for b in a + 1..n {
                if rng.gen_bool(0.3) {
                    edges.push((a, b));
                }
            }
        }
        let num_roots = rng.gen_range(1..=2);
        let roots = (0..n).choose_multiple(rng, num_roots);
        GraphSpec::from_edges(0..n, edges, roots, horizon)
    }

    /// A random plan of up to `budget` undefended and unburned vertices per step.
    /// `None` if a prefix of it is already rejected, which can happen under delayed defense.
    fn random_plan(rng: &mut ThreadRng, spec: &GraphSpec, settings: &FormulationSettings)
                   -> Option<Vec<Vec<usize>>> {
        let mut plan = Vec::new();
        for _ in 0..spec.horizon() {
            let schedule = match replay(spec, settings, &plan) {
                Ok(schedule) => schedule,
                Err(ModelError::IllegalAction { .. }) => return None,
                Err(err) => panic!("unexpected replay error {}", err),
            };
            let last = &schedule.steps[plan.len()];
            let candidates: Vec<_> = spec.vertices().iter()
                .filter(|v| !last.burning.contains(v) && !last.defended.contains(v))
                .copied()
                .collect();
            let num_actions = rng.gen_range(0..=settings.budget);
            plan.push(candidates.choose_multiple(rng, num_actions).copied().collect());
        }
        Some(plan)
    }

    #[test]
    fn test_round_trip() {
        let spec = house(3);
        let settings = FormulationSettings::default();
        let model = build_model(&spec, &settings).unwrap();

        let schedule = replay(&spec, &settings, &[vec![2], vec![5], vec![]]).unwrap();
        let assignment = encode(model.space(), &schedule).unwrap();
        let result = SolveResult {
            status: SolveStatus::Optimal,
            objective_value: Some(model.objective_value(&assignment).unwrap()),
            assignment: Some(assignment),
        };

        let extracted = extract(&model, &result).unwrap();
        assert_eq!(extracted, schedule);
        assert_eq!(extracted.action_at(1), Some(2));
        assert_eq!(extracted.action_at(2), Some(5));
        assert_eq!(extracted.action_at(3), None);
        assert_eq!(extracted.action_at(0), None);
    }

    #[test]
    fn test_replayed_plans_are_feasible() {
        let mut rng = thread_rng();
        for budget in [1, 2] {
            for defence in [DefenceModel::Standard, DefenceModel::Infectious] {
                for timing in [DefenseTiming::Immediate, DefenseTiming::Delayed] {
                    let settings = FormulationSettings { budget, defence, timing };
                    let mut num_accepted = 0;
                    for _ in 0..40 {
                        let n = rng.gen_range(1..8);
                        let horizon = rng.gen_range(0..5);
                        let spec = random_spec(&mut rng, n, horizon);
                        let model = build_model(&spec, &settings).unwrap();

                        // The idle plan is never rejected
                        let plans = std::iter::once(Vec::new())
                            .chain(random_plan(&mut rng, &spec, &settings));
                        for plan in plans {
                            let schedule = match replay(&spec, &settings, &plan) {
                                Ok(schedule) => schedule,
                                Err(ModelError::IllegalAction { .. }) => continue,
                                Err(err) => panic!("unexpected replay error {}", err),
                            };
                            num_accepted += 1;

                            for (prev, step) in schedule.steps.iter().zip(schedule.steps.iter().skip(1)) {
                                assert!(step.burning.is_disjoint(&step.defended));
                                assert!(step.burning.is_superset(&prev.burning));
                                assert!(step.defended.is_superset(&prev.defended));
                                assert!(step.actions.len() <= budget);
                            }

                            let assignment = encode(model.space(), &schedule).unwrap();
                            let violations = model.violations(&assignment).unwrap();
                            assert!(violations.is_empty(), "{:?}: plan {:?} on {:?} violates {:?}",
                                    settings, plan, spec,
                                    violations.iter().map(|c| &c.label).collect::<Vec<_>>());
                            assert_eq!(model.objective_value(&assignment).unwrap(), schedule.saved() as f64);
                        }
                    }
                    assert!(num_accepted >= 40, "{:?}: only {} plans accepted", settings, num_accepted);
                }
            }
        }
    }

    #[test]
    fn test_house_replay() {
        let spec = house(2);
        let settings = FormulationSettings::default();

        let idle = replay(&spec, &settings, &[]).unwrap();
        assert_eq!(idle.steps[1].burning, vec![1, 2, 3].into_iter().collect::<BTreeSet<_>>());
        assert_eq!(idle.saved(), 0);

        // Defending 2 and then 5 confines the fire to 1 and 3
        let plan = replay(&spec, &settings, &[vec![2], vec![5]]).unwrap();
        assert_eq!(plan.steps[2].burning, vec![1, 3].into_iter().collect::<BTreeSet<_>>());
        assert_eq!(plan.saved(), 3);
    }

    #[test]
    fn test_illegal_plans() {
        let spec = house(2);
        let settings = FormulationSettings::default();

        assert_eq!(replay(&spec, &settings, &[vec![1]]).unwrap_err(),
                   ModelError::IllegalAction { time: 1, vertex: 1 });
        assert_eq!(replay(&spec, &settings, &[vec![2, 3]]).unwrap_err(),
                   ModelError::BudgetExceeded { time: 1, budget: 1 });
        assert!(matches!(replay(&spec, &settings, &[vec![], vec![], vec![]]),
                         Err(ModelError::ScheduleMismatch { .. })));
        assert!(matches!(replay(&house(i64::MAX), &settings, &[]),
                         Err(ModelError::ModelTooLarge { .. })));

        // Vertex 2 is next to the root, a delayed defense comes too late
        let delayed = FormulationSettings { timing: DefenseTiming::Delayed, ..settings };
        assert_eq!(replay(&spec, &delayed, &[vec![2]]).unwrap_err(),
                   ModelError::IllegalAction { time: 1, vertex: 2 });
        assert_eq!(replay(&spec, &delayed, &[vec![4]]).unwrap().saved(), 1);
    }

    #[test]
    fn test_encode_rejects_foreign_schedules() {
        let spec = house(1);
        let settings = FormulationSettings::default();
        let space = build_model(&spec, &settings).unwrap().space().clone();
        let schedule = replay(&spec, &settings, &[vec![2]]).unwrap();
        assert!(encode(&space, &schedule).is_ok());

        let mut early_action = schedule.clone();
        early_action.steps[0].actions.push(4);
        assert_eq!(encode(&space, &early_action).unwrap_err(),
                   ModelError::ScheduleMismatch { message: "no variable A[0, 4]".to_string() });

        let mut unknown_vertex = schedule.clone();
        unknown_vertex.steps[1].burning.insert(9);
        assert_eq!(encode(&space, &unknown_vertex).unwrap_err(),
                   ModelError::ScheduleMismatch { message: "no variable B[1, 9]".to_string() });

        let longer = replay(&house(2), &settings, &[]).unwrap();
        assert!(matches!(encode(&space, &longer), Err(ModelError::ScheduleMismatch { .. })));
    }

    #[test]
    fn test_extract_without_assignment() {
        let spec = house(1);
        let model = build_model(&spec, &FormulationSettings::default()).unwrap();

        for status in [SolveStatus::Infeasible, SolveStatus::Unbounded, SolveStatus::NotSolved] {
            let result = SolveResult::without_solution(status);
            assert!(matches!(extract(&model, &result),
                             Err(ModelError::IncompleteAssignment { found: 0, .. })));
        }
    }
}
