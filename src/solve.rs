use std::{env, error::Error, fs, str::FromStr};

use ffmilp_lib::firefighter::{extract::extract,
                              instance::GraphSpec,
                              model::build_model,
                              result::SolveStatus,
                              settings::FormulationSettings,
                              solver::{MicroLpSolver, Solver},
                              VertexId};
use ffmilp_lib::graph::Graph;

/// Command line arguments of a single solver run
#[derive(Debug, Default)]
struct RunArgs {
    graph_path: String,
    roots: Vec<VertexId>,
    horizon: i64,
    settings: FormulationSettings,
    lp_path: Option<String>,
    json: bool,
}

fn parse_value<F: FromStr>(args: &[String], i: usize, name: &str) -> Result<F, String> {
    let val_str = args.get(i + 1)
        .ok_or_else(|| format!("Missing value for argument: {}", name))?;
    val_str.parse::<F>()
        .map_err(|_| format!("Invalid argument: {} '{}'", name, val_str))
}

fn parse_args(args: &[String]) -> Result<RunArgs, String> {
    for required in ["--graph", "--roots", "--horizon"] {
        if !args.iter().any(|arg| arg == required) {
            return Err(format!("Missing required argument: {}", required));
        }
    }

    let mut run = RunArgs::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--graph" => {
                run.graph_path = parse_value(args, i, "graph")?;
            }
            "--roots" => {
                let roots: String = parse_value(args, i, "roots")?;
                run.roots = roots.split(',')
                    .filter(|root| !root.is_empty())
                    .map(|root| root.trim().parse::<VertexId>()
                        .map_err(|_| format!("Invalid argument: roots '{}'", root)))
                    .collect::<Result<_, _>>()?;
            }
            "--horizon" => {
                run.horizon = parse_value(args, i, "horizon")?;
            }
            "-k" => {
                run.settings.budget = parse_value(args, i, "budget")?;
            }
            "--defence" => {
                run.settings.defence = parse_value(args, i, "defence")?;
            }
            "--timing" => {
                run.settings.timing = parse_value(args, i, "timing")?;
            }
            "--lp" => {
                run.lp_path = Some(parse_value(args, i, "lp")?);
            }
            "--json" => {
                run.json = true;
                i += 1;
                continue;
            }
            _ => {
                return Err(format!("Unknown argument: {}", &args[i]));
            }
        }
        i += 2;
    }

    Ok(run)
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<_> = env::args().collect();
    let run = parse_args(&args).map_err(|err| {
        log::error!("{}", err);
        err
    })?;
    log::info!("Solving with the following arguments: {:?}", &run);

    let graph = Graph::parse_from_file(&run.graph_path)?;
    let spec = GraphSpec::from_graph(&graph, run.roots, run.horizon);
    let model = build_model(&spec, &run.settings)?;

    if let Some(lp_path) = &run.lp_path {
        fs::write(lp_path, model.to_lp())?;
        log::info!("Wrote model to {}", lp_path);
    }

    let result = MicroLpSolver.solve(&model);
    if result.status != SolveStatus::Optimal {
        log::warn!("No schedule found. status={}.", result.status);
        return Ok(());
    }

    let schedule = extract(&model, &result)?;
    if run.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        for step in schedule.steps.iter().skip(1) {
            log::info!("t={}: defend {:?}, burning={}, defended={}",
                step.time, step.actions, step.burning.len(), step.defended.len());
        }
    }
    log::info!("Saved {} of {} vertices", schedule.saved(), schedule.num_vertices);

    Ok(())
}

#[cfg(test)]
mod test {
    use ffmilp_lib::firefighter::settings::{DefenceModel, DefenseTiming};

    use crate::parse_args;

    fn args(line: &str) -> Vec<String> {
        std::iter::once("ffmilp_solve")
            .chain(line.split_whitespace())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let run = parse_args(&args("--graph data/house.fmi --roots 0,3 --horizon 4 -k 2 \
            --defence infectious --json --timing delayed")).unwrap();
        assert_eq!(run.graph_path, "data/house.fmi");
        assert_eq!(run.roots, vec![0, 3]);
        assert_eq!(run.horizon, 4);
        assert_eq!(run.settings.budget, 2);
        assert_eq!(run.settings.defence, DefenceModel::Infectious);
        assert_eq!(run.settings.timing, DefenseTiming::Delayed);
        assert!(run.json);
        assert_eq!(run.lp_path, None);
    }

    #[test]
    fn test_invalid_args() {
        assert!(parse_args(&args("--graph g.fmi --roots 0")).is_err());
        assert!(parse_args(&args("--graph g.fmi --roots 0,x --horizon 1")).is_err());
        assert!(parse_args(&args("--graph g.fmi --roots 0 --horizon 1 --defence heroic")).is_err());
        assert!(parse_args(&args("--graph g.fmi --roots 0 --horizon 1 --seed 3")).is_err());
        assert!(parse_args(&args("--graph g.fmi --roots 0 --horizon")).is_err());
    }
}
