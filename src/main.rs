mod error;
mod query;

use std::{collections::HashMap,
          env,
          io,
          sync::Arc};

use actix_cors::Cors;
use actix_web::{App, error::BlockingError, get, HttpRequest, HttpResponse, HttpServer, middleware::Logger, post,
                Responder, web, http};
use serde::{Deserialize, Serialize};
use serde_json::json;

use ffmilp_lib::firefighter::{error::ModelError,
                              extract::{extract, Schedule},
                              instance::GraphSpec,
                              model::{build_model, Model},
                              result::{SolveResult, SolveStatus},
                              settings::{DefenceModel, DefenseTiming, FormulationSettings},
                              solver::{MicroLpSolver, Solver},
                              VertexId};
use ffmilp_lib::graph::Graph;

use crate::error::ServiceError;
use crate::query::Query;

/// Storage for data associated to the web app
struct AppData {
    graphs: HashMap<String, Arc<Graph>>,
}

impl AppData {
    /// Get the graph named `graph_name` or a bad request error
    fn graph(&self, graph_name: &str) -> Result<&Arc<Graph>, ServiceError> {
        self.graphs.get(graph_name).ok_or_else(|| {
            log::warn!("Unknown graph {}", graph_name);
            ServiceError::BadRequest {
                message: format!("Unknown value for parameter 'graph': '{}'", graph_name)
            }
        })
    }
}

#[derive(Serialize)]
struct GraphData {
    name: String,
    num_of_nodes: usize,
}

/// Body of a solve request
#[derive(Debug, Deserialize)]
struct SolveRequest {
    graph_name: String,
    roots: Vec<VertexId>,
    horizon: i64,
    #[serde(flatten)]
    settings: FormulationSettings,
}

/// Container for the outcome of a solve request
#[derive(Serialize)]
struct SolveResponse {
    status: SolveStatus,
    objective_value: Option<f64>,
    schedule: Option<Schedule>,
}

/// Request to check whether the server is up and available
#[get("/ping")]
async fn ping() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("pong")
}

/// List all graphs that have been loaded by the server
#[get("/graphs")]
async fn list_graphs(data: web::Data<AppData>) -> impl Responder {
    let mut graphs: Vec<_> = data.graphs.iter()
        .map(|(name, graph)| GraphData {
            name: name.clone(),
            num_of_nodes: graph.num_nodes,
        })
        .collect();
    graphs.sort_by(|g1, g2| g1.name.cmp(&g2.name));
    HttpResponse::Ok().json(graphs)
}

/// List all available defence models and defense timings
#[get("/variants")]
async fn list_variants() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "defence": FormulationSettings::available_defence_models(),
        "timing": FormulationSettings::available_timings(),
    }))
}

/// Solve the firefighter problem on one of the loaded graphs
#[post("/solve")]
async fn solve_problem(data: web::Data<AppData>, request: web::Json<SolveRequest>) -> Result<HttpResponse, ServiceError> {
    let request = request.into_inner();
    log::info!("Received solve request. {:?}", &request);

    let graph = Arc::clone(data.graph(&request.graph_name)?);

    // Building and solving both run on the blocking pool
    let (model, result) = web::block(move || -> Result<_, ModelError> {
        let spec = GraphSpec::from_graph(&graph, request.roots, request.horizon);
        let model = build_model(&spec, &request.settings)?;
        let result = MicroLpSolver.solve(&model);
        Ok((model, result))
    })
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(solve_response(&model, result)?))
}

fn blocking_error(err: BlockingError) -> ServiceError {
    log::error!("Blocking task failed: {}", err);
    ServiceError::Internal {
        message: format!("Blocking task failed: {}", err)
    }
}

/// Build the response for a finished solve
fn solve_response(model: &Model, result: SolveResult) -> Result<SolveResponse, ServiceError> {
    let schedule = match result.assignment {
        Some(_) => Some(extract(model, &result)?),
        None => None
    };
    Ok(SolveResponse {
        status: result.status,
        objective_value: result.objective_value,
        schedule,
    })
}

/// Export the model of an instance in LP format
#[get("/model")]
async fn export_model(data: web::Data<AppData>, req: HttpRequest) -> Result<HttpResponse, ServiceError> {
    let query = Query::from(req.query_string());
    let graph = Arc::clone(data.graph(query.get("graph")?)?);
    let roots = query.get_and_parse_list::<VertexId>("roots")?;
    let horizon = query.get_and_parse::<i64>("horizon")?;
    let settings = FormulationSettings {
        budget: query.get_and_parse_or("budget", 1)?,
        defence: query.get_and_parse_or("defence", DefenceModel::default())?,
        timing: query.get_and_parse_or("timing", DefenseTiming::default())?,
    };

    log::debug!("Exporting model. roots={:?}, horizon={}, settings={:?}.", roots, horizon, settings);

    let lp = web::block(move || -> Result<_, ModelError> {
        let spec = GraphSpec::from_graph(&graph, roots, horizon);
        Ok(build_model(&spec, &settings)?.to_lp())
    })
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(lp))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<_> = env::args().collect();

    if args.len() < 2 {
        let err = "Missing argument: path to graph directory";
        log::error!("{}", err);
        return Err(io::Error::new(io::ErrorKind::InvalidInput, err));
    }
    let bind_address = args.get(2).map_or("0.0.0.0:8080", String::as_str).to_string();

    // Initialize graphs
    let graphs = ffmilp_lib::load_graphs(&args[1]).map_err(|err| {
        log::error!("Failed to load graphs: {}", err);
        io::Error::new(io::ErrorKind::InvalidData, err.to_string())
    })?;
    log::info!("Loaded {} graphs", graphs.len());

    // Initialize app data
    let data = web::Data::new(AppData {
        graphs,
    });

    // Initialize and start server
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
            .allowed_header(http::header::CONTENT_TYPE)
            .max_age(3600);
        App::new()
            .app_data(data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(ping)
            .service(list_graphs)
            .service(list_variants)
            .service(solve_problem)
            .service(export_model)
    });

    log::info!("Listening on {}", bind_address);
    server.bind(bind_address)?
        .run()
        .await
}
