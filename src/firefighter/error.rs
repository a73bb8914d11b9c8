use derive_more::{Display, Error};

use crate::firefighter::{TimeUnit, VertexId};

/// Errors raised while lowering an instance into a model or reading a solved model back.
/// All of them are detected before or after the solve, never during it.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[display(fmt = "Horizon must not be negative, got {}", horizon)]
    InvalidHorizon { horizon: i64 },
    #[display(fmt = "Model for {} vertices and horizon {} exceeds {} variables", vertices, horizon, limit)]
    ModelTooLarge { vertices: usize, horizon: i64, limit: usize },
    #[display(fmt = "Graph has no vertices")]
    EmptyGraph,
    #[display(fmt = "Invalid root set: {}", message)]
    InvalidRootSet { message: String },
    #[display(fmt = "Adjacency of vertex {} references unknown vertex {}", vertex, neighbour)]
    DanglingAdjacency { vertex: VertexId, neighbour: VertexId },
    #[display(fmt = "Adjacency is not symmetric: {} lists {} but not vice versa", vertex, neighbour)]
    AsymmetricAdjacency { vertex: VertexId, neighbour: VertexId },
    #[display(fmt = "Defense budget per time step must be at least 1")]
    InvalidBudget,
    #[display(fmt = "Model has no constraints")]
    EmptyModel,
    #[display(fmt = "Incomplete assignment: expected {} values, found {}", expected, found)]
    IncompleteAssignment { expected: usize, found: usize },
    #[display(fmt = "Vertex {} cannot be defended at time {}", vertex, time)]
    IllegalAction { time: TimeUnit, vertex: VertexId },
    #[display(fmt = "More than {} defense actions at time {}", budget, time)]
    BudgetExceeded { time: TimeUnit, budget: usize },
    #[display(fmt = "Schedule does not match the model: {}", message)]
    ScheduleMismatch { message: String },
}
