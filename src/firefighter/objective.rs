use crate::firefighter::{linear::LinearExpr, variables::VariableSpace};

/// Objective of the formulation: `maximize Σ_v (1 - B[T,v])`, the number of vertices
/// not burning at the horizon
pub fn saved_vertices(space: &VariableSpace) -> LinearExpr {
    let horizon = space.horizon();
    (0..space.num_vertices())
        .fold(LinearExpr::from_const(space.num_vertices() as f64),
              |expr, vi| expr.minus(space.burning(horizon, vi)))
}
