pub mod constraints;
pub mod error;
pub mod extract;
pub mod instance;
pub mod linear;
pub mod model;
pub mod objective;
pub mod result;
pub mod settings;
pub mod solver;
pub mod variables;

/// `u64` type alias to denote a time unit in the firefighter problem
pub type TimeUnit = u64;

/// `usize` type alias to denote a vertex of the firefighter graph
pub type VertexId = usize;
