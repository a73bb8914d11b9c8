use std::collections::BTreeMap;

use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::firefighter::{error::ModelError, instance::GraphSpec, TimeUnit, VertexId};

/// Upper bound on the number of variables of one model
pub const MAX_VARIABLES: usize = 1 << 24;

/// The three families of binary decision variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, AsRefStr)]
pub enum VarKind {
    #[strum(serialize = "B")]
    Burning,
    #[strum(serialize = "D")]
    Defended,
    #[strum(serialize = "A")]
    Action,
}

/// Dense index of a variable within its `VariableSpace`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VarId(pub usize);

/// A named binary unknown keyed by kind, time and vertex
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub kind: VarKind,
    pub time: TimeUnit,
    pub vertex: VertexId,
    pub name: String,
}

/// All decision variables of one model build.
///
/// Variables are laid out in three blocks: `B[0..=T] x V`, `D[0..=T] x V` and `A[1..=T] x V`,
/// each in time-major order. Vertices are addressed by their dense index (position in the
/// ordered vertex set), so every accessor is a pure offset computation once the space exists.
#[derive(Debug, Clone)]
pub struct VariableSpace {
    horizon: TimeUnit,
    vertices: Vec<VertexId>,
    vertex_indices: BTreeMap<VertexId, usize>,
    roots: Vec<usize>,
    variables: Vec<Variable>,
}

impl VariableSpace {
    /// Allocate all variables for `spec`
    pub fn new(spec: &GraphSpec) -> Result<Self, ModelError> {
        if spec.horizon() < 0 {
            log::warn!("Rejecting negative horizon {}", spec.horizon());
            return Err(ModelError::InvalidHorizon { horizon: spec.horizon() });
        }
        if spec.vertices().is_empty() {
            log::warn!("Rejecting empty graph");
            return Err(ModelError::EmptyGraph);
        }
        if spec.roots().is_empty() {
            log::warn!("Rejecting empty root set");
            return Err(ModelError::InvalidRootSet {
                message: "at least one vertex must be burning initially".to_string()
            });
        }
        if let Some(root) = spec.roots().iter().find(|&root| !spec.vertices().contains(root)) {
            log::warn!("Rejecting root {} which is not a vertex", root);
            return Err(ModelError::InvalidRootSet {
                message: format!("root {} is not a vertex of the graph", root)
            });
        }

        let n = spec.num_vertices();
        let num_variables = Self::checked_len(spec)?;

        let horizon = spec.horizon() as TimeUnit;
        let vertices: Vec<_> = spec.vertices().iter().copied().collect();
        let vertex_indices: BTreeMap<_, _> = vertices.iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();
        let roots = spec.roots().iter()
            .map(|root| vertex_indices[root])
            .collect();

        let mut variables = Vec::with_capacity(num_variables);
        for kind in [VarKind::Burning, VarKind::Defended, VarKind::Action] {
            let first = if kind == VarKind::Action { 1 } else { 0 };
            for t in first..=horizon {
                for &v in &vertices {
                    variables.push(Variable {
                        kind,
                        time: t,
                        vertex: v,
                        name: format!("{}_{}_{}", kind, t, v),
                    });
                }
            }
        }

        log::debug!("Allocated {} variables for {} vertices and horizon {}",
            variables.len(), n, horizon);

        Ok(Self {
            horizon,
            vertices,
            vertex_indices,
            roots,
            variables,
        })
    }

    /// Number of variables `spec` needs, or `ModelTooLarge` past `MAX_VARIABLES`
    pub(crate) fn checked_len(spec: &GraphSpec) -> Result<usize, ModelError> {
        let n = spec.num_vertices();
        Self::count(n, spec.horizon())
            .filter(|&count| count <= MAX_VARIABLES)
            .ok_or_else(|| {
                log::warn!("Rejecting model for {} vertices and horizon {}", n, spec.horizon());
                ModelError::ModelTooLarge { vertices: n, horizon: spec.horizon(), limit: MAX_VARIABLES }
            })
    }

    /// `|V| * (3T + 2)`, `None` on overflow
    fn count(num_vertices: usize, horizon: i64) -> Option<usize> {
        usize::try_from(horizon).ok()?
            .checked_mul(3)?
            .checked_add(2)?
            .checked_mul(num_vertices)
    }

    pub fn horizon(&self) -> TimeUnit {
        self.horizon
    }

    /// Number of vertices
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Total number of variables over all three families
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Vertex ids ordered by their dense index
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Dense index of vertex `v`
    pub fn vertex_index(&self, v: &VertexId) -> Option<usize> {
        self.vertex_indices.get(v).copied()
    }

    /// Dense indices of the root vertices
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn is_root(&self, vi: usize) -> bool {
        self.roots.binary_search(&vi).is_ok()
    }

    fn state_block(&self) -> usize {
        (self.horizon as usize + 1) * self.vertices.len()
    }

    /// `B[t, v]` for `t` in `0..=T`
    pub fn burning(&self, t: TimeUnit, vi: usize) -> VarId {
        debug_assert!(t <= self.horizon && vi < self.vertices.len());
        VarId(t as usize * self.vertices.len() + vi)
    }

    /// `D[t, v]` for `t` in `0..=T`
    pub fn defended(&self, t: TimeUnit, vi: usize) -> VarId {
        debug_assert!(t <= self.horizon && vi < self.vertices.len());
        VarId(self.state_block() + t as usize * self.vertices.len() + vi)
    }

    /// `A[t, v]` for `t` in `1..=T`
    pub fn action(&self, t: TimeUnit, vi: usize) -> VarId {
        debug_assert!(t >= 1 && t <= self.horizon && vi < self.vertices.len());
        VarId(2 * self.state_block() + (t as usize - 1) * self.vertices.len() + vi)
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Look up a variable by its key, `None` if the key is out of range
    pub fn find(&self, kind: VarKind, t: TimeUnit, v: &VertexId) -> Option<VarId> {
        let vi = self.vertex_index(v)?;
        match kind {
            VarKind::Burning if t <= self.horizon => Some(self.burning(t, vi)),
            VarKind::Defended if t <= self.horizon => Some(self.defended(t, vi)),
            VarKind::Action if t >= 1 && t <= self.horizon => Some(self.action(t, vi)),
            _ => None
        }
    }
}
