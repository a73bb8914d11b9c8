use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::firefighter::VertexId;
use crate::graph::Graph;

/// Immutable description of a firefighter problem instance: vertices, undirected adjacency,
/// initially burning roots and the time horizon.
///
/// Construction does not validate anything. Validation happens when the instance is lowered
/// into a model, so that every malformed instance is reported before a solve is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSpec {
    vertices: BTreeSet<VertexId>,
    adjacency: BTreeMap<VertexId, BTreeSet<VertexId>>,
    roots: BTreeSet<VertexId>,
    horizon: i64,
}

impl GraphSpec {
    /// Create an instance from an explicit adjacency relation
    pub fn new(vertices: BTreeSet<VertexId>,
               adjacency: BTreeMap<VertexId, BTreeSet<VertexId>>,
               roots: BTreeSet<VertexId>,
               horizon: i64) -> Self {
        Self {
            vertices,
            adjacency,
            roots,
            horizon,
        }
    }

    /// Create an instance from an edge list. Every edge is inserted in both directions,
    /// so the resulting adjacency is always symmetric.
    pub fn from_edges<V, E, R>(vertices: V, edges: E, roots: R, horizon: i64) -> Self
        where V: IntoIterator<Item=VertexId>,
              E: IntoIterator<Item=(VertexId, VertexId)>,
              R: IntoIterator<Item=VertexId> {
        let mut adjacency: BTreeMap<VertexId, BTreeSet<VertexId>> = BTreeMap::new();
        for (a, b) in edges {
            adjacency.entry(a).or_default().insert(b);
            adjacency.entry(b).or_default().insert(a);
        }

        Self::new(vertices.into_iter().collect(),
                  adjacency,
                  roots.into_iter().collect(),
                  horizon)
    }

    /// Create an instance from a parsed graph file
    pub fn from_graph<R>(graph: &Graph, roots: R, horizon: i64) -> Self
        where R: IntoIterator<Item=VertexId> {
        Self::from_edges(graph.nodes.iter().map(|node| node.id),
                         graph.edges.iter().map(|edge| (edge.a, edge.b)),
                         roots,
                         horizon)
    }

    pub fn vertices(&self) -> &BTreeSet<VertexId> {
        &self.vertices
    }

    pub fn adjacency(&self) -> &BTreeMap<VertexId, BTreeSet<VertexId>> {
        &self.adjacency
    }

    /// Neighbours of `vertex`, empty if it has no adjacency entry
    pub fn neighbours(&self, vertex: &VertexId) -> impl Iterator<Item=&VertexId> + '_ {
        self.adjacency.get(vertex)
            .into_iter()
            .flat_map(|neighbours| neighbours.iter())
    }

    pub fn roots(&self) -> &BTreeSet<VertexId> {
        &self.roots
    }

    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Is `vertex` one of the initially burning roots?
    pub fn is_root(&self, vertex: &VertexId) -> bool {
        self.roots.contains(vertex)
    }
}

#[cfg(test)]
mod test {
    use crate::firefighter::instance::GraphSpec;

    #[test]
    fn test_from_edges_is_symmetric() {
        let spec = GraphSpec::from_edges(1..=3, vec![(1, 2), (2, 3)], vec![1], 2);

        for (v, neighbours) in spec.adjacency() {
            for u in neighbours {
                assert!(spec.neighbours(u).any(|w| w == v), "{} lists {} but not vice versa", v, u);
            }
        }
        assert_eq!(spec.neighbours(&2).copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_isolated_vertex_has_no_neighbours() {
        let spec = GraphSpec::from_edges(1..=3, vec![(1, 2)], vec![1], 1);

        assert_eq!(spec.neighbours(&3).count(), 0);
        assert!(spec.is_root(&1));
        assert!(!spec.is_root(&3));
        assert_eq!(spec.num_vertices(), 3);
    }
}
