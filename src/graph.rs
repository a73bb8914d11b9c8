use std::{collections::BTreeSet,
          fmt::Formatter,
          fs::File,
          io::{prelude::*, BufReader},
          num::ParseIntError};

use serde::Serialize;

use crate::firefighter::VertexId;

/// A graph node, identified by its position in the graph file
#[derive(Debug, Serialize)]
pub struct Node {
    pub id: VertexId,
}

/// An undirected graph edge between two nodes a and b, with `a <= b`
#[derive(Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    pub a: VertexId,
    pub b: VertexId,
}

/// An undirected graph with nodes and edges
#[derive(Debug, Serialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub num_nodes: usize,
    pub num_edges: usize,
}

impl Graph {
    /// Parse an undirected graph from an FMI-style file: `#` comment header,
    /// number of nodes, number of edges, one line per node and one line `src tgt ...` per edge.
    /// Edges listed in both directions are merged.
    pub fn parse_from_file(graph_file_path: &str) -> Result<Self, ParseError> {
        let graph_file = File::open(graph_file_path)?;
        Self::parse(BufReader::new(graph_file))
    }

    /// Parse an undirected graph from any buffered reader, see `parse_from_file`
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut lines = reader.lines()
            .enumerate()
            .map(|(i, line)| line.map(|line| (i + 1, line)));

        // Skip header and blank lines
        let mut next_line = move || -> Result<(usize, String), ParseError> {
            loop {
                match lines.next() {
                    Some(Ok((line_no, line))) => {
                        let trimmed = line.trim();
                        if !trimmed.is_empty() && !trimmed.starts_with('#') {
                            return Ok((line_no, trimmed.to_string()));
                        }
                    }
                    Some(Err(err)) => return Err(err.into()),
                    None => return Err(ParseError::UnexpectedEof)
                }
            }
        };

        let num_nodes: usize = next_line()?.1.parse()?;
        let num_declared_edges: usize = next_line()?.1.parse()?;

        let mut nodes = Vec::with_capacity(num_nodes);
        for i in 0..num_nodes {
            // Node lines may carry coordinates and other data, only their position matters
            next_line()?;
            nodes.push(Node { id: i });
        }

        let mut edges = BTreeSet::new();
        for _ in 0..num_declared_edges {
            let (line_no, line) = next_line()?;
            let mut split = line.split_whitespace();

            let src: VertexId = split.next()
                .ok_or(ParseError::UnexpectedEol(line_no))?
                .parse()?;
            let tgt: VertexId = split.next()
                .ok_or(ParseError::UnexpectedEol(line_no))?
                .parse()?;
            for node_id in [src, tgt] {
                if node_id >= num_nodes {
                    return Err(ParseError::InvalidNode(node_id));
                }
            }

            edges.insert(Edge {
                a: src.min(tgt),
                b: src.max(tgt),
            });
        }

        let edges: Vec<_> = edges.into_iter().collect();
        log::debug!("Parsed graph with {} nodes and {} undirected edges", num_nodes, edges.len());

        Ok(Self {
            nodes,
            num_nodes,
            num_edges: edges.len(),
            edges,
        })
    }
}

#[derive(Debug)]
pub enum ParseError {
    IO(std::io::Error),
    ParseInt(ParseIntError),
    UnexpectedEof,
    UnexpectedEol(usize),
    InvalidNode(usize),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IO(err) => write!(f, "{}", err),
            Self::ParseInt(err) => write!(f, "{}", err),
            Self::UnexpectedEof => write!(f, "Unexpected EOF"),
            Self::UnexpectedEol(line_no) => write!(f, "Unexpected EOL in line {}", line_no),
            Self::InvalidNode(node_id) => write!(f, "Invalid node {}", node_id)
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Self::IO(ref err) => Some(err),
            Self::ParseInt(ref err) => Some(err),
            _ => None
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::IO(err)
    }
}

impl From<ParseIntError> for ParseError {
    fn from(err: ParseIntError) -> Self {
        Self::ParseInt(err)
    }
}
