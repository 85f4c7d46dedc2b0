//! Append-only record of the states a search visited.
//!
//! The graph exists for post-hoc inspection: it can be serialised to JSON
//! and carries enough per-node data to replay how the winning solution was
//! reached.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: usize,
    pub parent: Option<usize>,
    /// Pattern applied on the edge into this node; `None` for the root.
    pub pattern: Option<String>,
    /// Immediate gain of that application.
    pub step_gain: i64,
    /// Cumulative gain along the path from the root.
    pub total_gain: i64,
    /// Look-ahead-adjusted score used for beam ranking.
    pub predicted: f64,
    pub depth: usize,
    /// Byte length of the working text at this node.
    pub text_len: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
    pub pattern: String,
    pub gain: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub max_depth: usize,
    /// Node ids from the root to the best terminal, root first.
    pub best_path: Vec<usize>,
}

impl SearchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, text_len: usize) -> usize {
        self.push_node(None, None, 0, 0, 0.0, 0, text_len)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_child(
        &mut self,
        parent: usize,
        pattern: &str,
        step_gain: i64,
        total_gain: i64,
        predicted: f64,
        depth: usize,
        text_len: usize,
    ) -> usize {
        let id = self.push_node(
            Some(parent),
            Some(pattern.to_string()),
            step_gain,
            total_gain,
            predicted,
            depth,
            text_len,
        );
        self.edges.push(GraphEdge {
            from: parent,
            to: id,
            pattern: pattern.to_string(),
            gain: step_gain,
        });
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn push_node(
        &mut self,
        parent: Option<usize>,
        pattern: Option<String>,
        step_gain: i64,
        total_gain: i64,
        predicted: f64,
        depth: usize,
        text_len: usize,
    ) -> usize {
        let id = self.nodes.len();
        self.max_depth = self.max_depth.max(depth);
        self.nodes.push(GraphNode {
            id,
            parent,
            pattern,
            step_gain,
            total_gain,
            predicted,
            depth,
            text_len,
        });
        id
    }

    /// Walk parents from `terminal` up to the root and store the path.
    pub fn mark_best_path(&mut self, terminal: usize) {
        let mut path = Vec::new();
        let mut at = Some(terminal);
        while let Some(id) = at {
            path.push(id);
            at = self.nodes.get(id).and_then(|n| n.parent);
        }
        path.reverse();
        self.best_path = path;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_path_runs_root_to_terminal() {
        let mut g = SearchGraph::new();
        let root = g.add_root(10);
        let a = g.add_child(root, "ab", 3, 3, 3.0, 1, 8);
        let b = g.add_child(a, "cd", 2, 5, 5.0, 2, 6);
        g.mark_best_path(b);
        assert_eq!(g.best_path, vec![root, a, b]);
        assert_eq!(g.max_depth, 2);
        assert_eq!(g.edges.len(), 2);
    }
}
