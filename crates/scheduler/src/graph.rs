use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::{debug, warn};

use crate::error::GraphError;
use crate::model::{GraphNode, NodeStatus};

/// Nodes plus "must complete before" edges.
///
/// Node order is insertion order; it breaks every tie in ordering queries.
/// The edge set stays acyclic: `add_edge` refuses any edge that would close
/// a cycle and leaves the graph untouched when it does.
#[derive(Clone, Debug)]
pub struct DependencyGraph<T> {
    nodes: Vec<GraphNode<T>>,
    index: HashMap<String, usize>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl<T> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
        }
    }
}

impl<T> DependencyGraph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: impl Into<String>, payload: T) -> Result<(), GraphError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(GraphNode::new(id, payload));
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        Ok(())
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode<T>> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn payload(&self, id: &str) -> Option<&T> {
        self.node(id).map(|node| &node.payload)
    }

    pub fn payload_mut(&mut self, id: &str) -> Option<&mut T> {
        let idx = *self.index.get(id)?;
        Some(&mut self.nodes[idx].payload)
    }

    pub fn status(&self, id: &str) -> Option<NodeStatus> {
        self.node(id).map(|node| node.status)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode<T>> {
        self.nodes.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.id.clone()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct prerequisites of `id`, in insertion order of the edges.
    pub fn predecessors(&self, id: &str) -> Result<Vec<String>, GraphError> {
        let idx = self.position(id)?;
        Ok(self.predecessors[idx]
            .iter()
            .map(|&p| self.nodes[p].id.clone())
            .collect())
    }

    /// Direct dependents of `id`.
    pub fn successors(&self, id: &str) -> Result<Vec<String>, GraphError> {
        let idx = self.position(id)?;
        Ok(self.successors[idx]
            .iter()
            .map(|&s| self.nodes[s].id.clone())
            .collect())
    }

    /// `from` must reach `Completed` before `to` may start.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let from_idx = self.position(from)?;
        let to_idx = self.position(to)?;
        if from_idx == to_idx {
            return Err(GraphError::SelfLoop(from.to_string()));
        }
        if self.successors[from_idx].contains(&to_idx) {
            return Ok(());
        }
        if let Some(path) = self.path_between(to_idx, from_idx) {
            let mut ids: Vec<String> = path.iter().map(|&i| self.nodes[i].id.clone()).collect();
            ids.push(to.to_string());
            warn!("rejecting edge {from} -> {to}: cycle {}", ids.join(" -> "));
            return Err(GraphError::Cycle {
                from: from.to_string(),
                to: to.to_string(),
                path: ids,
            });
        }
        self.successors[from_idx].push(to_idx);
        self.predecessors[to_idx].push(from_idx);
        debug!("edge {from} -> {to}");
        Ok(())
    }

    /// Always false for graphs built through `add_edge`.
    pub fn has_cycle(&self) -> bool {
        self.kahn_order().len() != self.nodes.len()
    }

    /// Kahn's algorithm; among ready nodes the earliest inserted goes first.
    pub fn topological_sort(&self) -> Result<Vec<String>, GraphError> {
        let order = self.kahn_order();
        if order.len() != self.nodes.len() {
            let stuck = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(idx, _)| !order.contains(idx))
                .map(|(_, node)| node.id.clone())
                .collect();
            return Err(GraphError::CycleDetected(stuck));
        }
        Ok(order
            .into_iter()
            .map(|idx| self.nodes[idx].id.clone())
            .collect())
    }

    /// Pending nodes whose predecessors are all `Completed`, in insertion order.
    pub fn executable_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(idx, node)| node.status == NodeStatus::Pending && self.ready(*idx))
            .map(|(_, node)| node.id.clone())
            .collect()
    }

    /// The only way node status changes. Returns the previous status.
    pub fn update_node(&mut self, id: &str, status: NodeStatus) -> Result<NodeStatus, GraphError> {
        let idx = self.position(id)?;
        let previous = self.nodes[idx].status;
        if !previous.can_transition_to(status) {
            return Err(GraphError::InvalidTransition {
                id: id.to_string(),
                from: previous,
                to: status,
            });
        }
        if status == NodeStatus::InProgress && !self.ready(idx) {
            return Err(GraphError::InvalidTransition {
                id: id.to_string(),
                from: previous,
                to: status,
            });
        }
        self.nodes[idx].status = status;
        debug!("node {id}: {previous} -> {status}");
        Ok(previous)
    }

    /// Mark every Pending descendant of `id` as Blocked. Returns them in
    /// breadth-first order.
    pub fn block_dependents(&mut self, id: &str) -> Result<Vec<String>, GraphError> {
        let start = self.position(id)?;
        let mut blocked = Vec::new();
        let mut seen = vec![false; self.nodes.len()];
        let mut queue: VecDeque<usize> = self.successors[start].iter().copied().collect();
        while let Some(idx) = queue.pop_front() {
            if std::mem::replace(&mut seen[idx], true) {
                continue;
            }
            if self.nodes[idx].status == NodeStatus::Pending {
                self.nodes[idx].status = NodeStatus::Blocked;
                blocked.push(self.nodes[idx].id.clone());
            }
            queue.extend(self.successors[idx].iter().copied());
        }
        if !blocked.is_empty() {
            debug!("blocked {} dependents of {id}: {:?}", blocked.len(), blocked);
        }
        Ok(blocked)
    }

    /// Pending nodes that can never run because a predecessor failed or was blocked.
    pub fn unreachable_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(idx, node)| {
                node.status == NodeStatus::Pending
                    && self.predecessors[*idx]
                        .iter()
                        .any(|&p| self.nodes[p].status.poisons_dependents())
            })
            .map(|(_, node)| node.id.clone())
            .collect()
    }

    /// No node is Pending or InProgress.
    pub fn is_finished(&self) -> bool {
        self.nodes.iter().all(|node| node.status.is_terminal())
    }

    pub fn ids_with_status(&self, status: NodeStatus) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| node.status == status)
            .map(|node| node.id.clone())
            .collect()
    }

    fn position(&self, id: &str) -> Result<usize, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    fn ready(&self, idx: usize) -> bool {
        self.predecessors[idx]
            .iter()
            .all(|&p| self.nodes[p].status == NodeStatus::Completed)
    }

    fn kahn_order(&self) -> Vec<usize> {
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(idx, _)| idx)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(idx) = ready.pop_first() {
            order.push(idx);
            for &next in &self.successors[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }
        order
    }

    /// Path from `start` to `goal` following edges, if one exists.
    fn path_between(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let mut parent: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(idx) = queue.pop_front() {
            if idx == goal {
                let mut path = vec![goal];
                let mut cursor = goal;
                while let Some(prev) = parent[cursor] {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            for &next in &self.successors[idx] {
                if !seen[next] {
                    seen[next] = true;
                    parent[next] = Some(idx);
                    queue.push_back(next);
                }
            }
        }
        None
    }
}
