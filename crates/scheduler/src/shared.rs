use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::error::GraphError;
use crate::graph::DependencyGraph;
use crate::model::NodeStatus;

/// Graph shared between dispatcher workers.
///
/// Claiming picks the first executable node and moves it to `InProgress`
/// under one lock, so two workers can never claim the same node.
pub struct SharedGraph<T> {
    inner: Arc<Mutex<DependencyGraph<T>>>,
}

impl<T> Clone for SharedGraph<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> SharedGraph<T> {
    pub fn new(graph: DependencyGraph<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Claim the next executable node, returning its id and a copy of its payload.
    pub fn claim_executable(&self) -> Option<(String, T)> {
        let mut graph = self.inner.lock();
        let id = graph.executable_nodes().into_iter().next()?;
        graph.update_node(&id, NodeStatus::InProgress).ok()?;
        let payload = graph.payload(&id)?.clone();
        Some((id, payload))
    }

    pub fn complete(&self, id: &str) -> Result<(), GraphError> {
        self.inner.lock().update_node(id, NodeStatus::Completed)?;
        Ok(())
    }

    /// Mark failed and block everything downstream. Returns the blocked ids.
    pub fn fail(&self, id: &str) -> Result<Vec<String>, GraphError> {
        let mut graph = self.inner.lock();
        graph.update_node(id, NodeStatus::Failed)?;
        let blocked = graph.block_dependents(id)?;
        if !blocked.is_empty() {
            info!("{id} failed; blocked {}", blocked.join(", "));
        }
        Ok(blocked)
    }

    pub fn status(&self, id: &str) -> Option<NodeStatus> {
        self.inner.lock().status(id)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().is_finished()
    }

    /// Nothing claimable and nothing running.
    pub fn is_idle(&self) -> bool {
        let graph = self.inner.lock();
        graph.executable_nodes().is_empty()
            && graph.ids_with_status(NodeStatus::InProgress).is_empty()
    }

    /// Copy of the current graph.
    pub fn snapshot(&self) -> DependencyGraph<T> {
        self.inner.lock().clone()
    }
}
