pub mod error;
pub mod graph;
pub mod model;
pub mod shared;

pub use error::GraphError;
pub use graph::DependencyGraph;
pub use model::{GraphNode, NodeStatus};
pub use shared::SharedGraph;
