use crate::Node;

use pc_config::Config;

use std::sync::Arc;

/// Source of the nodes the supervisor should manage.
///
/// The supervisor only reads from it; adding or removing nodes is the
/// registry's concern.
pub trait NodeRegistry: Send + Sync {
    fn list_nodes(&self) -> Vec<Arc<Node>>;

    fn find_node(&self, name: &str) -> Option<Arc<Node>> {
        self.list_nodes().into_iter().find(|node| node.name == name)
    }
}

/// Registry backed by the `[[nodes]]` tables of the config file.
#[derive(Debug, Default)]
pub struct StaticNodeRegistry {
    nodes: Vec<Arc<Node>>,
}

impl StaticNodeRegistry {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .nodes
                .iter()
                .map(|node| Node::from_config(node, &config.tls))
                .collect(),
        )
    }
}

impl NodeRegistry for StaticNodeRegistry {
    fn list_nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.clone()
    }
}
