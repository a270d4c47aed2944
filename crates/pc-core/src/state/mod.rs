mod node_state;
mod node_state_type;
mod node_status;

pub use node_state::{NodeState, StateData};
pub use node_state_type::NodeStateType;
pub use node_status::NodeStatus;
