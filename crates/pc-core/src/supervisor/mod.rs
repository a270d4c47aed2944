mod handlers;
mod metrics;
mod state_store;
mod supervisor;

pub use metrics::Metrics;
pub use supervisor::Supervisor;
