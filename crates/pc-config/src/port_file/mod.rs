pub(crate) mod admin_port_file;

pub use admin_port_file::{AdminPort, AdminPortFile};
