mod command_line;
mod os_process_layer;
mod process_layer;

pub use command_line::build_command_line;
pub use os_process_layer::OsProcessLayer;
pub use process_layer::{NodeProcess, OutputStream, ProcessLayer, SpawnedProcess};
