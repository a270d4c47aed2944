mod launch_tracker;
mod output_buffer;
mod output_collector;
mod start_status;

pub use launch_tracker::LaunchTracker;
pub use output_buffer::OutputBuffer;
pub use start_status::{ProcessOutput, StartStatus};
