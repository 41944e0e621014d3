pub mod accumulator;
pub mod control_panel;
pub mod droid;
pub mod orchestrator;
pub mod output_dir;
pub mod progress;
pub mod site_handler;
pub mod sites;

#[cfg(test)]
pub mod fake;

pub use control_panel::*;
pub use droid::*;
pub use orchestrator::*;
pub use output_dir::*;
pub use progress::*;
