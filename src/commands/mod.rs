//! CLI command implementations.

mod config;
mod scan;
mod watch;

pub use config::{cmd_config_init, cmd_config_path, cmd_config_show};
pub use scan::cmd_scan;
pub use watch::cmd_watch;
