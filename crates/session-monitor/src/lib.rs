pub mod config;
pub mod factory;
pub mod logging;
pub mod signals;

pub use config::MonitorConfig;
pub use factory::build_monitor;
