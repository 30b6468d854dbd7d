pub mod bootstrap;
pub mod ping;
pub mod show_config;
