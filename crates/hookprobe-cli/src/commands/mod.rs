pub mod config;
pub mod django;
pub mod package;
pub mod probes;
pub mod qt;
