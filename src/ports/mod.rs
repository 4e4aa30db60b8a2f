//! Port traits for the collaborators the domain depends on.

pub mod config_port;
pub mod data_port;
