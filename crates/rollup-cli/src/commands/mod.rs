//! CLI command implementations.

pub mod aggregate;
pub mod init_config;
pub mod inspect;
