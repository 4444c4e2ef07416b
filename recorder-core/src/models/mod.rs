pub mod artifact;
pub mod config;
pub mod error;
pub mod export;
pub mod state;
