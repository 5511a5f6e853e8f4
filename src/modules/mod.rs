pub mod agent;
pub mod behavior;
pub mod config;
pub mod error;
pub mod grid;
pub mod model;
pub mod scape;
pub mod stats;
pub mod view;
