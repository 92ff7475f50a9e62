pub mod errors;
pub mod render;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::{load_config, run_with};
