pub mod config;
pub mod error;
pub mod inputs;
pub mod keys;
pub mod launcher;
pub mod payoffs;
pub mod records;
pub mod setup;
pub mod sweep;
pub mod util;
pub mod writer;

pub use config::SweepConfig;
pub use error::{SetupError, SetupResult};
pub use setup::{run_setup, ArtifactPolicy, SetupContext, SetupReport};
