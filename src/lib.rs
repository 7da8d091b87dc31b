//! Docker environment lifecycle for browser test runs.
//!
//! Before tests run, [`EnvironmentOrchestrator::prepare`] makes sure a
//! single-node swarm is active, deploys the test stack from a clean slate,
//! and blocks until the service reports ready. After tests,
//! [`EnvironmentOrchestrator::complete`] removes the stack and waits for its
//! network to be released.
//!
//! ```rust,no_run
//! use stack_harness::config::Config;
//! use stack_harness::environment::EnvironmentOrchestrator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let environment = EnvironmentOrchestrator::from_config(&config.docker);
//!
//! environment.prepare().await?;
//! // ... run tests ...
//! environment.complete().await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod docker;
pub mod environment;
pub mod error;
pub mod exec;
pub mod poll;
pub mod server;
pub mod services;
pub mod testing;

pub use environment::EnvironmentOrchestrator;
