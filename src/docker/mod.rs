//! Docker swarm and stack management through the Docker CLI.
//!
//! ```text
//!   ensure_cluster_active()          deploy(descriptor)
//!          │                                │
//!          ▼                                ▼
//!   ┌──────────────┐   ┌───────────────────────────┐   ┌──────────────┐
//!   │ docker info  │   │ remove_if_present         │──▶│ stack deploy │
//!   │ swarm init?  │   │ (stack rm + network poll) │   └──────┬───────┘
//!   └──────────────┘   └───────────────────────────┘          │
//!                                                              ▼
//!                                                     ┌────────────────┐
//!                                                     │ readiness poll │
//!                                                     └────────────────┘
//! ```

pub mod cli;
pub mod readiness;
pub mod stack;
pub mod swarm;

pub use cli::DockerCli;
pub use readiness::{HttpStatusCheck, ReadinessCheck};
pub use stack::{PollSettings, StackDescriptor, StackManager};
pub use swarm::{ClusterOutcome, LocalNodeState, SwarmInfo, SwarmInitializer};
