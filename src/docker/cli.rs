//! Docker CLI command lines.

use std::path::Path;

use crate::exec::shell_quote;

/// Label Docker puts on every resource created by `docker stack deploy`.
pub const STACK_NAMESPACE_LABEL: &str = "com.docker.stack.namespace";

/// Builds the Docker CLI invocations used by the harness.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, args: &[&str]) -> String {
        std::iter::once(shell_quote(&self.binary))
            .chain(args.iter().map(|a| shell_quote(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn swarm_info(&self) -> String {
        self.command(&["info", "--format", "{{json .Swarm}}"])
    }

    pub fn swarm_init(&self, advertise_addr: Option<&str>) -> String {
        match advertise_addr {
            Some(addr) => self.command(&["swarm", "init", "--advertise-addr", addr]),
            None => self.command(&["swarm", "init"]),
        }
    }

    pub fn stack_ls(&self) -> String {
        self.command(&["stack", "ls", "--format", "{{.Name}}"])
    }

    pub fn stack_deploy(&self, compose_file: &Path, stack: &str) -> String {
        let compose_file = compose_file.to_string_lossy();
        self.command(&["stack", "deploy", "-c", &compose_file, stack])
    }

    pub fn stack_rm(&self, stack: &str) -> String {
        self.command(&["stack", "rm", stack])
    }

    /// Networks that still belong to `stack`, one name per line.
    pub fn stack_networks(&self, stack: &str) -> String {
        let filter = format!("label={STACK_NAMESPACE_LABEL}={stack}");
        self.command(&["network", "ls", "--filter", &filter, "--format", "{{.Name}}"])
    }
}
