//! CLI command handling.
//!
//! Provides subcommands for:
//! - Bringing the Docker environment up (`prepare`)
//! - Tearing it down (`complete`)
//! - Wrapping a test command with both (`run -- <cmd>`)
//! - Serving the site under test until interrupted (`serve`)
//! - Showing swarm and stack state (`status`)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ColorChoice, Parser, Subcommand};

use crate::config::Config;
use crate::docker::{DockerCli, SwarmInitializer};
use crate::environment::EnvironmentOrchestrator;
use crate::exec::{CommandRunner, ShellRunner};
use crate::server::StaticServer;
use crate::services::{DockerService, ServiceManager, StaticSiteService};

#[derive(Parser, Debug)]
#[command(name = "stack-harness")]
#[command(about = "Manage the Docker swarm stack used by browser tests")]
#[command(
    long_about = "Brings up a single-node Docker swarm stack before tests and removes it afterwards.\nExamples:\n  stack-harness prepare\n  stack-harness run -- npx wdio run wdio.conf.js"
)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (TOML); environment variables take precedence
    #[arg(short, long, global = true, env = "STACK_HARNESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the swarm, deploy the stack and wait until it is ready
    Prepare,

    /// Remove the stack and wait for its network to be released
    Complete,

    /// Prepare, run a test command, then complete
    #[command(
        long_about = "Runs the prepare hooks, executes the given command, and always runs the complete hooks.\nThe exit status is the test command's; cleanup failures are only logged.\nExample: stack-harness run -- cargo test --test e2e"
    )]
    Run {
        /// Skip the Docker environment (only serve the site, if configured)
        #[arg(long)]
        no_docker: bool,

        /// Test command and its arguments
        #[arg(trailing_var_arg = true, required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Serve the configured site directory until Ctrl-C
    Serve {
        /// Directory to serve (overrides SITE_DIR)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Port to listen on (overrides SITE_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show swarm state and whether the stack is deployed
    Status,
}

/// Run a parsed CLI command.
pub async fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Prepare => {
            EnvironmentOrchestrator::from_config(&config.docker)
                .prepare()
                .await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Complete => {
            EnvironmentOrchestrator::from_config(&config.docker)
                .complete()
                .await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { no_docker, command } => run_tests(&config, no_docker, &command).await,
        Command::Serve { dir, port } => serve(config, dir, port).await,
        Command::Status => status(&config).await,
    }
}

fn build_services(config: &Config, no_docker: bool) -> ServiceManager {
    let mut services = ServiceManager::new();
    if config.docker.enabled && !no_docker {
        services.add(Box::new(DockerService::new(
            EnvironmentOrchestrator::from_config(&config.docker),
        )));
    }
    services.add(Box::new(StaticSiteService::new(config.site.clone())));
    services
}

async fn run_tests(config: &Config, no_docker: bool, command: &[String]) -> anyhow::Result<ExitCode> {
    let services = build_services(config, no_docker);

    let outcome = match services.prepare_all().await {
        Ok(()) => Some(execute(command).await),
        Err(e) => {
            tracing::error!("Environment preparation failed, tests not run: {}", e);
            None
        }
    };

    let failures = services.complete_all().await;
    if !failures.is_empty() {
        tracing::warn!(
            "{} service(s) failed to clean up; test result unaffected",
            failures.len()
        );
    }

    match outcome {
        Some(Ok(code)) => Ok(code),
        Some(Err(e)) => Err(e),
        None => Ok(ExitCode::FAILURE),
    }
}

async fn execute(command: &[String]) -> anyhow::Result<ExitCode> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("no test command given"))?;

    tracing::info!("Running tests: {}", command.join(" "));
    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| anyhow::anyhow!("failed to run `{program}`: {e}"))?;

    tracing::info!("Test command finished with {}", status);
    Ok(match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}

async fn serve(config: Config, dir: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<ExitCode> {
    let mut site = config.site.unwrap_or_default();
    if let Some(dir) = dir {
        site.dir = dir;
    }
    if let Some(port) = port {
        site.port = port;
    }

    let server = StaticServer::new(site);
    let addr = server.start().await?;
    println!("Serving {} at http://{}/", server.config().dir.display(), addr);

    tokio::signal::ctrl_c().await?;
    server.stop().await;
    Ok(ExitCode::SUCCESS)
}

async fn status(config: &Config) -> anyhow::Result<ExitCode> {
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner::new());
    print!("{}", status_report(config, runner).await?);
    Ok(ExitCode::SUCCESS)
}

async fn status_report(config: &Config, runner: Arc<dyn CommandRunner>) -> anyhow::Result<String> {
    let docker = DockerCli::new(&config.docker.binary);
    let descriptor = config.docker.descriptor();

    let swarm = SwarmInitializer::new(runner.clone(), docker.clone())
        .swarm_info()
        .await?;
    let stacks = runner.run(&docker.stack_ls()).await?;
    let deployed = stacks.lines().any(|name| name == descriptor.name());

    Ok(format!(
        "Swarm:   {:?}\nStack:   {} ({})\nCompose: {}\nStatus:  {}\n",
        swarm.local_node_state,
        descriptor.name(),
        if deployed { "deployed" } else { "not deployed" },
        descriptor.compose_file().display(),
        config.docker.status_url,
    ))
}
