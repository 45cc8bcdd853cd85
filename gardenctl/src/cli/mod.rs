//! The `gardenctl` command line.
//!
//! Every command shares the target flags (`--garden`, `--project`, `--seed`,
//! `--shoot`, `--control-plane`), which override the session's stored target
//! for one invocation.
//!
//! # Examples
//!
//! ```bash
//! # Target a garden, then a shoot in one of its projects
//! gardenctl target garden live
//! gardenctl target --project team-a shoot web
//!
//! # Target whatever a configured pattern extracts from a URL
//! gardenctl target https://dashboard.example.com/namespace/garden-team-a/shoots/web
//!
//! # Point kubectl at the current target
//! eval $(gardenctl kubectl-env bash)
//! ```

mod config;
pub mod error;
mod kubeconfig;
mod kubectl_env;
mod resolve;
mod target;
mod version;

use std::{io::Write, path::PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use gardenctl_base::{CLI_PROGRAM_NAME, HISTORY_FILE_NAME, consts::env};
use serde::Serialize;
use snafu::ResultExt;
use tokio::{io::AsyncWriteExt, runtime::Runtime};
use tokio_util::sync::CancellationToken;

pub use self::error::Error;
use self::{
    config::ConfigCommands, kubeconfig::KubeconfigCommand, kubectl_env::KubectlEnvCommand,
    resolve::ResolveCommand, target::TargetCommand, version::VersionCommand,
};
use crate::{
    config::Config,
    garden::KubeClientProvider,
    session::{self, Session},
    target::{Manager, TargetFlags},
};

/// `Cli` is the entry point of the gardenctl command line.
#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    about = "gardenctl: target and access Gardener landscapes.",
    long_about = "gardenctl keeps track of a target per shell session, a garden cluster and \
                  optionally one of its projects or seeds, a shoot and the shoot's control \
                  plane, and derives kubeconfigs for whatever is targeted.",
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[clap(flatten)]
    target_flags: TargetFlags,

    /// Path to the configuration file.
    ///
    /// Defaults to `~/.garden/gardenctl-v2.yaml`.
    #[clap(
        long = "config",
        env = env::CONFIG_FILE,
        global = true,
        help = "Specify a configuration file. Defaults to ~/.garden/gardenctl-v2.yaml or \
                GCTL_CONFIG_FILE env var."
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = env::LOG_LEVEL,
        global = true,
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,

    #[clap(flatten)]
    environment: Environment,
}

/// Settings taken from the environment of the invoking shell.
#[derive(Args, Clone, Debug, Default)]
struct Environment {
    #[clap(long = "session-id", env = env::SESSION_ID, global = true, hide = true)]
    session_id: Option<String>,

    #[clap(long = "term-session-id", env = env::TERM_SESSION_ID, global = true, hide = true)]
    term_session_id: Option<String>,

    #[clap(long = "home", env = env::HOME, global = true, hide = true)]
    home: Option<String>,

    #[clap(long = "config-name", env = env::CONFIG_NAME, global = true, hide = true)]
    config_name: Option<String>,

    #[clap(long = "link-kubeconfig", env = env::LINK_KUBECONFIG, global = true, hide = true)]
    link_kubeconfig: Option<bool>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Display version information")]
    Version(VersionCommand),

    #[command(about = "Generate shell completion script for the specified shell")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Set or unset the target, or view and list it")]
    Target(TargetCommand),

    #[command(about = "Print the kubeconfig of the current target")]
    Kubeconfig(KubeconfigCommand),

    #[command(about = "Resolve the current target to garden, project, seed and shoot")]
    Resolve(ResolveCommand),

    #[command(about = "Generate a script that points KUBECONFIG to the current target")]
    KubectlEnv(KubectlEnvCommand),

    #[command(about = "View and modify the gardenctl configuration")]
    Config {
        #[command(subcommand)]
        commands: ConfigCommands,
    },
}

/// Format of structured command output.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// Serializes `value`, ending the document with a newline.
    ///
    /// # Errors
    ///
    /// Fails if `value` cannot be serialized.
    pub fn render<T: Serialize>(self, value: &T) -> Result<String, Error> {
        match self {
            Self::Yaml => serde_yaml::to_string(value).context(error::SerializeYamlSnafu),
            Self::Json => serde_json::to_string_pretty(value)
                .map(|json| json + "\n")
                .context(error::SerializeJsonSnafu),
        }
    }
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    fn config_file_path(&self) -> PathBuf {
        self.config_file.clone().unwrap_or_else(|| {
            gardenctl_base::config::config_file_path(
                &self.home(),
                self.environment.config_name.as_deref(),
            )
        })
    }

    fn home(&self) -> PathBuf {
        gardenctl_base::config::gardenctl_home(self.environment.home.as_deref())
    }

    fn load_config(&self) -> Result<Config, Error> { Ok(Config::load(self.config_file_path())?) }

    /// Whether to link the kubeconfig of the target into the session.
    ///
    /// The environment of the shell wins over the configuration file, and is
    /// never written back to it.
    fn link_kubeconfig(&self, config: &Config) -> bool {
        self.environment.link_kubeconfig.unwrap_or_else(|| config.link_kubeconfig())
    }

    /// Builds the target manager of the calling shell's session.
    fn manager(&self, config: Config) -> Result<Manager<KubeClientProvider>, Error> {
        let id = session::resolve_session_id(
            self.environment.session_id.as_deref(),
            self.environment.term_session_id.as_deref(),
        )?;
        let session = Session::open(&std::env::temp_dir(), &id)?;
        let link_kubeconfig = self.link_kubeconfig(&config);
        Ok(Manager::new(config, KubeClientProvider, session.dir())
            .with_flags(self.target_flags.clone())
            .with_history_file(self.home().join(HISTORY_FILE_NAME))
            .with_link_kubeconfig(link_kubeconfig))
    }

    /// Runs the parsed command and returns the process exit code.
    ///
    /// Commands run on a tokio runtime and are abandoned on Ctrl-C. Files are
    /// only written after the last garden request of a command, so an
    /// interrupted command leaves the session untouched.
    ///
    /// # Errors
    ///
    /// Returns the error of the command, or [`Error::Interrupted`].
    pub fn run(self) -> Result<i32, Error> {
        match &self.commands {
            Some(Commands::Version(cmd)) if !cmd.needs_target() => {
                let version = cmd.render_client()?;
                std::io::stdout().write_all(version.as_bytes()).context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(*shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            None => {
                let help = Self::command().render_long_help().ansi().to_string();
                std::io::stderr().write_all(help.as_bytes()).context(error::WriteStderrSnafu)?;
                return Ok(1);
            }
            _ => {}
        }

        let config = self.load_config()?;
        let mut log = config.log.clone().unwrap_or_default();
        if let Some(level) = self.log_level {
            log.level = level;
        }
        log.init();

        let fut = async move {
            match self.commands.clone() {
                Some(Commands::Config { commands }) => {
                    commands.run(config, &self.config_file_path()).await?;
                }
                Some(Commands::Target(cmd)) => cmd.run(&self.manager(config)?).await?,
                Some(Commands::Kubeconfig(cmd)) => cmd.run(&self.manager(config)?).await?,
                Some(Commands::Resolve(cmd)) => cmd.run(&self.manager(config)?).await?,
                Some(Commands::KubectlEnv(cmd)) => cmd.run(&self.manager(config)?).await?,
                Some(Commands::Version(cmd)) => cmd.run(&self.manager(config)?).await?,
                Some(Commands::Completions { .. }) | None => {}
            }
            Ok(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(async move {
            let cancel_token = CancellationToken::new();
            let signal_handle = tokio::spawn({
                let cancel_token = cancel_token.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::debug!("Received Ctrl-C, cancelling command");
                        cancel_token.cancel();
                    }
                }
            });

            let result = tokio::select! {
                result = fut => result,
                () = cancel_token.cancelled() => Err(Error::Interrupted),
            };
            signal_handle.abort();
            result
        })
    }
}

/// Writes `data` to stdout.
async fn write_stdout(data: impl AsRef<[u8]>) -> Result<(), Error> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(data.as_ref()).await.context(error::WriteStdoutSnafu)?;
    stdout.flush().await.context(error::WriteStdoutSnafu)
}

/// Writes `data` to stderr.
async fn write_stderr(data: impl AsRef<[u8]>) -> Result<(), Error> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(data.as_ref()).await.context(error::WriteStderrSnafu)?;
    stderr.flush().await.context(error::WriteStderrSnafu)
}
