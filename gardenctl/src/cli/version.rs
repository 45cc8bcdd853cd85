use std::fmt::Write as _;

use clap::Args;
use gardenctl_base::PROJECT_VERSION;
use serde::Serialize;
use snafu::ResultExt;

use super::{OutputFormat, write_stdout};
use crate::{
    cli::error::{self, Error},
    garden::ClientProvider,
    target::Manager,
};

#[derive(Args, Clone)]
pub struct VersionCommand {
    #[arg(short = 'o', long = "output", help = "Print the version information as yaml or json")]
    output: Option<OutputFormat>,

    #[arg(
        long = "server",
        help = "Also print the Kubernetes version of the cluster of the current target"
    )]
    server: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    client_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    server_version: Option<String>,
}

impl VersionInfo {
    fn client() -> Self {
        Self { client_version: PROJECT_VERSION.to_string(), server_version: None }
    }

    fn render(&self, output: Option<OutputFormat>) -> Result<String, Error> {
        if let Some(format) = output {
            return format.render(self);
        }
        let mut text = format!("Client Version: {}\n", self.client_version);
        if let Some(server_version) = &self.server_version {
            let _unused = writeln!(text, "Server Version: {server_version}");
        }
        Ok(text)
    }
}

impl VersionCommand {
    /// Whether the command talks to a cluster and therefore needs a session.
    pub const fn needs_target(&self) -> bool { self.server }

    /// Renders the version of gardenctl alone.
    pub fn render_client(&self) -> Result<String, Error> {
        VersionInfo::client().render(self.output)
    }

    pub async fn run<P: ClientProvider>(self, manager: &Manager<P>) -> Result<(), Error> {
        let target = manager.current_target()?;
        let client = manager.cluster_client(&target).await?;
        let server = client.apiserver_version().await.context(error::GetServerVersionSnafu)?;
        tracing::debug!("Cluster of target {target} runs {}", server.git_version);

        let info =
            VersionInfo { server_version: Some(server.git_version), ..VersionInfo::client() };
        write_stdout(info.render(self.output)?).await
    }
}
