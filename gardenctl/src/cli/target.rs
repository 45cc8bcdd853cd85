use clap::{Args, Subcommand};

use super::{OutputFormat, write_stderr, write_stdout};
use crate::{
    cli::error::{self, Error},
    config::AccessRestrictionMessages,
    garden::ClientProvider,
    target::{self, Manager, Target, TargetKind},
};

#[derive(Args, Clone)]
#[command(args_conflicts_with_subcommands = true)]
pub struct TargetCommand {
    #[command(subcommand)]
    commands: Option<TargetCommands>,

    #[arg(
        value_name = "NAME_OR_PATTERN",
        help = "A value matching one of the patterns of the configured gardens. Without it, \
                the target flags are targeted."
    )]
    value: Option<String>,
}

#[derive(Clone, Subcommand)]
pub enum TargetCommands {
    #[command(about = "Target a garden")]
    Garden { name: String },

    #[command(about = "Target a project")]
    Project { name: String },

    #[command(about = "Target a seed")]
    Seed { name: String },

    #[command(about = "Target a shoot")]
    Shoot { name: String },

    #[command(about = "Target the control plane of the targeted shoot")]
    ControlPlane,

    #[command(alias = "drop", about = "Unset a level of the target and everything below it")]
    Unset { kind: TargetKind },

    #[command(about = "Print the current target")]
    View {
        #[arg(short = 'o', long = "output", help = "Print the target as yaml or json")]
        output: Option<OutputFormat>,
    },

    #[command(about = "Print the target history")]
    History,
}

impl TargetCommand {
    pub async fn run<P: ClientProvider>(self, manager: &Manager<P>) -> Result<(), Error> {
        let target = match (self.commands, self.value) {
            (Some(TargetCommands::Garden { name }), _) => manager.target_garden(&name).await?,
            (Some(TargetCommands::Project { name }), _) => manager.target_project(&name).await?,
            (Some(TargetCommands::Seed { name }), _) => manager.target_seed(&name).await?,
            (Some(TargetCommands::Shoot { name }), _) => manager.target_shoot(&name).await?,
            (Some(TargetCommands::ControlPlane), _) => manager.target_control_plane().await?,
            (Some(TargetCommands::Unset { kind }), _) => {
                let name = match kind {
                    TargetKind::Garden => manager.unset_garden().await?,
                    TargetKind::Project => manager.unset_project().await?,
                    TargetKind::Seed => manager.unset_seed().await?,
                    TargetKind::Shoot => manager.unset_shoot().await?,
                    TargetKind::ControlPlane => manager.unset_control_plane().await?,
                };
                return write_stdout(format!("Successfully unset targeted {kind} \"{name}\"\n"))
                    .await;
            }
            (Some(TargetCommands::View { output }), _) => {
                let target = manager.current_target()?;
                let view = match output {
                    Some(format) => format.render(&target)?,
                    None => format!("{target}\n"),
                };
                return write_stdout(view).await;
            }
            (Some(TargetCommands::History), _) => return write_stdout(manager.history()?).await,
            (None, Some(value)) => manager.target_match_pattern(&value).await?,
            (None, None) if !manager.flags().is_empty() => manager.target_flags().await?,
            (None, None) => return error::NothingToTargetSnafu.fail(),
        };

        if let Some(message) = success_message(&target) {
            write_stdout(message).await?;
        }
        if !target.shoot_name().is_empty()
            && let Some(notice) =
                access_restriction_notice(manager.access_restrictions(&target).await)
        {
            write_stderr(notice).await?;
        }
        Ok(())
    }
}

/// Text to print for the access restrictions of a newly targeted shoot.
///
/// A failed lookup does not fail the command, the shoot is targeted already.
fn access_restriction_notice(
    result: Result<AccessRestrictionMessages, target::Error>,
) -> Option<String> {
    match result {
        Ok(messages) if !messages.is_empty() => Some(format!("{messages}\n")),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("Failed to check access restrictions, error: {err}");
            None
        }
    }
}

/// Names the deepest level of `target`, like `targeted shoot "web"`.
fn success_message(target: &Target) -> Option<String> {
    let kind = target.kind()?;
    let name = match kind {
        TargetKind::Garden => target.garden_name(),
        TargetKind::Project => target.project_name(),
        TargetKind::Seed => target.seed_name(),
        TargetKind::Shoot | TargetKind::ControlPlane => target.shoot_name(),
    };
    Some(format!("Successfully targeted {kind} \"{name}\"\n"))
}
