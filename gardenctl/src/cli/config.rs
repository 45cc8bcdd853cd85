use std::path::{Path, PathBuf};

use clap::Subcommand;
use snafu::OptionExt;

use super::{OutputFormat, write_stdout};
use crate::{
    cli::error::{self, Error},
    config::{Config, Garden},
};

#[derive(Clone, Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the gardenctl configuration")]
    View {
        #[arg(short = 'o', long = "output", default_value = "yaml", help = "Output format")]
        output: OutputFormat,
    },

    #[command(about = "Add a garden to the configuration or modify an existing one")]
    SetGarden(SetGardenArgs),

    #[command(about = "Remove a garden from the configuration")]
    DeleteGarden {
        #[arg(help = "Name of the garden")]
        name: String,
    },
}

#[derive(Clone, clap::Args)]
pub struct SetGardenArgs {
    #[arg(help = "Name of the garden")]
    name: String,

    #[arg(long = "alias", help = "Alternative name of the garden")]
    alias: Option<String>,

    #[arg(long = "kubeconfig", help = "Path to the kubeconfig of the garden cluster")]
    kubeconfig: Option<PathBuf>,

    #[arg(long = "context", help = "Context of the kubeconfig to use")]
    context: Option<String>,

    #[arg(
        long = "pattern",
        help = "Regular expression matching values to target, may be repeated. Replaces the \
                existing patterns."
    )]
    patterns: Vec<String>,
}

impl SetGardenArgs {
    /// Creates the garden or overwrites the given fields of an existing one.
    fn apply_to(self, config: &mut Config) -> Result<(), Error> {
        let Self { name, alias, kubeconfig, context, patterns } = self;

        let mut garden = match config.gardens.iter().find(|garden| garden.name == name) {
            Some(garden) => garden.clone(),
            None => Garden {
                name: name.clone(),
                kubeconfig: kubeconfig
                    .clone()
                    .context(error::MissingGardenKubeconfigSnafu { name: &name })?,
                ..Garden::default()
            },
        };
        if let Some(alias) = alias {
            garden.alias = Some(alias).filter(|alias| !alias.is_empty());
        }
        if let Some(kubeconfig) = kubeconfig {
            garden.kubeconfig = kubeconfig;
        }
        if let Some(context) = context {
            garden.context = Some(context).filter(|context| !context.is_empty());
        }
        if !patterns.is_empty() {
            garden.patterns = patterns;
        }
        config.upsert_garden(garden);
        Ok(())
    }
}

impl ConfigCommands {
    pub async fn run(self, mut config: Config, config_file: &Path) -> Result<(), Error> {
        match self {
            Self::View { output } => write_stdout(output.render(&config)?).await,
            Self::SetGarden(args) => {
                let name = args.name.clone();
                args.apply_to(&mut config)?;
                config.save(config_file)?;
                tracing::info!("Saved garden '{name}' to {}", config_file.display());
                write_stdout(format!("Successfully configured garden \"{name}\"\n")).await
            }
            Self::DeleteGarden { name } => {
                let _garden = config.delete_garden(&name)?;
                config.save(config_file)?;
                write_stdout(format!("Successfully deleted garden \"{name}\"\n")).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: &str) -> SetGardenArgs {
        SetGardenArgs {
            name: name.to_string(),
            alias: None,
            kubeconfig: None,
            context: None,
            patterns: Vec::new(),
        }
    }

    #[test]
    fn test_set_garden_requires_kubeconfig_for_new_garden() {
        let mut config = Config::default();
        let err = args("live").apply_to(&mut config).expect_err("missing kubeconfig");
        assert!(matches!(err, Error::MissingGardenKubeconfig { name } if name == "live"));
        assert!(config.gardens.is_empty());
    }

    #[test]
    fn test_set_garden_updates_given_fields_only() {
        let mut config = Config::default();
        SetGardenArgs {
            kubeconfig: Some(PathBuf::from("/kube/live.yaml")),
            alias: Some("prod".to_string()),
            patterns: vec!["^(?P<shoot>[^/]+)$".to_string()],
            ..args("live")
        }
        .apply_to(&mut config)
        .expect("add garden");

        SetGardenArgs { context: Some("admin".to_string()), ..args("live") }
            .apply_to(&mut config)
            .expect("update garden");

        let garden = config.find_garden("prod").expect("find garden");
        assert_eq!(garden.kubeconfig, PathBuf::from("/kube/live.yaml"));
        assert_eq!(garden.context.as_deref(), Some("admin"));
        assert_eq!(garden.patterns, ["^(?P<shoot>[^/]+)$"]);
    }

    #[tokio::test]
    async fn test_set_and_delete_garden_persist() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("gardenctl-v2.yaml");

        let cmd = ConfigCommands::SetGarden(SetGardenArgs {
            kubeconfig: Some(PathBuf::from("/kube/live.yaml")),
            ..args("live")
        });
        cmd.run(Config::load(&path).expect("load config"), &path).await.expect("set garden");
        let config = Config::load(&path).expect("load config");
        assert_eq!(config.gardens.len(), 1);

        let cmd = ConfigCommands::DeleteGarden { name: "live".to_string() };
        cmd.run(config, &path).await.expect("delete garden");
        assert!(Config::load(&path).expect("load config").gardens.is_empty());

        let cmd = ConfigCommands::DeleteGarden { name: "live".to_string() };
        let err = cmd.run(Config::load(&path).expect("load config"), &path).await;
        assert!(matches!(
            err,
            Err(Error::Configuration { source: crate::config::Error::UnknownGarden { .. } })
        ));
    }
}
