use std::path::Path;

use clap::{Args, ValueEnum};
use gardenctl_base::CLI_PROGRAM_NAME;

use super::write_stdout;
use crate::{cli::error::Error, garden::ClientProvider, target::Manager};

const KUBECONFIG: &str = "KUBECONFIG";

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Args, Clone)]
pub struct KubectlEnvCommand {
    #[arg(help = "Shell to generate the script for")]
    shell: Shell,

    #[arg(short = 'u', long = "unset", help = "Generate a script that unsets KUBECONFIG")]
    unset: bool,
}

impl KubectlEnvCommand {
    pub async fn run<P: ClientProvider>(self, manager: &Manager<P>) -> Result<(), Error> {
        let script = if self.unset {
            unset_script(self.shell)
        } else {
            let target = manager.current_target()?;
            let path = manager.write_client_config(&target).await?;
            export_script(self.shell, &path)
        };
        write_stdout(script).await
    }
}

fn export_script(shell: Shell, path: &Path) -> String {
    let path = path.to_string_lossy();
    let statement = match shell {
        Shell::Bash | Shell::Zsh => {
            format!("export {KUBECONFIG}={};", shell_escape::unix::escape(path))
        }
        Shell::Fish => format!("set -gx {KUBECONFIG} {};", shell_escape::unix::escape(path)),
        Shell::Powershell => format!("$Env:{KUBECONFIG} = {};", powershell_quote(&path)),
    };
    format!("{statement}\n{}", usage_hint(shell, false))
}

fn unset_script(shell: Shell) -> String {
    let statement = match shell {
        Shell::Bash | Shell::Zsh => format!("unset {KUBECONFIG};"),
        Shell::Fish => format!("set -e {KUBECONFIG};"),
        Shell::Powershell => {
            format!("Remove-Item -ErrorAction SilentlyContinue Env:\\{KUBECONFIG};")
        }
    };
    format!("{statement}\n{}", usage_hint(shell, true))
}

fn usage_hint(shell: Shell, unset: bool) -> String {
    let name = match shell {
        Shell::Bash => "bash",
        Shell::Zsh => "zsh",
        Shell::Fish => "fish",
        Shell::Powershell => "powershell",
    };
    let flag = if unset { " -u" } else { "" };
    let command = format!("{CLI_PROGRAM_NAME} kubectl-env {name}{flag}");
    let run = match shell {
        Shell::Bash | Shell::Zsh => format!("eval $({command})"),
        Shell::Fish => format!("eval ({command})"),
        Shell::Powershell => format!("& {command} | Invoke-Expression"),
    };
    format!("# Run this command to configure kubectl for your shell:\n# {run}\n")
}

/// Single-quotes `value` for powershell, where `'` is escaped by doubling.
fn powershell_quote(value: &str) -> String { format!("'{}'", value.replace('\'', "''")) }
