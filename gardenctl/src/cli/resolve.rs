use clap::Args;

use super::{OutputFormat, write_stdout};
use crate::{
    cli::error::Error,
    garden::ClientProvider,
    target::{Manager, ResolveKind},
};

#[derive(Args, Clone)]
pub struct ResolveCommand {
    #[arg(help = "Level of the current target to resolve")]
    kind: ResolveKind,

    #[arg(short = 'o', long = "output", default_value = "yaml", help = "Output format")]
    output: OutputFormat,
}

impl ResolveCommand {
    pub async fn run<P: ClientProvider>(self, manager: &Manager<P>) -> Result<(), Error> {
        let resolved = manager.resolve(self.kind).await?;
        write_stdout(self.output.render(&resolved)?).await
    }
}
