use clap::Args;

use super::{OutputFormat, write_stdout};
use crate::{
    cli::error::Error,
    ext::KubeconfigExt,
    garden::ClientProvider,
    target::Manager,
};

#[derive(Args, Clone)]
pub struct KubeconfigCommand {
    #[arg(short = 'o', long = "output", default_value = "yaml", help = "Output format")]
    output: OutputFormat,

    #[arg(long = "raw", help = "Print certificate data and tokens instead of redacting them")]
    raw: bool,

    #[arg(long = "flatten", help = "Inline files referenced by the kubeconfig")]
    flatten: bool,

    #[arg(
        long = "minify",
        help = "Remove everything not needed by the current context from the output"
    )]
    minify: bool,

    #[arg(long = "context", help = "Use the given context as the current context")]
    context: Option<String>,
}

impl KubeconfigCommand {
    pub async fn run<P: ClientProvider>(self, manager: &Manager<P>) -> Result<(), Error> {
        let Self { output, raw, flatten, minify, context } = self;

        let target = manager.current_target()?;
        let mut kubeconfig = manager.client_config(&target).await?;

        if let Some(context) = context {
            kubeconfig = kubeconfig.with_current_context(&context)?;
        }
        if minify {
            kubeconfig = kubeconfig.minify()?;
        }
        if flatten {
            kubeconfig = kubeconfig.flatten()?;
        }

        write_stdout(output.render(&kubeconfig.view(raw)?)?).await
    }
}
