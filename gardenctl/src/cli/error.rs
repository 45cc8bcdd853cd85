use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Target { source: crate::target::Error },

    #[snafu(display("{source}"))]
    Kubeconfig { source: crate::kubeconfig::Error },

    #[snafu(display("{source}"))]
    Session { source: crate::session::Error },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Failed to write to stderr, error: {source}"))]
    WriteStderr { source: std::io::Error },

    #[snafu(display("Failed to serialize output as YAML, error: {source}"))]
    SerializeYaml { source: serde_yaml::Error },

    #[snafu(display("Failed to serialize output as JSON, error: {source}"))]
    SerializeJson { source: serde_json::Error },

    #[snafu(display("Failed to get the Kubernetes version of the targeted cluster, error: {source}"))]
    GetServerVersion {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },

    #[snafu(display("Interrupted"))]
    Interrupted,

    #[snafu(display(
        "Nothing to target, pass a name, a value matching a configured pattern or target flags"
    ))]
    NothingToTarget,

    #[snafu(display("Garden '{name}' is new, --kubeconfig is required"))]
    MissingGardenKubeconfig { name: String },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::target::Error> for Error {
    fn from(source: crate::target::Error) -> Self { Self::Target { source } }
}

impl From<crate::kubeconfig::Error> for Error {
    fn from(source: crate::kubeconfig::Error) -> Self { Self::Kubeconfig { source } }
}

impl From<crate::session::Error> for Error {
    fn from(source: crate::session::Error) -> Self { Self::Session { source } }
}
