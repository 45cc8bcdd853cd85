use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Kubeconfig { source: crate::kubeconfig::Error },

    #[snafu(display("Failed to initialize Kubernetes client configuration, error: {source}"))]
    LoadClientConfig { source: kube::config::KubeconfigError },

    #[snafu(display("Failed to create Kubernetes client, error: {source}"))]
    CreateClient {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    /// Any error returned by a garden, seed or shoot API server.
    #[snafu(display("Failed to {operation}, error: {source}"))]
    Api {
        operation: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to decode {kind} '{name}', error: {source}"))]
    DecodeObject { kind: &'static str, name: String, source: serde_json::Error },

    #[snafu(display("Shoot '{name}' not found"))]
    UnknownShoot { name: String },

    #[snafu(display(
        "Shoot name '{name}' is ambiguous, it matches {}. Use --project or --seed to select one",
        candidates.join(", ")
    ))]
    AmbiguousShoot { name: String, candidates: Vec<String> },

    #[snafu(display("Project '{project}' not found or has no namespace"))]
    ProjectNamespaceNotFound { project: String },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::kubeconfig::Error> for Error {
    fn from(source: crate::kubeconfig::Error) -> Self { Self::Kubeconfig { source } }
}
