use std::path::PathBuf;

use snafu::Snafu;

/// Errors raised while reading, transforming or synthesizing kubeconfigs.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("Failed to load kubeconfig from {}, error: {source}", path.display()))]
    LoadKubeconfig { path: PathBuf, source: kube::config::KubeconfigError },

    #[snafu(display("Failed to parse kubeconfig, error: {source}"))]
    ParseKubeconfig { source: serde_yaml::Error },

    #[snafu(display("Failed to serialize kubeconfig, error: {source}"))]
    SerializeKubeconfig { source: serde_yaml::Error },

    #[snafu(display("Failed to convert kubeconfig, error: {source}"))]
    ConvertKubeconfig { source: serde_json::Error },

    #[snafu(display("Context '{context}' does not exist in kubeconfig"))]
    ContextNotFound { context: String },

    #[snafu(display("Kubeconfig has no current context"))]
    NoCurrentContext,

    #[snafu(display("Failed to read file {} referenced by kubeconfig, error: {source}", path.display()))]
    ReadReferencedFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("Shoot {namespace}/{name} has no advertised addresses"))]
    NoAdvertisedAddress { namespace: String, name: String },

    #[snafu(display("Kubernetes version '{version}' of shoot {name} is invalid, error: {source}"))]
    InvalidKubernetesVersion { name: String, version: String, source: semver::Error },

    #[snafu(display("Secret {namespace}/{name} not found"))]
    SecretNotFound { namespace: String, name: String },

    #[snafu(display("Secret {namespace}/{name} has no data key '{key}'"))]
    MissingSecretData { namespace: String, name: String, key: String },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}
