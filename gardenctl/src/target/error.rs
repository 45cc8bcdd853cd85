use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Garden { source: crate::garden::Error },

    #[snafu(display("{source}"))]
    Kubeconfig { source: crate::kubeconfig::Error },

    #[snafu(display("No garden targeted"))]
    NoGardenTargeted,

    #[snafu(display("No project targeted"))]
    NoProjectTargeted,

    #[snafu(display("No seed targeted"))]
    NoSeedTargeted,

    #[snafu(display("No shoot targeted"))]
    NoShootTargeted,

    #[snafu(display("No control plane targeted"))]
    NoControlPlaneTargeted,

    #[snafu(display("No target set"))]
    NoTargetSet,

    #[snafu(display("Project '{name}' does not exist in garden '{garden}'"))]
    UnknownProject { garden: String, name: String },

    #[snafu(display("Project '{name}' has no namespace yet, it is not ready"))]
    ProjectNotReady { name: String },

    #[snafu(display("Namespace '{name}' does not exist in garden '{garden}'"))]
    UnknownNamespace { garden: String, name: String },

    #[snafu(display("Namespace '{name}' is not a project namespace"))]
    NamespaceNotAProject { name: String },

    #[snafu(display("Seed '{name}' does not exist in garden '{garden}'"))]
    UnknownSeed { garden: String, name: String },

    #[snafu(display("Flags --project and --seed are mutually exclusive"))]
    ConflictingFlags,

    /// A target violates a structural invariant.
    #[snafu(display("Invalid target, {reason}"))]
    InvalidTarget { reason: String },

    #[snafu(display(
        "Pattern captured project '{project}' but namespace '{namespace}' belongs to project \
         '{namespace_project}'"
    ))]
    ConflictingPattern { project: String, namespace: String, namespace_project: String },

    #[snafu(display("Seed '{name}' is not a managed seed, its control plane cannot be targeted"))]
    SeedNotManaged { name: String },

    #[snafu(display("Shoot '{name}' is not scheduled on a seed yet"))]
    ShootNotScheduled { name: String },

    #[snafu(display("Shoot '{name}' has no technical ID yet"))]
    MissingTechnicalId { name: String },

    #[snafu(display("Target file {} is corrupt, {message}", path.display()))]
    CorruptTargetState { path: PathBuf, message: String },

    #[snafu(display("Failed to read target from {}, error: {source}", path.display()))]
    ReadTargetFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to write target to {}, error: {source}", path.display()))]
    WriteTargetFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to serialize target, error: {source}"))]
    SerializeTarget { source: serde_yaml::Error },

    #[snafu(display("Failed to read cached kubeconfig from {}, error: {source}", path.display()))]
    ReadKubeconfigCache { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to write cached kubeconfig to {}, error: {source}", path.display()))]
    WriteKubeconfigCache { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to link kubeconfig {}, error: {source}", path.display()))]
    LinkKubeconfig { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to write target history to {}, error: {source}", path.display()))]
    WriteHistory { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to read target history from {}, error: {source}", path.display()))]
    ReadHistory { path: PathBuf, source: std::io::Error },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::garden::Error> for Error {
    fn from(source: crate::garden::Error) -> Self { Self::Garden { source } }
}

impl From<crate::kubeconfig::Error> for Error {
    fn from(source: crate::kubeconfig::Error) -> Self { Self::Kubeconfig { source } }
}
