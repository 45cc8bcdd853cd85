use std::path::PathBuf;

use snafu::Snafu;

/// Errors raised while loading, validating, persisting or querying the
/// gardenctl configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The configuration file exists but could not be read.
    #[snafu(display("Failed to open config from {}, error: {source}", filename.display()))]
    OpenConfig { filename: PathBuf, source: std::io::Error },

    /// The configuration file is not valid YAML or does not match the schema.
    #[snafu(display("Failed to parse config from {}, error: {source}", filename.display()))]
    ParseConfig { filename: PathBuf, source: serde_yaml::Error },

    #[snafu(display("Failed to serialize config, error: {source}"))]
    SerializeConfig { source: serde_yaml::Error },

    #[snafu(display("Failed to write config to {}, error: {source}", filename.display()))]
    WriteConfig { filename: PathBuf, source: std::io::Error },

    /// A path containing `~` or relative components could not be resolved.
    #[snafu(display("Failed to resolve file path {}, error: {source}", file_path.display()))]
    ResolveFilePath { file_path: PathBuf, source: std::io::Error },

    #[snafu(display(
        "Garden name '{name}' is invalid, it must consist of alphanumeric characters, '-' or '_'"
    ))]
    InvalidGardenName { name: String },

    /// Two gardens share a name or alias.
    #[snafu(display("Garden name or alias '{name}' is used more than once"))]
    DuplicateGarden { name: String },

    #[snafu(display("Pattern '{pattern}' of garden '{garden}' is invalid, error: {source}"))]
    InvalidPattern { garden: String, pattern: String, source: regex::Error },

    #[snafu(display(
        "Pattern '{pattern}' of garden '{garden}' uses unsupported capture group '{group}', \
         supported groups are garden, project, namespace and shoot"
    ))]
    UnsupportedCaptureGroup { garden: String, pattern: String, group: String },

    #[snafu(display("Garden '{name}' is not defined in the gardenctl configuration"))]
    UnknownGarden { name: String },

    #[snafu(display("The provided value '{value}' does not match any pattern"))]
    NoPatternMatch { value: String },

    #[snafu(display(
        "The provided value '{value}' matches patterns of more than one garden: {}",
        gardens.join(", ")
    ))]
    AmbiguousPattern { value: String, gardens: Vec<String> },
}
