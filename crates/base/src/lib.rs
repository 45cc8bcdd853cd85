pub mod config;
pub mod consts;
pub mod utils;

pub const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CLI_PROGRAM_NAME: &str = "gardenctl";

/// Base name of the configuration file, without extension.
pub const DEFAULT_CONFIG_NAME: &str = "gardenctl-v2";

/// Directory below the user's home holding configuration and history.
pub const DEFAULT_HOME_DIR_NAME: &str = ".garden";

/// Directory below `TMPDIR` holding one sub-directory per shell session.
pub const SESSION_ROOT_DIR_NAME: &str = "garden";

pub const TARGET_FILE_NAME: &str = "target.yaml";

pub const KUBECONFIG_LINK_NAME: &str = "kubeconfig.yaml";

pub const HISTORY_FILE_NAME: &str = "history";
