//! Reading, writing and synthesizing kubeconfigs.

pub(crate) mod error;
mod shoot;

use std::path::Path;

use k8s_openapi::api::core::v1::Secret;
use kube::config::Kubeconfig;
use snafu::{OptionExt, ResultExt};

pub use self::{error::Error, shoot::shoot_kubeconfig};
use crate::{config::Garden, ext::KubeconfigExt};

/// Parses a kubeconfig document.
///
/// # Errors
///
/// Fails if `data` is not a valid kubeconfig.
pub fn from_yaml(data: &[u8]) -> Result<Kubeconfig, Error> {
    serde_yaml::from_slice(data).context(error::ParseKubeconfigSnafu)
}

/// Serializes a kubeconfig document without its unset fields.
///
/// # Errors
///
/// Fails if serialization fails.
pub fn to_yaml(kubeconfig: &Kubeconfig) -> Result<String, Error> {
    serde_yaml::to_string(&kubeconfig.view(true)?).context(error::SerializeKubeconfigSnafu)
}

/// Reads and parses the kubeconfig file at `path`.
///
/// Relative file references are resolved against the directory of `path`,
/// so the result stays usable after being copied elsewhere.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_file(path: &Path) -> Result<Kubeconfig, Error> {
    Kubeconfig::read_from(path)
        .with_context(|_| error::LoadKubeconfigSnafu { path: path.to_path_buf() })
}

/// Loads the kubeconfig configured for `garden`.
///
/// The configured context, if any, replaces the current context, and the
/// result is reduced to that context.
///
/// # Errors
///
/// Fails if the file cannot be loaded or the context does not exist.
pub fn load_garden_kubeconfig(garden: &Garden) -> Result<Kubeconfig, Error> {
    let path = garden.kubeconfig_path()?;
    tracing::debug!("Loading kubeconfig of garden {} from {}", garden.name, path.display());

    let kubeconfig = load_file(&path)?;
    let kubeconfig = match garden.context.as_deref() {
        Some(context) => kubeconfig.with_current_context(context)?,
        None => kubeconfig,
    };
    kubeconfig.minify()
}

/// Returns the value stored under `key` in `secret`.
///
/// # Errors
///
/// Returns [`Error::MissingSecretData`] if the key is absent or empty.
pub fn secret_data<'a>(secret: &'a Secret, key: &str) -> Result<&'a [u8], Error> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| value.0.as_slice())
        .filter(|value| !value.is_empty())
        .with_context(|| error::MissingSecretDataSnafu {
            namespace: secret.metadata.namespace.clone().unwrap_or_default(),
            name: secret.metadata.name.clone().unwrap_or_default(),
            key: key.to_string(),
        })
}
