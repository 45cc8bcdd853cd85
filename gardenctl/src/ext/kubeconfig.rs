use std::path::PathBuf;

use base64::{Engine, engine::general_purpose::STANDARD};
use kube::config::Kubeconfig;
use serde_json::{Map, Value};
use snafu::{OptionExt, ResultExt, ensure};

use crate::kubeconfig::{Error, error};

const DATA_OMITTED: &str = "DATA+OMITTED";
const REDACTED: &str = "REDACTED";

/// File references that `flatten` inlines, as (path key, data key).
const CLUSTER_FILE_KEYS: [(&str, &str); 1] =
    [("certificate-authority", "certificate-authority-data")];
const USER_FILE_KEYS: [(&str, &str); 2] =
    [("client-certificate", "client-certificate-data"), ("client-key", "client-key-data")];

/// Manipulations of a kubeconfig in the manner of `kubectl config view`.
pub trait KubeconfigExt: Sized {
    /// Makes `context` the current context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextNotFound`] if no context has that name.
    fn with_current_context(self, context: &str) -> Result<Self, Error>;

    /// Drops every context, cluster and user not used by the current context.
    ///
    /// # Errors
    ///
    /// Fails if there is no current context or it does not exist.
    fn minify(self) -> Result<Self, Error>;

    /// Sets `namespace` on every context.
    ///
    /// # Errors
    ///
    /// Fails if the kubeconfig cannot be converted.
    fn with_namespace(self, namespace: &str) -> Result<Self, Error>;

    /// Inlines referenced certificate and key files as `*-data` fields.
    ///
    /// Paths are used as they are, kubeconfigs loaded from a file carry
    /// absolute ones.
    ///
    /// # Errors
    ///
    /// Fails if a referenced file cannot be read.
    fn flatten(self) -> Result<Self, Error>;

    /// Renders the kubeconfig for display, omitting unset fields.
    ///
    /// Unless `raw` is set, embedded data prints as `DATA+OMITTED` and
    /// tokens and passwords print as `REDACTED`.
    ///
    /// # Errors
    ///
    /// Fails if the kubeconfig cannot be converted.
    fn view(&self, raw: bool) -> Result<Value, Error>;
}

impl KubeconfigExt for Kubeconfig {
    fn with_current_context(mut self, context: &str) -> Result<Self, Error> {
        ensure!(
            self.contexts.iter().any(|named| named.name == context),
            error::ContextNotFoundSnafu { context: context.to_string() }
        );
        self.current_context = Some(context.to_string());
        Ok(self)
    }

    fn minify(self) -> Result<Self, Error> {
        let current = self
            .current_context
            .clone()
            .filter(|name| !name.is_empty())
            .context(error::NoCurrentContextSnafu)?;
        let mut value = to_value(&self)?;

        let context = entries(&value, "contexts")
            .find(|entry| entry_name(entry) == Some(current.as_str()))
            .and_then(|entry| entry.get("context"))
            .cloned()
            .with_context(|| error::ContextNotFoundSnafu { context: current.clone() })?;
        let cluster = context.get("cluster").and_then(Value::as_str).unwrap_or_default();
        let user = context.get("user").and_then(Value::as_str).unwrap_or_default();

        retain_named(&mut value, "contexts", &current);
        retain_named(&mut value, "clusters", cluster);
        retain_named(&mut value, "users", user);
        from_value(value)
    }

    fn with_namespace(self, namespace: &str) -> Result<Self, Error> {
        let mut value = to_value(&self)?;
        for entry in entries_mut(&mut value, "contexts") {
            if let Some(context) = entry.get_mut("context").and_then(Value::as_object_mut) {
                let _unused = context.insert("namespace".to_string(), namespace.into());
            }
        }
        from_value(value)
    }

    fn flatten(self) -> Result<Self, Error> {
        let mut value = to_value(&self)?;
        for (list, field, keys) in [
            ("clusters", "cluster", CLUSTER_FILE_KEYS.as_slice()),
            ("users", "user", USER_FILE_KEYS.as_slice()),
        ] {
            for entry in entries_mut(&mut value, list) {
                if let Some(object) = entry.get_mut(field).and_then(Value::as_object_mut) {
                    inline_files(object, keys)?;
                }
            }
        }
        from_value(value)
    }

    fn view(&self, raw: bool) -> Result<Value, Error> {
        let mut value = to_value(self)?;
        prune_nulls(&mut value);
        if !raw {
            for (list, field) in [("clusters", "cluster"), ("users", "user")] {
                for entry in entries_mut(&mut value, list) {
                    if let Some(object) = entry.get_mut(field).and_then(Value::as_object_mut) {
                        redact(object);
                    }
                }
            }
        }
        Ok(value)
    }
}

/// Removes `null` object members recursively.
pub(crate) fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(object) => {
            object.retain(|_, member| !member.is_null());
            object.values_mut().for_each(prune_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(prune_nulls),
        _ => {}
    }
}

fn to_value(kubeconfig: &Kubeconfig) -> Result<Value, Error> {
    serde_json::to_value(kubeconfig).context(error::ConvertKubeconfigSnafu)
}

fn from_value(value: Value) -> Result<Kubeconfig, Error> {
    serde_json::from_value(value).context(error::ConvertKubeconfigSnafu)
}

fn entries<'a>(value: &'a Value, list: &str) -> impl Iterator<Item = &'a Value> {
    value.get(list).and_then(Value::as_array).into_iter().flatten()
}

fn entries_mut<'a>(value: &'a mut Value, list: &str) -> impl Iterator<Item = &'a mut Value> {
    value.get_mut(list).and_then(Value::as_array_mut).into_iter().flatten()
}

fn entry_name(entry: &Value) -> Option<&str> { entry.get("name").and_then(Value::as_str) }

fn retain_named(value: &mut Value, list: &str, name: &str) {
    if let Some(items) = value.get_mut(list).and_then(Value::as_array_mut) {
        items.retain(|entry| entry_name(entry) == Some(name));
    }
}

fn inline_files(object: &mut Map<String, Value>, keys: &[(&str, &str)]) -> Result<(), Error> {
    for (path_key, data_key) in keys {
        let Some(path) = object.remove(*path_key) else { continue };
        let Some(path) = path.as_str().filter(|path| !path.is_empty()) else { continue };

        let path = PathBuf::from(path);
        let data =
            std::fs::read(&path).with_context(|_| error::ReadReferencedFileSnafu { path })?;
        let _unused = object.insert((*data_key).to_string(), STANDARD.encode(data).into());
    }
    Ok(())
}

fn redact(object: &mut Map<String, Value>) {
    for (key, member) in object.iter_mut() {
        if member.is_null() {
            continue;
        }
        if key.ends_with("-data") {
            *member = DATA_OMITTED.into();
        } else if key == "token" || key == "password" {
            *member = REDACTED.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubeconfig::{
        from_yaml,
        testing::{GARDEN_KUBECONFIG, current_namespace},
    };

    fn garden_kubeconfig() -> Kubeconfig {
        from_yaml(GARDEN_KUBECONFIG.as_bytes()).expect("parse kubeconfig")
    }

    #[test]
    fn test_minify_keeps_current_context_only() {
        let kubeconfig = garden_kubeconfig().minify().expect("minify");
        assert_eq!(kubeconfig.contexts.len(), 1);
        assert_eq!(kubeconfig.contexts[0].name, "admin");
        assert_eq!(kubeconfig.clusters.len(), 1);
        assert_eq!(kubeconfig.clusters[0].name, "garden");
        assert_eq!(kubeconfig.auth_infos.len(), 1);
        assert_eq!(kubeconfig.auth_infos[0].name, "admin");
    }

    #[test]
    fn test_minify_without_current_context() {
        let mut kubeconfig = garden_kubeconfig();
        kubeconfig.current_context = None;
        assert!(matches!(kubeconfig.minify(), Err(Error::NoCurrentContext)));
    }

    #[test]
    fn test_with_namespace() {
        let kubeconfig = garden_kubeconfig().with_namespace("garden-dev").expect("namespace");
        assert_eq!(current_namespace(&kubeconfig), Some("garden-dev"));
        let kubeconfig = kubeconfig.with_current_context("viewer").expect("context");
        assert_eq!(current_namespace(&kubeconfig), Some("garden-dev"));
    }

    #[test]
    fn test_current_namespace() {
        let kubeconfig = garden_kubeconfig();
        assert_eq!(current_namespace(&kubeconfig), None);
        let kubeconfig = kubeconfig.with_current_context("viewer").expect("context");
        assert_eq!(current_namespace(&kubeconfig), Some("default"));
    }

    #[test]
    fn test_view_redacts_secrets() {
        let kubeconfig = garden_kubeconfig();
        let view = kubeconfig.view(false).expect("view");
        assert_eq!(view["clusters"][0]["cluster"]["certificate-authority-data"], DATA_OMITTED);
        assert_eq!(view["users"][0]["user"]["token"], REDACTED);
        assert_eq!(view["users"][1]["user"]["client-key-data"], DATA_OMITTED);
        assert!(view["clusters"][1]["cluster"].get("certificate-authority-data").is_none());

        let raw = kubeconfig.view(true).expect("view");
        assert_eq!(raw["users"][0]["user"]["token"], "secret-token");
        assert_eq!(raw["clusters"][0]["cluster"]["certificate-authority-data"], "Z2FyZGVuLWNh");
    }

    #[test]
    fn test_flatten_inlines_files() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("ca.crt"), b"ca").expect("write ca");
        std::fs::write(dir.path().join("client.crt"), b"cert").expect("write cert");
        let path = dir.path().join("kubeconfig.yaml");
        std::fs::write(
            &path,
            r"
current-context: local
clusters:
  - name: local
    cluster:
      server: https://127.0.0.1:6443
      certificate-authority: ca.crt
contexts:
  - name: local
    context:
      cluster: local
      user: local
users:
  - name: local
    user:
      client-certificate: client.crt
",
        )
        .expect("write kubeconfig");

        let kubeconfig = crate::kubeconfig::load_file(&path).expect("load kubeconfig");
        let view = kubeconfig.flatten().expect("flatten").view(true).expect("view");
        let cluster = &view["clusters"][0]["cluster"];
        assert_eq!(cluster["certificate-authority-data"], STANDARD.encode(b"ca"));
        assert!(cluster.get("certificate-authority").is_none());
        assert_eq!(view["users"][0]["user"]["client-certificate-data"], STANDARD.encode(b"cert"));
    }

    #[test]
    fn test_flatten_missing_file() {
        let kubeconfig = from_yaml(
            br"
clusters:
  - name: local
    cluster:
      certificate-authority: /nonexistent/ca.crt
",
        )
        .expect("parse kubeconfig");
        assert!(matches!(kubeconfig.flatten(), Err(Error::ReadReferencedFile { .. })));
    }
}
