use base64::{Engine, engine::general_purpose::STANDARD};
use gardenctl_base::consts::gardenlogin;
use kube::config::Kubeconfig;
use serde_json::{Value, json};
use snafu::{ResultExt, ensure};

use super::{Error, error};
use crate::garden::Shoot;

/// Builds a kubeconfig for `shoot` whose users authenticate through the
/// `gardenlogin` credential plugin.
///
/// One cluster and context is emitted per advertised address; the first
/// address becomes the current context. Shoots running Kubernetes below
/// 1.20 cannot pass cluster info to exec plugins, so the shoot reference is
/// handed over as plugin flags instead of a cluster extension.
///
/// # Errors
///
/// Fails if the shoot has no advertised address or its Kubernetes version
/// cannot be parsed.
pub fn shoot_kubeconfig(
    garden_identity: &str,
    shoot: &Shoot,
    ca_cert: &[u8],
) -> Result<Kubeconfig, Error> {
    let (namespace, name) = (shoot.namespace(), shoot.name());
    let addresses = shoot.advertised_addresses();
    ensure!(
        !addresses.is_empty(),
        error::NoAdvertisedAddressSnafu { namespace: namespace.to_string(), name: name.to_string() }
    );
    let legacy = is_legacy_version(shoot.kubernetes_version()).with_context(|_| {
        error::InvalidKubernetesVersionSnafu {
            name: name.to_string(),
            version: shoot.kubernetes_version().to_string(),
        }
    })?;

    let auth_name = format!("{namespace}--{name}");
    let ca_data = STANDARD.encode(ca_cert);

    let mut args: Vec<String> = gardenlogin::EXEC_ARGS.iter().map(ToString::to_string).collect();
    if legacy {
        args.extend([
            format!("--name={name}"),
            format!("--namespace={namespace}"),
            format!("--garden-cluster-identity={garden_identity}"),
        ]);
    }

    let mut clusters = Vec::with_capacity(addresses.len());
    let mut contexts = Vec::with_capacity(addresses.len());
    for address in addresses {
        let context_name = format!("{auth_name}-{}", address.name);
        let mut cluster = json!({
            "server": address.url,
            "certificate-authority-data": ca_data,
        });
        if !legacy {
            cluster["extensions"] = json!([{
                "name": gardenlogin::EXEC_EXTENSION_NAME,
                "extension": {
                    "shootRef": { "namespace": namespace, "name": name },
                    "gardenClusterIdentity": garden_identity,
                },
            }]);
        }
        clusters.push(json!({ "name": context_name, "cluster": cluster }));
        contexts.push(json!({
            "name": context_name,
            "context": { "cluster": context_name, "user": auth_name, "namespace": "default" },
        }));
    }

    let current_context = format!("{auth_name}-{}", addresses[0].name);
    let kubeconfig: Value = json!({
        "apiVersion": "v1",
        "kind": "Config",
        "current-context": current_context,
        "clusters": clusters,
        "contexts": contexts,
        "users": [{
            "name": auth_name,
            "user": {
                "exec": {
                    "apiVersion": gardenlogin::EXEC_API_VERSION,
                    "command": gardenlogin::EXEC_COMMAND,
                    "args": args,
                    "provideClusterInfo": !legacy,
                    "interactiveMode": "IfAvailable",
                },
            },
        }],
    });
    serde_json::from_value(kubeconfig).context(error::ConvertKubeconfigSnafu)
}

/// Accepts `1.19`, `v1.19.3` and the like.
fn is_legacy_version(version: &str) -> Result<bool, semver::Error> {
    let version = version.trim().trim_start_matches('v');
    let core = version.split(['-', '+']).next().unwrap_or_default();
    let version = match core.matches('.').count() {
        0 => format!("{core}.0.0{}", &version[core.len()..]),
        1 => format!("{core}.0{}", &version[core.len()..]),
        _ => version.to_string(),
    };
    let version = semver::Version::parse(&version)?;
    let (major, minor, _) = gardenlogin::LEGACY_MAX_VERSION;
    Ok((version.major, version.minor) < (major, minor))
}
