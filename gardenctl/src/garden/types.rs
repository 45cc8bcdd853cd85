//! Narrow views of the Gardener resources gardenctl reads.
//!
//! Only the fields needed for targeting and kubeconfig assembly are
//! modelled; everything else in the server's response is ignored.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ProjectSpec,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Project {
    #[must_use]
    pub fn name(&self) -> &str { self.metadata.name.as_deref().unwrap_or_default() }

    /// Returns the project namespace, treating an empty value as unset.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.spec.namespace.as_deref().filter(|namespace| !namespace.is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: SeedSpec,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretReference>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub name: String,
}

impl Seed {
    #[must_use]
    pub fn name(&self) -> &str { self.metadata.name.as_deref().unwrap_or_default() }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shoot {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ShootSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ShootStatus>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_name: Option<String>,

    #[serde(default)]
    pub kubernetes: KubernetesSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_selector: Option<SeedSelector>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesSettings {
    #[serde(default)]
    pub version: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advertised_addresses: Vec<AdvertisedAddress>,

    #[serde(rename = "technicalID", default, skip_serializing_if = "String::is_empty")]
    pub technical_id: String,
}

/// An API server endpoint of a shoot, such as `external` or `internal`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AdvertisedAddress {
    pub name: String,
    pub url: String,
}

impl Shoot {
    #[must_use]
    pub fn name(&self) -> &str { self.metadata.name.as_deref().unwrap_or_default() }

    #[must_use]
    pub fn namespace(&self) -> &str { self.metadata.namespace.as_deref().unwrap_or_default() }

    /// Returns the seed the shoot is scheduled on, if any.
    #[must_use]
    pub fn seed_name(&self) -> Option<&str> {
        self.spec.seed_name.as_deref().filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn kubernetes_version(&self) -> &str { &self.spec.kubernetes.version }

    #[must_use]
    pub fn technical_id(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.technical_id.as_str()).filter(|id| !id.is_empty())
    }

    #[must_use]
    pub fn advertised_addresses(&self) -> &[AdvertisedAddress] {
        self.status
            .as_ref()
            .map(|status| status.advertised_addresses.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn seed_selector_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.spec.seed_selector.as_ref().and_then(|selector| selector.match_labels.as_ref())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedSeed {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ManagedSeedSpec,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedSeedSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoot: Option<ShootReference>,
}

/// The shoot backing a managed seed. It lives in the `garden` project.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShootReference {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_shoot() {
        let shoot: Shoot = serde_json::from_value(serde_json::json!({
            "apiVersion": "core.gardener.cloud/v1beta1",
            "kind": "Shoot",
            "metadata": { "name": "web", "namespace": "garden-team-a" },
            "spec": {
                "seedName": "mgmt-seed",
                "kubernetes": { "version": "1.30.2" },
                "provider": { "type": "gcp" }
            },
            "status": {
                "technicalID": "shoot--team-a--web",
                "advertisedAddresses": [
                    { "name": "external", "url": "https://api.web.team-a.example.com" }
                ]
            }
        }))
        .expect("decode shoot");

        assert_eq!(shoot.name(), "web");
        assert_eq!(shoot.namespace(), "garden-team-a");
        assert_eq!(shoot.seed_name(), Some("mgmt-seed"));
        assert_eq!(shoot.kubernetes_version(), "1.30.2");
        assert_eq!(shoot.technical_id(), Some("shoot--team-a--web"));
        assert_eq!(shoot.advertised_addresses()[0].name, "external");
    }

    #[test]
    fn test_unscheduled_shoot() {
        let shoot: Shoot = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "web" },
            "spec": { "seedName": "" }
        }))
        .expect("decode shoot");

        assert_eq!(shoot.seed_name(), None);
        assert_eq!(shoot.technical_id(), None);
        assert!(shoot.advertised_addresses().is_empty());
    }

    #[test]
    fn test_project_without_namespace() {
        let project: Project =
            serde_json::from_value(serde_json::json!({ "metadata": { "name": "team-a" } }))
                .expect("decode project");
        assert_eq!(project.name(), "team-a");
        assert_eq!(project.namespace(), None);
    }
}
