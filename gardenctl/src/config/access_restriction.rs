use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::garden::Shoot;

/// A notice shown before working with shoots whose seed selector carries
/// `key`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRestriction {
    pub key: String,

    #[serde(default)]
    pub notify_if: bool,

    #[serde(default)]
    pub msg: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<AccessRestrictionOption>,
}

/// Additional notice lines, each keyed by a shoot annotation.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRestrictionOption {
    pub key: String,

    #[serde(default)]
    pub notify_if: bool,

    #[serde(default)]
    pub msg: String,
}

/// One matched restriction: its message followed by the matched options.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccessRestrictionMessage {
    pub header: String,
    pub items: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccessRestrictionMessages(pub Vec<AccessRestrictionMessage>);

impl AccessRestrictionMessages {
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl AccessRestriction {
    /// Evaluates `restrictions` in order against the seed selector labels and
    /// annotations of `shoot`.
    #[must_use]
    pub fn check_all(restrictions: &[Self], shoot: &Shoot) -> AccessRestrictionMessages {
        let empty = BTreeMap::new();
        let labels = shoot.seed_selector_labels().unwrap_or(&empty);
        let annotations = shoot.metadata.annotations.as_ref().unwrap_or(&empty);

        AccessRestrictionMessages(
            restrictions
                .iter()
                .filter_map(|restriction| restriction.check(labels, annotations))
                .collect(),
        )
    }

    fn check(
        &self,
        labels: &BTreeMap<String, String>,
        annotations: &BTreeMap<String, String>,
    ) -> Option<AccessRestrictionMessage> {
        if !matches_bool(labels, &self.key, self.notify_if) {
            return None;
        }

        let items = self
            .options
            .iter()
            .filter(|option| matches_bool(annotations, &option.key, option.notify_if))
            .map(|option| option.msg.clone())
            .collect();

        Some(AccessRestrictionMessage { header: self.msg.clone(), items })
    }
}

fn matches_bool(values: &BTreeMap<String, String>, key: &str, expected: bool) -> bool {
    values.get(key).map(String::as_str).and_then(parse_bool) == Some(expected)
}

/// Accepts the spellings Kubernetes tooling uses for boolean label values.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;
    use crate::garden::{SeedSelector, ShootSpec};

    fn eu_access() -> AccessRestriction {
        AccessRestriction {
            key: "seed.gardener.cloud/eu-access".to_string(),
            notify_if: true,
            msg: "Do not access this cluster from outside the EU".to_string(),
            options: vec![
                AccessRestrictionOption {
                    key: "support.gardener.cloud/eu-access-for-cluster-addons".to_string(),
                    notify_if: false,
                    msg: "Do not deploy addons".to_string(),
                },
                AccessRestrictionOption {
                    key: "support.gardener.cloud/eu-access-for-cluster-nodes".to_string(),
                    notify_if: false,
                    msg: "Do not touch the nodes".to_string(),
                },
            ],
        }
    }

    fn shoot(labels: &[(&str, &str)], annotations: &[(&str, &str)]) -> Shoot {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        Shoot {
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                namespace: Some("garden-team-a".to_string()),
                annotations: Some(to_map(annotations)),
                ..ObjectMeta::default()
            },
            spec: ShootSpec {
                seed_selector: Some(SeedSelector { match_labels: Some(to_map(labels)) }),
                ..ShootSpec::default()
            },
            status: None,
        }
    }

    #[test]
    fn test_check_matching_restriction_and_options() {
        let shoot = shoot(
            &[("seed.gardener.cloud/eu-access", "true")],
            &[
                ("support.gardener.cloud/eu-access-for-cluster-addons", "false"),
                ("support.gardener.cloud/eu-access-for-cluster-nodes", "true"),
            ],
        );

        let messages = AccessRestriction::check_all(&[eu_access()], &shoot);

        assert_eq!(
            messages.0,
            vec![AccessRestrictionMessage {
                header: "Do not access this cluster from outside the EU".to_string(),
                items: vec!["Do not deploy addons".to_string()],
            }]
        );
    }

    #[test]
    fn test_check_skips_unmatched_or_unparsable_labels() {
        let restrictions = [eu_access()];

        let off = shoot(&[("seed.gardener.cloud/eu-access", "false")], &[]);
        assert!(AccessRestriction::check_all(&restrictions, &off).is_empty());

        let garbage = shoot(&[("seed.gardener.cloud/eu-access", "maybe")], &[]);
        assert!(AccessRestriction::check_all(&restrictions, &garbage).is_empty());

        let missing = shoot(&[], &[]);
        assert!(AccessRestriction::check_all(&restrictions, &missing).is_empty());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("T"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }
}
