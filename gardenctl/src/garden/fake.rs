//! In-memory garden used by tests.
//!
//! Like many API fakes it ignores field selectors, so callers only get
//! correct results if they filter list responses themselves.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use gardenctl_base::consts::gardener;
use k8s_openapi::{
    ByteString,
    api::core::v1::{Namespace, Secret},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::config::Kubeconfig;

use super::{
    AdvertisedAddress, ClientProvider, Error, GardenClient, KubernetesSettings, ListFilter,
    Project, ProjectSpec, Seed, SeedSelector, Shoot, ShootReference, ShootSpec, ShootStatus,
};
use crate::config::Garden;

#[derive(Clone, Debug, Default)]
pub struct FakeGardenClient {
    name: String,
    projects: Vec<Project>,
    namespaces: Vec<Namespace>,
    seeds: Vec<Seed>,
    shoots: Vec<Shoot>,
    secrets: Vec<Secret>,
    managed_seeds: BTreeMap<String, String>,
    calls: Arc<AtomicUsize>,
}

fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..ObjectMeta::default()
    }
}

impl FakeGardenClient {
    pub fn new(name: &str) -> Self { Self { name: name.to_string(), ..Self::default() } }

    /// Adds a project together with its namespace.
    #[must_use]
    pub fn with_project(mut self, name: &str, namespace: &str) -> Self {
        self.projects.push(Project {
            metadata: meta(None, name),
            spec: ProjectSpec { namespace: Some(namespace.to_string()) },
        });
        self.with_namespace(namespace, Some(name))
    }

    /// Adds a project that has no namespace yet.
    #[must_use]
    pub fn with_pending_project(mut self, name: &str) -> Self {
        self.projects.push(Project { metadata: meta(None, name), spec: ProjectSpec::default() });
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, name: &str, project: Option<&str>) -> Self {
        let mut metadata = meta(None, name);
        metadata.labels = project.map(|project| {
            BTreeMap::from([(gardener::labels::PROJECT_NAME.to_string(), project.to_string())])
        });
        self.namespaces.push(Namespace { metadata, ..Namespace::default() });
        self
    }

    #[must_use]
    pub fn with_seed(mut self, name: &str) -> Self {
        self.seeds.push(Seed { metadata: meta(None, name), ..Seed::default() });
        self
    }

    /// Adds a shoot running Kubernetes `version` with one advertised
    /// address and the CA secret gardenlogin kubeconfigs need.
    #[must_use]
    pub fn with_shoot(mut self, namespace: &str, name: &str, seed: &str, version: &str) -> Self {
        let project = namespace.strip_prefix("garden-").unwrap_or(namespace);
        self.shoots.push(Shoot {
            metadata: meta(Some(namespace), name),
            spec: ShootSpec {
                seed_name: Some(seed.to_string()),
                kubernetes: KubernetesSettings { version: version.to_string() },
                ..ShootSpec::default()
            },
            status: Some(ShootStatus {
                advertised_addresses: vec![AdvertisedAddress {
                    name: "external".to_string(),
                    url: format!("https://api.{name}.{project}.example.com"),
                }],
                technical_id: format!("shoot--{project}--{name}"),
            }),
        });
        let ca_secret = format!("{name}{}", gardener::SHOOT_CA_SECRET_SUFFIX);
        self.with_secret(namespace, &ca_secret, gardener::SECRET_KEY_CA_CERT, b"shoot-ca")
    }

    /// Sets seed selector labels and annotations of an existing shoot.
    #[must_use]
    pub fn with_shoot_restrictions(
        mut self,
        namespace: &str,
        name: &str,
        labels: &[(&str, &str)],
        annotations: &[(&str, &str)],
    ) -> Self {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        if let Some(shoot) = self
            .shoots
            .iter_mut()
            .find(|shoot| shoot.namespace() == namespace && shoot.name() == name)
        {
            shoot.spec.seed_selector = Some(SeedSelector { match_labels: Some(to_map(labels)) });
            shoot.metadata.annotations = Some(to_map(annotations));
        }
        self
    }

    #[must_use]
    pub fn with_secret(mut self, namespace: &str, name: &str, key: &str, value: &[u8]) -> Self {
        self.secrets.push(Secret {
            metadata: meta(Some(namespace), name),
            data: Some(BTreeMap::from([(key.to_string(), ByteString(value.to_vec()))])),
            ..Secret::default()
        });
        self
    }

    #[must_use]
    pub fn with_managed_seed(mut self, seed: &str, shoot: &str) -> Self {
        let _unused = self.managed_seeds.insert(seed.to_string(), shoot.to_string());
        self
    }

    /// Number of API calls served so far.
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    fn record(&self) { let _unused = self.calls.fetch_add(1, Ordering::SeqCst); }
}

impl GardenClient for FakeGardenClient {
    fn name(&self) -> &str { &self.name }

    async fn get_project(&self, name: &str) -> Result<Option<Project>, Error> {
        self.record();
        Ok(self.projects.iter().find(|project| project.name() == name).cloned())
    }

    async fn get_project_by_namespace(&self, namespace: &str) -> Result<Option<Project>, Error> {
        self.record();
        Ok(self.projects.iter().find(|project| project.namespace() == Some(namespace)).cloned())
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, Error> {
        self.record();
        Ok(self
            .namespaces
            .iter()
            .find(|namespace| namespace.metadata.name.as_deref() == Some(name))
            .cloned())
    }

    async fn get_seed(&self, name: &str) -> Result<Option<Seed>, Error> {
        self.record();
        Ok(self.seeds.iter().find(|seed| seed.name() == name).cloned())
    }

    async fn get_shoot(&self, namespace: &str, name: &str) -> Result<Option<Shoot>, Error> {
        self.record();
        Ok(self
            .shoots
            .iter()
            .find(|shoot| shoot.namespace() == namespace && shoot.name() == name)
            .cloned())
    }

    async fn get_shoot_of_managed_seed(
        &self,
        seed_name: &str,
    ) -> Result<Option<ShootReference>, Error> {
        self.record();
        Ok(self.managed_seeds.get(seed_name).map(|name| ShootReference { name: name.clone() }))
    }

    async fn list_shoots(
        &self,
        namespace: Option<&str>,
        _filter: &ListFilter,
    ) -> Result<Vec<Shoot>, Error> {
        self.record();
        Ok(self
            .shoots
            .iter()
            .filter(|shoot| namespace.is_none_or(|namespace| shoot.namespace() == namespace))
            .cloned()
            .collect())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, Error> {
        self.record();
        Ok(self
            .secrets
            .iter()
            .find(|secret| {
                secret.metadata.namespace.as_deref() == Some(namespace)
                    && secret.metadata.name.as_deref() == Some(name)
            })
            .cloned())
    }
}

/// Hands out [`FakeGardenClient`]s by garden name.
#[derive(Clone, Debug, Default)]
pub struct FakeClientProvider {
    gardens: HashMap<String, FakeGardenClient>,
}

impl FakeClientProvider {
    #[must_use]
    pub fn with_garden(mut self, client: FakeGardenClient) -> Self {
        let _unused = self.gardens.insert(client.name.clone(), client);
        self
    }

    pub fn garden(&self, name: &str) -> Option<&FakeGardenClient> { self.gardens.get(name) }
}

impl ClientProvider for FakeClientProvider {
    type GardenClient = FakeGardenClient;

    async fn garden_client(&self, garden: &Garden) -> Result<Self::GardenClient, Error> {
        Ok(self
            .gardens
            .get(&garden.name)
            .cloned()
            .unwrap_or_else(|| FakeGardenClient::new(&garden.name)))
    }

    async fn client(&self, kubeconfig: &Kubeconfig) -> Result<kube::Client, Error> {
        super::KubeClientProvider.client(kubeconfig).await
    }
}
