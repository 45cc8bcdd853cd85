use std::sync::LazyLock;

use gardenctl_base::consts::gardener;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::{
    Api,
    api::ListParams,
    core::{ApiResource, DynamicObject, GroupVersionKind},
};
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use super::{
    Error, GardenClient, ListFilter, ManagedSeed, Project, Seed, Shoot,
    ShootReference, error,
};

static PROJECTS: LazyLock<ApiResource> =
    LazyLock::new(|| core_resource("Project", "projects"));

static SEEDS: LazyLock<ApiResource> = LazyLock::new(|| core_resource("Seed", "seeds"));

static SHOOTS: LazyLock<ApiResource> = LazyLock::new(|| core_resource("Shoot", "shoots"));

static MANAGED_SEEDS: LazyLock<ApiResource> = LazyLock::new(|| {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(
            gardener::SEED_MANAGEMENT_GROUP,
            gardener::SEED_MANAGEMENT_VERSION,
            "ManagedSeed",
        ),
        "managedseeds",
    )
});

fn core_resource(kind: &str, plural: &str) -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(gardener::CORE_GROUP, gardener::CORE_VERSION, kind),
        plural,
    )
}

/// Decodes a dynamic object into one of the narrow Gardener record types.
fn decode<T: DeserializeOwned>(kind: &'static str, object: &DynamicObject) -> Result<T, Error> {
    serde_json::to_value(object).and_then(serde_json::from_value).with_context(|_| {
        error::DecodeObjectSnafu { kind, name: object.metadata.name.clone().unwrap_or_default() }
    })
}

fn decode_all<T: DeserializeOwned>(
    kind: &'static str,
    objects: &[DynamicObject],
) -> Result<Vec<T>, Error> {
    objects.iter().map(|object| decode(kind, object)).collect()
}

/// [`GardenClient`] talking to a garden cluster's API server.
#[derive(Clone)]
pub struct KubeGardenClient {
    name: String,
    client: kube::Client,
}

impl KubeGardenClient {
    #[must_use]
    pub const fn new(name: String, client: kube::Client) -> Self { Self { name, client } }

    fn cluster_api(&self, resource: &ApiResource) -> Api<DynamicObject> {
        Api::all_with(self.client.clone(), resource)
    }

    fn namespaced_api(&self, namespace: &str, resource: &ApiResource) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, resource)
    }
}

impl GardenClient for KubeGardenClient {
    fn name(&self) -> &str { &self.name }

    async fn get_project(&self, name: &str) -> Result<Option<Project>, Error> {
        tracing::debug!("Getting project {name} from garden {}", self.name);
        self.cluster_api(&PROJECTS)
            .get_opt(name)
            .await
            .with_context(|_| error::ApiSnafu { operation: format!("get project {name}") })?
            .map(|object| decode("project", &object))
            .transpose()
    }

    async fn get_project_by_namespace(&self, namespace: &str) -> Result<Option<Project>, Error> {
        let params = ListParams::default().fields(&format!("spec.namespace={namespace}"));
        let projects = self.cluster_api(&PROJECTS).list(&params).await.with_context(|_| {
            error::ApiSnafu { operation: format!("list projects with namespace {namespace}") }
        })?;
        Ok(decode_all::<Project>("project", &projects.items)?
            .into_iter()
            .find(|project| project.namespace() == Some(namespace)))
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, Error> {
        Api::<Namespace>::all(self.client.clone())
            .get_opt(name)
            .await
            .with_context(|_| error::ApiSnafu { operation: format!("get namespace {name}") })
    }

    async fn get_seed(&self, name: &str) -> Result<Option<Seed>, Error> {
        tracing::debug!("Getting seed {name} from garden {}", self.name);
        self.cluster_api(&SEEDS)
            .get_opt(name)
            .await
            .with_context(|_| error::ApiSnafu { operation: format!("get seed {name}") })?
            .map(|object| decode("seed", &object))
            .transpose()
    }

    async fn get_shoot(&self, namespace: &str, name: &str) -> Result<Option<Shoot>, Error> {
        tracing::debug!("Getting shoot {namespace}/{name} from garden {}", self.name);
        self.namespaced_api(namespace, &SHOOTS)
            .get_opt(name)
            .await
            .with_context(|_| error::ApiSnafu {
                operation: format!("get shoot {name} in namespace {namespace}"),
            })?
            .map(|object| decode("shoot", &object))
            .transpose()
    }

    async fn get_shoot_of_managed_seed(
        &self,
        seed_name: &str,
    ) -> Result<Option<ShootReference>, Error> {
        let managed_seed = self
            .namespaced_api(gardener::GARDEN_NAMESPACE, &MANAGED_SEEDS)
            .get_opt(seed_name)
            .await
            .with_context(|_| error::ApiSnafu {
                operation: format!("get managed seed {seed_name}"),
            })?
            .map(|object| decode::<ManagedSeed>("managed seed", &object))
            .transpose()?;
        Ok(managed_seed.and_then(|managed_seed| managed_seed.spec.shoot))
    }

    async fn list_shoots(
        &self,
        namespace: Option<&str>,
        filter: &ListFilter,
    ) -> Result<Vec<Shoot>, Error> {
        let params = filter
            .field_selector()
            .map_or_else(ListParams::default, |selector| ListParams::default().fields(&selector));
        let api = match namespace {
            Some(namespace) => self.namespaced_api(namespace, &SHOOTS),
            None => self.cluster_api(&SHOOTS),
        };

        tracing::debug!("Listing shoots of garden {} in {namespace:?} with {filter:?}", self.name);
        let shoots = api.list(&params).await.context(error::ApiSnafu { operation: "list shoots" })?;
        decode_all("shoot", &shoots.items)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, Error> {
        Api::<Secret>::namespaced(self.client.clone(), namespace).get_opt(name).await.with_context(
            |_| error::ApiSnafu { operation: format!("get secret {name} in namespace {namespace}") },
        )
    }
}
