pub mod env {
    //! Environment variables read by gardenctl.

    pub const SESSION_ID: &str = "GCTL_SESSION_ID";
    pub const TERM_SESSION_ID: &str = "TERM_SESSION_ID";
    pub const HOME: &str = "GCTL_HOME";
    pub const CONFIG_NAME: &str = "GCTL_CONFIG_NAME";
    pub const CONFIG_FILE: &str = "GCTL_CONFIG_FILE";
    pub const LINK_KUBECONFIG: &str = "GCTL_LINK_KUBECONFIG";
    pub const LOG_LEVEL: &str = "GCTL_LOG_LEVEL";
}

pub mod gardener {
    //! Well-known names of the Gardener API.

    pub mod labels {
        /// Label on a namespace naming the project that owns it.
        pub const PROJECT_NAME: &str = "project.gardener.cloud/name";
    }

    /// Namespace of the garden cluster holding seed secrets and managed seeds.
    pub const GARDEN_NAMESPACE: &str = "garden";

    /// Project hosting the shoots that back managed seeds.
    pub const GARDEN_PROJECT: &str = "garden";

    pub const CORE_GROUP: &str = "core.gardener.cloud";
    pub const CORE_VERSION: &str = "v1beta1";
    pub const SEED_MANAGEMENT_GROUP: &str = "seedmanagement.gardener.cloud";
    pub const SEED_MANAGEMENT_VERSION: &str = "v1alpha1";

    pub const SECRET_KEY_KUBECONFIG: &str = "kubeconfig";
    pub const SECRET_KEY_CA_CERT: &str = "ca.crt";

    pub const SEED_SECRET_OIDC_SUFFIX: &str = ".oidc";
    pub const SEED_SECRET_LOGIN_SUFFIX: &str = ".login";
    pub const SHOOT_CA_SECRET_SUFFIX: &str = ".ca-cluster";
}

pub mod gardenlogin {
    //! Settings of the `gardenlogin` kubectl credential plugin.

    pub const EXEC_COMMAND: &str = "kubectl";
    pub const EXEC_ARGS: [&str; 2] = ["gardenlogin", "get-client-certificate"];
    pub const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";
    pub const EXEC_EXTENSION_NAME: &str = "client.authentication.k8s.io/exec";

    /// Shoots below this Kubernetes version get the flag-based plugin config.
    pub const LEGACY_MAX_VERSION: (u64, u64, u64) = (1, 20, 0);
}
