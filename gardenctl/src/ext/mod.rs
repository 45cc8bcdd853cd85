//! Extensions to `kube` types.

mod kubeconfig;

pub use self::kubeconfig::KubeconfigExt;
