use std::fmt::Display;

use gateway_api::apis::standard::{gateways, httproutes::HTTPRoute};
use k8s_openapi::api::core::v1::Secret;
use kube::{Resource, ResourceExt};

use super::create_id;

pub const DEFAULT_GROUP_NAME: &str = "gateway.networking.k8s.io";
pub const DEFAULT_NAMESPACE_NAME: &str = "default";
pub const DEFAULT_KIND_NAME: &str = "Gateway";
pub const LISTENER_SET_KIND_NAME: &str = "XListenerSet";
pub const SECRET_KIND_NAME: &str = "Secret";
pub const HTTP_ROUTE_KIND_NAME: &str = "HTTPRoute";
pub const DEFAULT_ROUTE_HOSTNAME: &str = "*";

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceKey {
    pub group: String,
    pub namespace: String,
    pub name: String,
    pub kind: String,
}

impl ResourceKey {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_owned(), ..Default::default() }
    }

    pub fn namespaced(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, group: &str, kind: &str) -> Self {
        group.clone_into(&mut self.group);
        kind.clone_into(&mut self.kind);
        self
    }

    pub fn is_gateway(&self) -> bool {
        self.kind == DEFAULT_KIND_NAME
    }
}

impl Default for ResourceKey {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP_NAME.to_owned(),
            namespace: DEFAULT_NAMESPACE_NAME.to_owned(),
            name: String::default(),
            kind: DEFAULT_KIND_NAME.to_owned(),
        }
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", create_id(&self.name, &self.namespace))
    }
}

impl ResourceKey {
    /// Key of a Kubernetes object; a missing namespace falls back to `default`.
    fn of<K: Resource>(object: &K, group: &str, kind: &str) -> Self {
        Self {
            group: group.to_owned(),
            namespace: object.meta().namespace.clone().unwrap_or(DEFAULT_NAMESPACE_NAME.to_owned()),
            name: object.name_any(),
            kind: kind.to_owned(),
        }
    }
}

impl From<&gateways::Gateway> for ResourceKey {
    fn from(value: &gateways::Gateway) -> Self {
        Self::of(value, DEFAULT_GROUP_NAME, DEFAULT_KIND_NAME)
    }
}

impl From<&HTTPRoute> for ResourceKey {
    fn from(value: &HTTPRoute) -> Self {
        Self::of(value, DEFAULT_GROUP_NAME, HTTP_ROUTE_KIND_NAME)
    }
}

impl From<&Secret> for ResourceKey {
    fn from(value: &Secret) -> Self {
        Self::of(value, "", SECRET_KIND_NAME)
    }
}
