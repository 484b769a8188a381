mod backend;
mod gateway;
mod hostname;
mod listener;
mod policy;
mod resource_key;
mod route;
#[cfg(test)]
mod test;

use std::fmt::Display;

pub use backend::{BackendError, BackendObject, BackendRefIr, SERVICE_KIND_NAME};
pub use gateway::{Gateway, GatewayError};
pub use gateway_api::apis::standard::gateways::Gateway as KubeGateway;
pub use hostname::{effective_hostnames, is_host_contained, HostnameMatchFilter};
pub use listener::{CertificateRef, Listener, ListenerError, ListenerRef, ListenerTlsConfig, ProtocolType, TlsMode};
pub use policy::{AttachedPolicies, PolicyRef};
pub use resource_key::{
    ResourceKey, DEFAULT_GROUP_NAME, DEFAULT_KIND_NAME, DEFAULT_NAMESPACE_NAME, DEFAULT_ROUTE_HOSTNAME, LISTENER_SET_KIND_NAME, SECRET_KIND_NAME,
};
pub use route::{
    resolve_backend_ref, BackendReference, BackendResolver, HttpRouteIr, HttpRouteMatchIr, HttpRouteRuleIr, L4RouteIr, L4RouteRuleIr, PathMatch,
    RouteInfo, RouteObject, ValueMatch,
};
use serde::Serialize;

/// Gateway-API parent reference, used both for route parent refs and for
/// the policy ancestor a listener reports status under.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

impl ParentReference {
    pub fn gateway(name: &str, namespace: &str) -> Self {
        Self::from(&ResourceKey::namespaced(name, namespace))
    }

    pub fn with_section(mut self, section_name: &str) -> Self {
        self.section_name = Some(section_name.to_owned());
        self
    }
}

impl From<&ResourceKey> for ParentReference {
    fn from(value: &ResourceKey) -> Self {
        Self {
            group: Some(value.group.clone()),
            kind: Some(value.kind.clone()),
            namespace: Some(value.namespace.clone()),
            name: value.name.clone(),
            section_name: None,
            port: None,
        }
    }
}

impl Display for ParentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let namespace = self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE_NAME);
        match &self.section_name {
            Some(section_name) => write!(f, "{}/{section_name}", create_id(&self.name, namespace)),
            None => write!(f, "{}", create_id(&self.name, namespace)),
        }
    }
}

pub fn create_id(name: &str, namespace: &str) -> String {
    format!("{namespace}.{name}")
}
