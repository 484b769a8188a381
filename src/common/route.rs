use gateway_api::apis::standard::httproutes::{
    HTTPRoute, HTTPRouteRulesBackendRefs, HTTPRouteRulesMatches, HTTPRouteRulesMatchesHeadersType, HTTPRouteRulesMatchesPathType,
    HTTPRouteRulesMatchesQueryParamsType,
};
use k8s_openapi::chrono::{DateTime, Utc};
use serde::Serialize;
use typed_builder::TypedBuilder;

use super::{
    backend::{BackendError, BackendObject, BackendRefIr, SERVICE_KIND_NAME},
    AttachedPolicies, ParentReference, ResourceKey,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum PathMatch {
    Exact(String),
    PathPrefix(String),
    RegularExpression(String),
}

impl PathMatch {
    pub fn value(&self) -> &str {
        match self {
            PathMatch::Exact(value) | PathMatch::PathPrefix(value) | PathMatch::RegularExpression(value) => value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValueMatch {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub regex: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct HttpRouteMatchIr {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<ValueMatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<ValueMatch>,
}

impl HttpRouteMatchIr {
    pub fn path_prefix(prefix: &str) -> Self {
        Self {
            path: Some(PathMatch::PathPrefix(prefix.to_owned())),
            ..Default::default()
        }
    }

    pub fn exact(path: &str) -> Self {
        Self {
            path: Some(PathMatch::Exact(path.to_owned())),
            ..Default::default()
        }
    }
}

impl From<&HTTPRouteRulesMatches> for HttpRouteMatchIr {
    fn from(value: &HTTPRouteRulesMatches) -> Self {
        let path = value.path.as_ref().map(|path| {
            let path_value = path.value.clone().unwrap_or("/".to_owned());
            match path.r#type {
                Some(HTTPRouteRulesMatchesPathType::Exact) => PathMatch::Exact(path_value),
                Some(HTTPRouteRulesMatchesPathType::RegularExpression) => PathMatch::RegularExpression(path_value),
                Some(HTTPRouteRulesMatchesPathType::PathPrefix) | None => PathMatch::PathPrefix(path_value),
            }
        });

        let method = value.method.as_ref().map(|method| {
            let mut method = format!("{method:?}");
            method.make_ascii_uppercase();
            method
        });

        let headers = value
            .headers
            .iter()
            .flatten()
            .map(|header| ValueMatch {
                name: header.name.clone(),
                value: header.value.clone(),
                regex: matches!(header.r#type, Some(HTTPRouteRulesMatchesHeadersType::RegularExpression)),
            })
            .collect();

        let query_params = value
            .query_params
            .iter()
            .flatten()
            .map(|query| ValueMatch {
                name: query.name.clone(),
                value: query.value.clone(),
                regex: matches!(query.r#type, Some(HTTPRouteRulesMatchesQueryParamsType::RegularExpression)),
            })
            .collect();

        Self { path, method, headers, query_params }
    }
}

/// A backend reference as declared on a route, namespace already defaulted
/// to the route's namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendReference {
    pub group: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub port: Option<i32>,
    pub weight: Option<i32>,
}

impl BackendReference {
    pub fn service(name: &str, namespace: &str, port: i32) -> Self {
        Self {
            group: String::new(),
            kind: SERVICE_KIND_NAME.to_owned(),
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            port: Some(port),
            weight: None,
        }
    }

    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey::namespaced(&self.name, &self.namespace).with_kind(&self.group, &self.kind)
    }

    fn from_kube(value: &HTTPRouteRulesBackendRefs, route_namespace: &str) -> Self {
        Self {
            group: value.group.clone().unwrap_or_default(),
            kind: value.kind.clone().unwrap_or(SERVICE_KIND_NAME.to_owned()),
            name: value.name.clone(),
            namespace: value.namespace.clone().unwrap_or(route_namespace.to_owned()),
            port: value.port,
            weight: value.weight,
        }
    }
}

/// Resolves declared backend references into backend objects.
pub trait BackendResolver {
    fn resolve_backend(&self, from: &ResourceKey, reference: &BackendReference) -> std::result::Result<BackendObject, BackendError>;
}

pub fn resolve_backend_ref(resolver: &dyn BackendResolver, from: &ResourceKey, reference: &BackendReference) -> BackendRefIr {
    match resolver.resolve_backend(from, reference) {
        Ok(backend) => BackendRefIr::resolved(backend, reference.weight),
        Err(error) => BackendRefIr::failed(format!("{}.{}", reference.name, reference.namespace), reference.weight, error),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpRouteRuleIr {
    pub matches: Vec<HttpRouteMatchIr>,
    pub backends: Vec<BackendRefIr>,
    pub attached_policies: AttachedPolicies,
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct HttpRouteIr {
    pub key: ResourceKey,
    #[builder(default, setter(strip_option))]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[builder(default)]
    pub hostnames: Vec<String>,
    #[builder(default)]
    pub parent_refs: Vec<ParentReference>,
    #[builder(default)]
    pub rules: Vec<HttpRouteRuleIr>,
    #[builder(default)]
    pub attached_policies: AttachedPolicies,
}

impl HttpRouteIr {
    pub fn from_kube(route: &HTTPRoute, resolver: &dyn BackendResolver) -> Self {
        let key = ResourceKey::from(route);
        let rules = route
            .spec
            .rules
            .iter()
            .flatten()
            .map(|rule| HttpRouteRuleIr {
                matches: rule.matches.iter().flatten().map(HttpRouteMatchIr::from).collect(),
                backends: rule
                    .backend_refs
                    .iter()
                    .flatten()
                    .map(|backend_ref| resolve_backend_ref(resolver, &key, &BackendReference::from_kube(backend_ref, &key.namespace)))
                    .collect(),
                attached_policies: AttachedPolicies::default(),
            })
            .collect();

        let parent_refs = route
            .spec
            .parent_refs
            .iter()
            .flatten()
            .map(|parent_ref| ParentReference {
                group: parent_ref.group.clone(),
                kind: parent_ref.kind.clone(),
                namespace: parent_ref.namespace.clone(),
                name: parent_ref.name.clone(),
                section_name: parent_ref.section_name.clone(),
                port: parent_ref.port,
            })
            .collect();

        Self {
            creation_timestamp: route.metadata.creation_timestamp.as_ref().map(|t| t.0),
            hostnames: route.spec.hostnames.clone().unwrap_or_default(),
            parent_refs,
            rules,
            attached_policies: AttachedPolicies::default(),
            key,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct L4RouteRuleIr {
    pub backends: Vec<BackendRefIr>,
}

/// TCPRoute or TLSRoute. TLS routes carry SNI hostnames, TCP routes none.
#[derive(Clone, Debug, TypedBuilder)]
pub struct L4RouteIr {
    pub key: ResourceKey,
    #[builder(default, setter(strip_option))]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[builder(default)]
    pub hostnames: Vec<String>,
    #[builder(default)]
    pub parent_refs: Vec<ParentReference>,
    #[builder(default)]
    pub rules: Vec<L4RouteRuleIr>,
}

#[derive(Clone, Debug)]
pub enum RouteObject {
    Http(HttpRouteIr),
    Tcp(L4RouteIr),
    Tls(L4RouteIr),
}

impl RouteObject {
    pub fn key(&self) -> &ResourceKey {
        match self {
            RouteObject::Http(route) => &route.key,
            RouteObject::Tcp(route) | RouteObject::Tls(route) => &route.key,
        }
    }

    pub fn hostnames(&self) -> &[String] {
        match self {
            RouteObject::Http(route) => &route.hostnames,
            RouteObject::Tcp(route) | RouteObject::Tls(route) => &route.hostnames,
        }
    }

    pub fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            RouteObject::Http(route) => route.creation_timestamp,
            RouteObject::Tcp(route) | RouteObject::Tls(route) => route.creation_timestamp,
        }
    }

    pub fn parent_refs(&self) -> &[ParentReference] {
        match self {
            RouteObject::Http(route) => &route.parent_refs,
            RouteObject::Tcp(route) | RouteObject::Tls(route) => &route.parent_refs,
        }
    }
}

/// A route bound to one listener through one of its parent references.
#[derive(Clone, Debug)]
pub struct RouteInfo {
    pub object: RouteObject,
    pub parent_ref: ParentReference,
    pub hostname_overrides: Option<Vec<String>>,
}

impl RouteInfo {
    pub fn new(object: RouteObject, parent_ref: ParentReference) -> Self {
        Self { object, parent_ref, hostname_overrides: None }
    }

    pub fn with_hostname_overrides(mut self, hostnames: Vec<String>) -> Self {
        self.hostname_overrides = Some(hostnames);
        self
    }

    pub fn hostnames(&self) -> &[String] {
        self.hostname_overrides.as_deref().unwrap_or_else(|| self.object.hostnames())
    }
}
