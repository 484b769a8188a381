use gateway_api::apis::standard::referencegrants::ReferenceGrant;
use k8s_openapi::{
    api::core::v1::{Secret, Service},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};

use super::{process_backend_error, GatewayQueries, InMemoryQueries, QueryError, RoutesForGwResult};
use crate::{
    common::{
        BackendError, BackendReference, BackendResolver, CertificateRef, HttpRouteIr, L4RouteIr, Listener, ParentReference, ProtocolType, ResourceKey,
        RouteObject,
    },
    reports::{ConditionStatus, ReportMap, RouteConditionReason, RouteConditionType},
};

fn metadata(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_owned()),
        namespace: Some(namespace.to_owned()),
        ..Default::default()
    }
}

fn secret(name: &str, namespace: &str) -> Secret {
    Secret { metadata: metadata(name, namespace), ..Default::default() }
}

fn service(name: &str, namespace: &str) -> Service {
    Service { metadata: metadata(name, namespace), ..Default::default() }
}

fn gateway_key() -> ResourceKey {
    ResourceKey::namespaced("", "infra")
}

const CERTS_GRANT: &str = r"
apiVersion: gateway.networking.k8s.io/v1beta1
kind: ReferenceGrant
metadata:
  name: allow-gateways
  namespace: certs
spec:
  from:
  - group: gateway.networking.k8s.io
    kind: Gateway
    namespace: infra
  to:
  - group: ''
    kind: Secret
    name: shared-cert
";

#[test]
pub fn test_secret_in_same_namespace() {
    let queries = InMemoryQueries::new().with_secret(secret("cert", "infra"));
    let found = queries.get_secret_for_ref(&gateway_key(), "infra", &CertificateRef::secret("cert")).unwrap();
    assert_eq!(found.metadata.name.as_deref(), Some("cert"));

    let missing = queries.get_secret_for_ref(&gateway_key(), "infra", &CertificateRef::secret("other"));
    assert_eq!(missing, Err(QueryError::NotFound(ResourceKey::namespaced("other", "infra").with_kind("", "Secret"))));
    assert_eq!(missing.unwrap_err().to_string(), "Secret infra/other not found");
}

#[test]
pub fn test_cross_namespace_secret_needs_grant() {
    let certificate_ref = CertificateRef::secret("shared-cert").in_namespace("certs");
    let queries = InMemoryQueries::new().with_secret(secret("shared-cert", "certs"));
    assert!(matches!(
        queries.get_secret_for_ref(&gateway_key(), "infra", &certificate_ref),
        Err(QueryError::MissingReferenceGrant(_))
    ));

    let grant: ReferenceGrant = serde_yaml::from_str(CERTS_GRANT).unwrap();
    let queries = queries.with_reference_grant(&grant);
    assert!(queries.get_secret_for_ref(&gateway_key(), "infra", &certificate_ref).is_ok());

    let other_namespace = queries.get_secret_for_ref(&gateway_key(), "elsewhere", &certificate_ref);
    assert!(matches!(other_namespace, Err(QueryError::MissingReferenceGrant(_))));

    let other_name = CertificateRef::secret("other-cert").in_namespace("certs");
    assert!(matches!(
        queries.get_secret_for_ref(&gateway_key(), "infra", &other_name),
        Err(QueryError::MissingReferenceGrant(_))
    ));
}

#[test]
pub fn test_secret_ref_kind_must_be_secret() {
    let queries = InMemoryQueries::new();
    let mut config_map_ref = CertificateRef::secret("cert");
    config_map_ref.kind = "ConfigMap".to_owned();
    assert_eq!(
        queries.get_secret_for_ref(&gateway_key(), "infra", &config_map_ref),
        Err(QueryError::UnsupportedKind("ConfigMap".to_owned()))
    );
}

#[test]
pub fn test_backend_resolution() {
    let route = ResourceKey::namespaced("route", "apps").with_kind("gateway.networking.k8s.io", "TCPRoute");
    let queries = InMemoryQueries::new().with_service(&service("db", "apps")).with_service(&service("db", "data"));

    let resolved = queries.resolve_backend(&route, &BackendReference::service("db", "apps", 5432)).unwrap();
    assert_eq!(resolved.cluster_name(), "db.apps:5432");

    assert!(matches!(
        queries.resolve_backend(&route, &BackendReference::service("db", "data", 5432)),
        Err(BackendError::MissingReferenceGrant(_))
    ));
    assert!(matches!(
        queries.resolve_backend(&route, &BackendReference::service("cache", "apps", 6379)),
        Err(BackendError::NotFound(_))
    ));

    let mut bucket = BackendReference::service("bucket", "apps", 443);
    bucket.group = "storage.example.com".to_owned();
    bucket.kind = "Bucket".to_owned();
    assert!(matches!(queries.resolve_backend(&route, &bucket), Err(BackendError::InvalidKind { .. })));
}

#[test]
pub fn test_process_backend_error() {
    let route = ResourceKey::namespaced("route", "apps");
    let parent_ref = ParentReference::gateway("gw", "infra");
    let cases = [
        (BackendError::InvalidKind { kind: "Bucket".to_owned(), name: "b".to_owned() }, RouteConditionReason::InvalidKind),
        (BackendError::MissingReferenceGrant(ResourceKey::namespaced("db", "data")), RouteConditionReason::RefNotPermitted),
        (BackendError::NotFound(ResourceKey::namespaced("db", "apps")), RouteConditionReason::BackendNotFound),
        (BackendError::Invalid(ResourceKey::namespaced("db", "apps"), "no ports".to_owned()), RouteConditionReason::BackendNotFound),
    ];

    for (error, reason) in cases {
        let mut report_map = ReportMap::new();
        process_backend_error(&error, &route, &parent_ref, &mut report_map);
        let condition = report_map.route_condition(&route, &parent_ref, RouteConditionType::ResolvedRefs).unwrap();
        assert_eq!(condition.status, ConditionStatus::False);
        assert_eq!(condition.reason, reason);
        assert_eq!(condition.message, error.to_string());
    }
}

#[test]
pub fn test_bind_route_narrows_hostnames() {
    let listener = Listener::builder().name("http").protocol(ProtocolType::Http).port(80).hostname("*.example.com").build();
    let parent_ref = ParentReference::gateway("gw", "default").with_section("http");
    let mut routes_for_gw = RoutesForGwResult::new();

    let route = HttpRouteIr::builder()
        .key(ResourceKey::namespaced("web", "default"))
        .hostnames(vec!["web.example.com".to_owned(), "web.example.org".to_owned()])
        .build();
    assert!(routes_for_gw.bind_route(&listener, RouteObject::Http(route), parent_ref.clone()));

    let unrelated = HttpRouteIr::builder().key(ResourceKey::namespaced("other", "default")).hostnames(vec!["other.org".to_owned()]).build();
    assert!(!routes_for_gw.bind_route(&listener, RouteObject::Http(unrelated), parent_ref.clone()));

    let any_host = HttpRouteIr::builder().key(ResourceKey::namespaced("any", "default")).build();
    assert!(routes_for_gw.bind_route(&listener, RouteObject::Http(any_host), parent_ref.clone()));

    let tcp = L4RouteIr::builder().key(ResourceKey::namespaced("tcp", "default")).build();
    assert!(routes_for_gw.bind_route(&listener, RouteObject::Tcp(tcp), parent_ref));

    let result = routes_for_gw.listener_result(&listener.listener_ref()).unwrap();
    assert_eq!(result.routes.len(), 3);
    assert_eq!(result.routes[0].hostnames(), ["web.example.com".to_owned()]);
    assert_eq!(result.routes[1].hostnames(), ["*.example.com".to_owned()]);
    assert!(result.routes[2].hostnames().is_empty());
    assert!(result.error.is_none());
}
