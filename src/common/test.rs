use gateway_api::apis::standard::{gateways::Gateway as KubeGateway, httproutes::HTTPRoute};
use k8s_openapi::{api::core::v1::Service, apimachinery::pkg::apis::meta::v1::ObjectMeta};

use super::{
    effective_hostnames, is_host_contained, Gateway, GatewayError, HostnameMatchFilter, HttpRouteIr, ListenerError, ListenerRef, PathMatch,
    ProtocolType, ResourceKey, TlsMode, DEFAULT_GROUP_NAME, LISTENER_SET_KIND_NAME,
};
use crate::query::InMemoryQueries;

fn hostnames(hostnames: &[&str]) -> Vec<String> {
    hostnames.iter().map(|&h| h.to_owned()).collect()
}

#[test]
pub fn test_host_contained() {
    assert!(is_host_contained("foo.example.com", Some("*.example.com")));
    assert!(is_host_contained("a.b.example.com", Some("*.example.com")));
    assert!(!is_host_contained("example.com", Some("*.example.com")));
    assert!(is_host_contained("api.example.com", Some("api.example.com")));
    assert!(!is_host_contained("web.example.com", Some("api.example.com")));
    assert!(is_host_contained("anything", None));
    assert!(is_host_contained("*", None));
}

#[test]
pub fn test_hostname_match_filter() {
    let listener_hostname = "test.com";
    let route_hostnames = hostnames(&["test.com", "no-test.com"]);
    assert!(HostnameMatchFilter::new(listener_hostname, &route_hostnames).filter());
    let route_hostnames = hostnames(&["diff-test.com", "no-test.com"]);
    assert!(!HostnameMatchFilter::new(listener_hostname, &route_hostnames).filter());

    let listener_hostname = "*.test.com";
    let route_hostnames = hostnames(&["blah.test.com", "no-test.com"]);
    assert!(HostnameMatchFilter::new(listener_hostname, &route_hostnames).filter());
    let route_hostnames = hostnames(&["test.com", "no-test.com"]);
    assert!(!HostnameMatchFilter::new(listener_hostname, &route_hostnames).filter());
    let route_hostnames = hostnames(&["*.test.com", "no-test.com"]);
    assert!(HostnameMatchFilter::new(listener_hostname, &route_hostnames).filter());
    let route_hostnames = hostnames(&["even.more.test.com", "no-test.com"]);
    assert!(HostnameMatchFilter::new(listener_hostname, &route_hostnames).filter());

    let listener_hostname = "more.test.com";
    let route_hostnames = hostnames(&["*.test.com"]);
    assert!(HostnameMatchFilter::new(listener_hostname, &route_hostnames).filter());
}

#[test]
pub fn test_effective_hostnames() {
    let route_hostnames = hostnames(&["foo.example.com", "bar.other.com"]);
    assert_eq!(effective_hostnames(None, &route_hostnames), Some(route_hostnames.clone()));
    assert_eq!(effective_hostnames(Some("*.example.com"), &route_hostnames), Some(hostnames(&["foo.example.com"])));
    assert_eq!(effective_hostnames(Some("api.example.com"), &[]), Some(hostnames(&["api.example.com"])));
    assert_eq!(effective_hostnames(Some("api.example.com"), &hostnames(&["*.example.com"])), Some(hostnames(&["api.example.com"])));
    assert_eq!(effective_hostnames(Some("api.example.org"), &route_hostnames), None);
}

#[test]
pub fn test_protocol_types() {
    assert_eq!(ProtocolType::from("HTTP"), ProtocolType::Http);
    assert_eq!(ProtocolType::from("https"), ProtocolType::Https);
    assert_eq!(ProtocolType::from(""), ProtocolType::Unset);
    assert_eq!(ProtocolType::from("example.com/custom"), ProtocolType::Other("example.com/custom".to_owned()));
    assert_eq!(ProtocolType::Tls.to_string(), "TLS");

    assert!(ProtocolType::Https.is_compatible_with(&ProtocolType::Tcp));
    assert!(ProtocolType::Http.is_compatible_with(&ProtocolType::Http));
    assert!(!ProtocolType::Http.is_compatible_with(&ProtocolType::Https));
    assert!(!ProtocolType::Udp.is_supported());
}

#[test]
pub fn test_listener_route_key() {
    let gateway = ResourceKey::namespaced("gw", "infra");
    assert_eq!(ListenerRef::new(gateway, "https").route_key(), "https");

    let listener_set = ResourceKey::namespaced("extra", "team-a").with_kind(DEFAULT_GROUP_NAME, LISTENER_SET_KIND_NAME);
    assert_eq!(ListenerRef::new(listener_set, "https").route_key(), "team-a/extra/https");
}

#[test]
pub fn test_gateway_from_kube() {
    let m = r"
apiVersion: gateway.networking.k8s.io/v1
kind: Gateway
metadata:
  name: edge
  namespace: infra
  generation: 3
spec:
  gatewayClassName: kgateway
  listeners:
  - name: http
    port: 80
    protocol: HTTP
  - name: https
    port: 443
    protocol: HTTPS
    hostname: api.example.com
    tls:
      mode: Terminate
      certificateRefs:
      - name: api-cert
        namespace: certs
  - name: ''
    port: 8080
    protocol: HTTP
";
    let kube_gateway: KubeGateway = serde_yaml::from_str(m).unwrap();
    let gateway = Gateway::try_from(&kube_gateway).unwrap();

    assert_eq!(gateway.name(), "edge");
    assert_eq!(gateway.namespace(), "infra");
    assert_eq!(gateway.generation(), Some(3));
    let listeners: Vec<_> = gateway.listeners().collect();
    assert_eq!(listeners.len(), 2);

    let https = gateway.listener(gateway.key(), "https").unwrap();
    assert_eq!(https.protocol, ProtocolType::Https);
    assert_eq!(https.port, 443);
    assert_eq!(https.hostname(), Some("api.example.com"));
    let tls = https.tls.as_ref().unwrap();
    assert_eq!(tls.mode, Some(TlsMode::Terminate));
    assert_eq!(tls.certificate_refs.len(), 1);
    assert_eq!(tls.certificate_refs[0].resource_key("infra"), ResourceKey::namespaced("api-cert", "certs").with_kind("", "Secret"));
    assert_eq!(https.policy_ancestor_ref.name, "edge");
    assert_eq!(https.policy_ancestor_ref.namespace.as_deref(), Some("infra"));

    let mut gateway = gateway;
    gateway.add_listener_set("extra", "team-a", &kube_gateway.spec.listeners[..1]).unwrap();
    let extra = gateway.listeners().last().unwrap();
    assert_eq!(extra.listener_ref().route_key(), "team-a/extra/http");
    assert_eq!(extra.policy_ancestor_ref.kind.as_deref(), Some(LISTENER_SET_KIND_NAME));
    assert!(matches!(
        gateway.add_listener_set("broken", "team-a", &kube_gateway.spec.listeners[2..]),
        Err(GatewayError::Listener(ListenerError::MissingName(_)))
    ));
}

#[test]
pub fn test_http_route_from_kube() {
    let m = r"
apiVersion: gateway.networking.k8s.io/v1
kind: HTTPRoute
metadata:
  name: matching
  namespace: apps
  creationTimestamp: '2024-01-01T00:00:00Z'
spec:
  parentRefs:
  - name: edge
    namespace: infra
    sectionName: http
  hostnames:
  - example.com
  rules:
  - matches:
    - path:
        type: Exact
        value: /v2
      headers:
      - name: version
        value: two
    - method: GET
    backendRefs:
    - name: backend-v2
      port: 8080
      weight: 3
  - backendRefs:
    - name: missing
      port: 8080
";
    let route: HTTPRoute = serde_yaml::from_str(m).unwrap();
    let service = Service {
        metadata: ObjectMeta {
            name: Some("backend-v2".to_owned()),
            namespace: Some("apps".to_owned()),
            ..Default::default()
        },
        ..Default::default()
    };
    let queries = InMemoryQueries::new().with_service(&service);

    let route = HttpRouteIr::from_kube(&route, &queries);
    assert_eq!(route.key.name, "matching");
    assert_eq!(route.key.namespace, "apps");
    assert!(route.creation_timestamp.is_some());
    assert_eq!(route.hostnames, hostnames(&["example.com"]));
    assert_eq!(route.parent_refs.len(), 1);
    assert_eq!(route.parent_refs[0].section_name.as_deref(), Some("http"));

    assert_eq!(route.rules.len(), 2);
    let first = &route.rules[0];
    assert_eq!(first.matches.len(), 2);
    assert_eq!(first.matches[0].path, Some(PathMatch::Exact("/v2".to_owned())));
    assert_eq!(first.matches[0].headers.len(), 1);
    assert_eq!(first.matches[1].method.as_deref(), Some("GET"));
    assert_eq!(first.backends[0].cluster_name, "backend-v2.apps:8080");
    assert_eq!(first.backends[0].weight, 3);
    assert!(first.backends[0].resolution_error().is_none());

    let second = &route.rules[1];
    assert!(second.matches.is_empty());
    assert!(second.backends[0].resolution_error().is_some());
    assert_eq!(second.backends[0].weight, 1);
}
