use super::{
    ConditionStatus, ListenerCondition, ListenerConditionReason, ListenerConditionType, ReportMap, Reporter, RouteCondition, RouteConditionReason,
    RouteConditionType,
};
use crate::common::{ListenerRef, ParentReference, ResourceKey};

fn listener_ref() -> ListenerRef {
    ListenerRef::new(ResourceKey::namespaced("gw", "infra"), "https")
}

#[test]
pub fn test_listener_conditions_replace_by_type() {
    let listener = listener_ref();
    let mut report_map = ReportMap::new();
    let reporter: &mut dyn Reporter = &mut report_map;

    reporter.listener(&listener).set_condition(
        ListenerCondition::builder()
            .type_(ListenerConditionType::Programmed)
            .status(ConditionStatus::False)
            .reason(ListenerConditionReason::Invalid)
            .message("first")
            .build(),
    );
    reporter.listener(&listener).set_condition(
        ListenerCondition::builder()
            .type_(ListenerConditionType::Programmed)
            .status(ConditionStatus::False)
            .reason(ListenerConditionReason::Invalid)
            .message("second")
            .build(),
    );
    reporter.listener(&listener).set_condition(
        ListenerCondition::builder()
            .type_(ListenerConditionType::ResolvedRefs)
            .status(ConditionStatus::False)
            .reason(ListenerConditionReason::InvalidCertificateRef)
            .build(),
    );

    assert_eq!(report_map.listener_conditions(&listener).count(), 2);
    let programmed = report_map.listener_condition(&listener, ListenerConditionType::Programmed).unwrap();
    assert_eq!(programmed.message, "second");
    assert!(report_map.listener_condition(&listener, ListenerConditionType::Accepted).is_none());
    assert_eq!(report_map.reported_listeners().collect::<Vec<_>>(), vec![&listener]);
}

#[test]
pub fn test_listener_status_fills_defaults() {
    let listener = listener_ref();
    let mut report_map = ReportMap::new();
    report_map.set_listener_condition(
        &listener,
        ListenerCondition::builder()
            .type_(ListenerConditionType::ResolvedRefs)
            .status(ConditionStatus::False)
            .reason(ListenerConditionReason::RefNotPermitted)
            .message("Reference not permitted by ReferenceGrant.")
            .build(),
    );

    let status = report_map.listener_status(&listener, Some(7));
    assert_eq!(status.len(), 4);
    assert!(status.iter().all(|c| c.observed_generation == Some(7)));

    let find = |type_: &str| status.iter().find(|c| c.type_ == type_).unwrap();
    assert_eq!(find("Accepted").status, "True");
    assert_eq!(find("Programmed").reason, "Programmed");
    assert_eq!(find("Conflicted").status, "False");
    assert_eq!(find("Conflicted").reason, "NoConflicts");
    let resolved_refs = find("ResolvedRefs");
    assert_eq!(resolved_refs.status, "False");
    assert_eq!(resolved_refs.reason, "RefNotPermitted");
    assert_eq!(resolved_refs.message, "Reference not permitted by ReferenceGrant.");
}

#[test]
pub fn test_route_conditions_are_per_parent_ref() {
    let route = ResourceKey::namespaced("tcp-route", "apps").with_kind("gateway.networking.k8s.io", "TCPRoute");
    let first_parent = ParentReference::gateway("gw", "infra").with_section("tcp-a");
    let second_parent = ParentReference::gateway("gw", "infra").with_section("tcp-b");
    let mut report_map = ReportMap::new();
    let reporter: &mut dyn Reporter = &mut report_map;

    reporter.route(&route, &first_parent).set_condition(
        RouteCondition::builder()
            .type_(RouteConditionType::Accepted)
            .status(ConditionStatus::False)
            .reason(RouteConditionReason::UnsupportedValue)
            .build(),
    );

    let condition = report_map.route_condition(&route, &first_parent, RouteConditionType::Accepted).unwrap();
    assert_eq!(condition.reason, RouteConditionReason::UnsupportedValue);
    assert!(report_map.route_condition(&route, &second_parent, RouteConditionType::Accepted).is_none());
    assert_eq!(report_map.reported_routes().count(), 1);
    assert_eq!(report_map.route_conditions(&route, &first_parent).count(), 1);
    assert_eq!(report_map.route_conditions(&route, &second_parent).count(), 0);

    let status = report_map.route_status(&route, &second_parent, None);
    assert_eq!(status.len(), 2);
    assert!(status.iter().all(|c| c.status == "True"));

    let status = report_map.route_status(&route, &first_parent, None);
    let accepted = status.iter().find(|c| c.type_ == "Accepted").unwrap();
    assert_eq!(accepted.status, "False");
    assert_eq!(accepted.reason, "UnsupportedValue");
}
