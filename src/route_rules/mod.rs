
use std::cmp::Ordering;

use k8s_openapi::chrono::{DateTime, Utc};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::{
    common::{HttpRouteIr, HttpRouteMatchIr, PathMatch, ResourceKey, RouteInfo},
    ir::HttpRouteRuleMatchIr,
    query::process_backend_error,
    reports::{ConditionStatus, Reporter, RouteCondition, RouteConditionReason, RouteConditionType},
};

const TARGET: &str = "listener_translator::route_rules";
const DEFAULT_PATH_PREFIX: &str = "/";

/// A translated rule match together with what it is ordered by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortableRoute {
    pub route_key: ResourceKey,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub rule_index: usize,
    pub match_index: usize,
    pub rule: HttpRouteRuleMatchIr,
}

impl SortableRoute {
    /// Gateway-API match precedence: exact path, longest prefix, method,
    /// header count, query count, then oldest route and its name.
    pub fn precedence(&self, other: &Self) -> Ordering {
        MatchComparator::builder()
            .this(&self.rule.matcher)
            .other(&other.rule.matcher)
            .build()
            .compare()
            .then_with(|| self.creation_timestamp.cmp(&other.creation_timestamp))
            .then_with(|| (&self.route_key.namespace, &self.route_key.name).cmp(&(&other.route_key.namespace, &other.route_key.name)))
            .then_with(|| self.rule_index.cmp(&other.rule_index))
            .then_with(|| self.match_index.cmp(&other.match_index))
    }
}

/// Stable sort, so rules that tie keep the order they were appended in.
pub fn sort_routes(routes: &mut [SortableRoute]) {
    routes.sort_by(SortableRoute::precedence);
}

#[derive(TypedBuilder)]
struct MatchComparator<'a> {
    this: &'a HttpRouteMatchIr,
    other: &'a HttpRouteMatchIr,
}

impl MatchComparator<'_> {
    fn compare(&self) -> Ordering {
        self.path_matching()
            .then_with(|| self.method_matching())
            .then_with(|| self.other.headers.len().cmp(&self.this.headers.len()))
            .then_with(|| self.other.query_params.len().cmp(&self.this.query_params.len()))
    }

    fn path_rank(path: Option<&PathMatch>) -> (u8, isize) {
        let length = |value: &str| -isize::try_from(value.len()).unwrap_or(isize::MAX);
        match path {
            Some(PathMatch::Exact(value)) => (0, length(value)),
            Some(PathMatch::PathPrefix(value)) => (1, length(value)),
            Some(PathMatch::RegularExpression(value)) => (2, length(value)),
            None => (3, 0),
        }
    }

    fn path_matching(&self) -> Ordering {
        Self::path_rank(self.this.path.as_ref()).cmp(&Self::path_rank(self.other.path.as_ref()))
    }

    fn method_matching(&self) -> Ordering {
        match (self.this.method.as_ref(), self.other.method.as_ref()) {
            (None, None) | (Some(_), Some(_)) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        }
    }
}

/// Turns an HTTP route into ordered rule matches for one virtual host.
pub trait RouteRuleTranslator {
    fn translate_http_route(&self, route_info: &RouteInfo, route: &HttpRouteIr, reporter: &mut dyn Reporter) -> Vec<SortableRoute>;
}

/// One rule match per `(rule, match)` pair; rules without matches match
/// every path.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRouteRuleTranslator;

impl RouteRuleTranslator for DefaultRouteRuleTranslator {
    fn translate_http_route(&self, route_info: &RouteInfo, route: &HttpRouteIr, reporter: &mut dyn Reporter) -> Vec<SortableRoute> {
        let parent_ref = &route_info.parent_ref;
        let default_matches = [HttpRouteMatchIr::path_prefix(DEFAULT_PATH_PREFIX)];
        let mut translated = vec![];
        let mut backend_errors = vec![];

        for (rule_index, rule) in route.rules.iter().enumerate() {
            let matches = if rule.matches.is_empty() { default_matches.as_slice() } else { rule.matches.as_slice() };
            backend_errors.extend(rule.backends.iter().filter_map(|backend| backend.resolution_error()));

            let mut attached_policies = route.attached_policies.clone();
            attached_policies.extend(&rule.attached_policies);

            for (match_index, matcher) in matches.iter().enumerate() {
                translated.push(SortableRoute {
                    route_key: route.key.clone(),
                    creation_timestamp: route.creation_timestamp,
                    rule_index,
                    match_index,
                    rule: HttpRouteRuleMatchIr {
                        name: format!("{}.{}-rule-{rule_index}-match-{match_index}", route.key.namespace, route.key.name),
                        parent_ref: parent_ref.clone(),
                        matcher: matcher.clone(),
                        backends: rule.backends.clone(),
                        attached_policies: attached_policies.clone(),
                    },
                });
            }
        }

        reporter.route(&route.key, parent_ref).set_condition(
            RouteCondition::builder()
                .type_(RouteConditionType::Accepted)
                .status(ConditionStatus::True)
                .reason(RouteConditionReason::Accepted)
                .build(),
        );

        if backend_errors.is_empty() {
            reporter.route(&route.key, parent_ref).set_condition(
                RouteCondition::builder()
                    .type_(RouteConditionType::ResolvedRefs)
                    .status(ConditionStatus::True)
                    .reason(RouteConditionReason::ResolvedRefs)
                    .build(),
            );
        } else {
            for error in &backend_errors {
                process_backend_error(error, &route.key, parent_ref, reporter);
            }
        }

        debug!(target: TARGET, "Translated route {} into {} rule matches", route.key, translated.len());
        translated
    }
}
