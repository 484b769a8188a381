use tracing::debug;

use super::TARGET;
use crate::{
    common::{Listener, ListenerRef, L4RouteIr, RouteInfo, RouteObject},
    ir::{FilterChainCommon, FilterChainMatch, TcpIr},
    query::process_backend_error,
    reports::{ConditionStatus, Reporter, RouteCondition, RouteConditionReason, RouteConditionType},
};

/// Filter chain of one TCP or TLS listener. Only one route per listener is
/// translated.
pub(super) struct TcpFilterChain<'a> {
    listener: &'a Listener,
    routes: &'a [RouteInfo],
}

impl<'a> TcpFilterChain<'a> {
    pub fn new(listener: &'a Listener, routes: &'a [RouteInfo]) -> Self {
        Self { listener, routes }
    }

    pub fn listener_ref(&self) -> ListenerRef {
        self.listener.listener_ref()
    }

    pub fn translate(&self, parent_name: &str, reporter: &mut dyn Reporter) -> Option<TcpIr> {
        if self.routes.len() > 1 {
            // TODO: report the routes left out here as not accepted on the listener.
            debug!(target: TARGET, "Listener {} has {} routes, only the oldest one is used", self.listener.name, self.routes.len());
        }
        let route_info = self.routes.iter().min_by_key(|route_info| route_info.object.creation_timestamp())?;

        let (route, matcher) = match &route_info.object {
            RouteObject::Tcp(route) => (route, FilterChainMatch::default()),
            RouteObject::Tls(route) => (route, FilterChainMatch::sni(self.listener.hostname())),
            RouteObject::Http(route) => {
                debug!(target: TARGET, "Ignoring HTTP route {} on TCP listener {}", route.key, self.listener.name);
                return None;
            },
        };

        if !Self::report_acceptance(route, reporter) {
            return None;
        }

        let backends = route.rules.first().map(|rule| rule.backends.clone()).unwrap_or_default();
        for error in backends.iter().filter_map(|backend| backend.resolution_error()) {
            for parent_ref in &route.parent_refs {
                process_backend_error(&error, &route.key, parent_ref, reporter);
            }
        }

        // Unresolved backends stay so that traffic is split by the declared weights.
        if backends.is_empty() {
            debug!(target: TARGET, "Route {} has no backends", route.key);
            return None;
        }

        Some(TcpIr {
            common: FilterChainCommon {
                name: format!("{parent_name}-{}.{}-rule-0", route.key.namespace, route.key.name),
                matcher,
                tls: None,
            },
            backends,
        })
    }

    /// A TCP or TLS route is accepted when it has exactly one rule. The
    /// outcome is reported on every parent ref of the route.
    fn report_acceptance(route: &L4RouteIr, reporter: &mut dyn Reporter) -> bool {
        let accepted = route.rules.len() == 1;
        let (status, reason) = if accepted {
            (ConditionStatus::True, RouteConditionReason::Accepted)
        } else {
            (ConditionStatus::False, RouteConditionReason::UnsupportedValue)
        };

        for parent_ref in &route.parent_refs {
            reporter
                .route(&route.key, parent_ref)
                .set_condition(RouteCondition::builder().type_(RouteConditionType::Accepted).status(status).reason(reason).build());
        }
        accepted
    }
}
