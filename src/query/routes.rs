use std::collections::BTreeMap;

use tracing::debug;

use super::QueryError;
use crate::common::{effective_hostnames, Listener, ListenerRef, ParentReference, RouteInfo, RouteObject};

const TARGET: &str = "listener_translator::query";

#[derive(Clone, Debug, Default)]
pub struct ListenerResult {
    pub routes: Vec<RouteInfo>,
    /// Failure while selecting routes for the listener. Carried through
    /// translation but not reported.
    pub error: Option<QueryError>,
}

/// Routes bound to each listener of one gateway, as computed by route
/// selection.
#[derive(Clone, Debug, Default)]
pub struct RoutesForGwResult {
    listener_results: BTreeMap<ListenerRef, ListenerResult>,
}

impl RoutesForGwResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_result(&self, listener: &ListenerRef) -> Option<&ListenerResult> {
        self.listener_results.get(listener)
    }

    pub fn set_listener_result(&mut self, listener: ListenerRef, result: ListenerResult) {
        self.listener_results.insert(listener, result);
    }

    pub fn set_listener_error(&mut self, listener: ListenerRef, error: QueryError) {
        self.listener_results.entry(listener).or_default().error = Some(error);
    }

    /// Binds a route to a listener. HTTP and TLS routes get their hostnames
    /// narrowed to what the listener serves; when nothing intersects the
    /// route is not bound and `false` is returned.
    pub fn bind_route(&mut self, listener: &Listener, object: RouteObject, parent_ref: ParentReference) -> bool {
        let mut route_info = RouteInfo::new(object, parent_ref);
        if !matches!(route_info.object, RouteObject::Tcp(_)) {
            let Some(hostnames) = effective_hostnames(listener.hostname(), route_info.object.hostnames()) else {
                debug!(target: TARGET, "Route {} has no hostname matching listener {}", route_info.object.key(), listener.name);
                return false;
            };
            if hostnames.as_slice() != route_info.object.hostnames() {
                route_info = route_info.with_hostname_overrides(hostnames);
            }
        }

        self.listener_results.entry(listener.listener_ref()).or_default().routes.push(route_info);
        true
    }
}
