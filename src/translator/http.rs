use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{vhost_name, TARGET};
use crate::{
    common::{is_host_contained, AttachedPolicies, Listener, ListenerRef, RouteInfo, RouteObject, DEFAULT_ROUTE_HOSTNAME},
    ir::{FilterChainCommon, FilterChainMatch, HttpFilterChainIr, VirtualHost},
    reports::Reporter,
    route_rules::{sort_routes, RouteRuleTranslator, SortableRoute},
};

pub(super) type RoutesByHost = BTreeMap<String, Vec<SortableRoute>>;

/// One plaintext listener sharing the port's HTTP filter chain.
struct HttpFilterChainParent<'a> {
    listener: &'a Listener,
    routes: &'a [RouteInfo],
}

#[derive(Default)]
pub(super) struct HttpFilterChain<'a> {
    parents: Vec<HttpFilterChainParent<'a>>,
}

impl<'a> HttpFilterChain<'a> {
    pub fn add_parent(&mut self, listener: &'a Listener, routes: &'a [RouteInfo]) {
        self.parents.push(HttpFilterChainParent { listener, routes });
    }

    /// The chain itself carries no policies: it is shared by every plaintext
    /// listener on the port, so policies only apply per virtual host.
    pub fn translate(&self, parent_name: &str, route_translator: &dyn RouteRuleTranslator, reporter: &mut dyn Reporter) -> HttpFilterChainIr {
        let mut routes_by_host = RoutesByHost::new();
        for parent in &self.parents {
            build_routes_per_host(&mut routes_by_host, parent.routes, route_translator, reporter);
        }

        let vhosts = build_virtual_hosts(parent_name, routes_by_host, |host| {
            self.most_specific_listener(host)
                .map(|listener| (listener.attached_policies.clone(), Some(listener.listener_ref())))
                .unwrap_or_default()
        });

        HttpFilterChainIr {
            common: FilterChainCommon {
                name: parent_name.to_owned(),
                matcher: FilterChainMatch::default(),
                tls: None,
            },
            attached_policies: AttachedPolicies::default(),
            vhosts,
        }
    }

    /// The listener with the longest hostname serving `host`. A listener
    /// without hostname serves every host with length zero; on equal length
    /// the first listener wins.
    fn most_specific_listener(&self, host: &str) -> Option<&'a Listener> {
        let mut max_hostname_length = -1_isize;
        let mut selected = None;
        for parent in &self.parents {
            let listener_hostname = parent.listener.hostname();
            if !is_host_contained(host, listener_hostname) {
                continue;
            }
            let length = listener_hostname.map_or(0, |hostname| isize::try_from(hostname.len()).unwrap_or(isize::MAX));
            if length > max_hostname_length {
                max_hostname_length = length;
                selected = Some(parent.listener);
            }
        }
        selected
    }
}

/// Translates `routes` and appends their rules to the bucket of every host
/// they serve. Routes without hostnames land in the `*` bucket.
pub(super) fn build_routes_per_host(routes_by_host: &mut RoutesByHost, routes: &[RouteInfo], route_translator: &dyn RouteRuleTranslator, reporter: &mut dyn Reporter) {
    for route_info in routes {
        let RouteObject::Http(route) = &route_info.object else {
            debug!(target: TARGET, "Ignoring non HTTP route {} on HTTP listener", route_info.object.key());
            continue;
        };

        let translated = route_translator.translate_http_route(route_info, route, reporter);
        if translated.is_empty() {
            debug!(target: TARGET, "Route {} produced no rules", route.key);
            continue;
        }

        let hostnames = route_info.hostnames();
        if hostnames.is_empty() {
            routes_by_host.entry(DEFAULT_ROUTE_HOSTNAME.to_owned()).or_default().extend(translated);
        } else {
            for host in hostnames {
                routes_by_host.entry(host.clone()).or_default().extend(translated.iter().cloned());
            }
        }
    }
}

/// One virtual host per host bucket, named `{parent_name}~{host}`. When two
/// hosts end up with the same name only the first one is kept.
pub(super) fn build_virtual_hosts(
    parent_name: &str,
    routes_by_host: RoutesByHost,
    mut policies_for_host: impl FnMut(&str) -> (AttachedPolicies, Option<ListenerRef>),
) -> Vec<VirtualHost> {
    let mut vhost_names = BTreeSet::new();
    let mut vhosts = vec![];

    for (host, mut routes) in routes_by_host {
        let name = vhost_name(parent_name, &host);
        if !vhost_names.insert(name.clone()) {
            debug!(target: TARGET, "Skipping virtual host for {host}, name {name} is already taken");
            continue;
        }

        sort_routes(&mut routes);
        let (attached_policies, parent_listener) = policies_for_host(&host);
        vhosts.push(VirtualHost {
            name,
            hostname: host,
            rules: routes.into_iter().map(|route| route.rule).collect(),
            attached_policies,
            parent_listener,
        });
    }

    vhosts.sort_by(|this, other| this.name.cmp(&other.name));
    vhosts
}
