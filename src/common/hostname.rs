use eater_domainmatcher::DomainPattern;
use itertools::Itertools;
use tracing::{debug, warn};

use super::DEFAULT_ROUTE_HOSTNAME;

const TARGET: &str = "listener_translator::hostname";

/// Reports whether `host` is served by a listener with the given hostname.
///
/// A listener without a hostname accepts every host. A `*.suffix` listener
/// accepts any host ending in `.suffix`; anything else must match exactly.
pub fn is_host_contained(host: &str, listener_hostname: Option<&str>) -> bool {
    match listener_hostname {
        None => true,
        Some(listener_hostname) => match listener_hostname.strip_prefix('*') {
            Some(suffix) if suffix.starts_with('.') && host.ends_with(suffix) => true,
            _ => host == listener_hostname,
        },
    }
}

pub struct HostnameMatchFilter<'a> {
    listener_hostname: &'a str,
    route_hostnames: &'a [String],
}

impl<'a> HostnameMatchFilter<'a> {
    pub fn new(listener_hostname: &'a str, route_hostnames: &'a [String]) -> Self {
        Self { listener_hostname, route_hostnames }
    }

    pub fn filter(&self) -> bool {
        if self.listener_hostname.is_empty() || self.route_hostnames.is_empty() {
            return true;
        }

        if self.route_hostnames.first().is_some_and(|hostname| hostname == DEFAULT_ROUTE_HOSTNAME) {
            return true;
        }

        !self.intersection().is_empty()
    }

    /// Hostnames a route ends up serving on this listener.
    ///
    /// Route hostnames matched by the listener are kept as they are. A
    /// wildcard route hostname that covers the listener hostname narrows
    /// down to the listener hostname.
    pub fn intersection(&self) -> Vec<String> {
        let listener_hostname = self.listener_hostname;
        let pattern = if let Some(stripped) = listener_hostname.strip_prefix("*.") {
            format! {"**+.{stripped}"}
        } else {
            listener_hostname.to_owned()
        };
        let Ok(listener_pattern) = DomainPattern::<'_, '.'>::try_from(pattern.as_str()) else {
            warn!(target: TARGET, "Hostname is not a valid domain {listener_hostname}");
            return vec![];
        };

        self.route_hostnames
            .iter()
            .filter_map(|route_hostname| {
                let matched = if route_hostname == listener_hostname || listener_pattern.matches(route_hostname.as_str()) {
                    Some(route_hostname.as_str())
                } else if route_hostname.starts_with("*.") {
                    DomainPattern::<'_, '.'>::try_from(route_hostname.as_str())
                        .ok()
                        .filter(|pattern| pattern.matches(listener_hostname))
                        .map(|_| listener_hostname)
                } else {
                    None
                };
                debug!(target: TARGET, "Comparing hostnames {listener_hostname} {route_hostname} {matched:?}");
                matched
            })
            .unique()
            .map(str::to_owned)
            .collect()
    }
}

/// Hostnames a route serves once bound to a listener, `None` when nothing
/// intersects and the route must not bind.
pub fn effective_hostnames(listener_hostname: Option<&str>, route_hostnames: &[String]) -> Option<Vec<String>> {
    match listener_hostname {
        None | Some("") => Some(route_hostnames.to_vec()),
        Some(listener_hostname) if route_hostnames.is_empty() => Some(vec![listener_hostname.to_owned()]),
        Some(listener_hostname) => {
            let hostnames = HostnameMatchFilter::new(listener_hostname, route_hostnames).intersection();
            if hostnames.is_empty() {
                None
            } else {
                Some(hostnames)
            }
        },
    }
}
