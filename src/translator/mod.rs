//! Gateway listener translation.
//!
//! Listeners are validated, then merged by port: plaintext HTTP listeners on
//! a port share one filter chain split into virtual hosts, every HTTPS, TCP
//! and TLS listener gets a filter chain of its own. Each merged port becomes
//! one [`ListenerIr`].

mod http;
mod https;
mod merge;
mod tcp;
mod validation;

pub use https::{translate_ssl_config, SslConfigError};
use tracing::{debug, span, Level};
use typed_builder::TypedBuilder;
pub use validation::validate_gateway;

use self::merge::MergedListeners;
use crate::{
    common::Gateway,
    configuration::ListenerTranslatorConfig,
    ir::ListenerIr,
    query::{GatewayQueries, RoutesForGwResult},
    reports::Reporter,
    route_rules::{DefaultRouteRuleTranslator, RouteRuleTranslator},
};

const TARGET: &str = "listener_translator::translator";

pub const DEFAULT_LOG_CONTEXT: &str = "translator/listener";
pub const TCP_TLS_LISTENER_NO_BACKENDS_MESSAGE: &str = "TCP/TLS listener has no valid backends or routes";

/// Name of the merged listener bound to `port`. The `~` keeps it apart from
/// user supplied listener names.
pub fn merged_listener_name(port: u32) -> String {
    format!("listener~{port}")
}

/// Replaces characters the proxy rejects in resource names.
pub fn sanitize_for_envoy(name: &str, resource_type: &str) -> String {
    let sanitized = name.replace('.', "_");
    if sanitized != name {
        debug!(target: TARGET, "Sanitized {resource_type} name {name} to {sanitized}");
    }
    sanitized
}

pub fn vhost_name(parent_name: &str, host: &str) -> String {
    sanitize_for_envoy(&format!("{parent_name}~{host}"), "vHost")
}

#[derive(TypedBuilder)]
pub struct ListenerTranslator<'a> {
    queries: &'a dyn GatewayQueries,
    #[builder(default = &DefaultRouteRuleTranslator as &dyn RouteRuleTranslator)]
    route_translator: &'a dyn RouteRuleTranslator,
    #[builder(default)]
    settings: ListenerTranslatorConfig,
    #[builder(default = DEFAULT_LOG_CONTEXT)]
    log_context: &'a str,
}

impl ListenerTranslator<'_> {
    /// Translates every listener of `gateway`. Never fails: problems are
    /// reported through `reporter` and the affected listeners or filter
    /// chains are left out.
    pub fn translate(&self, gateway: &Gateway, routes_for_gw: &RoutesForGwResult, reporter: &mut dyn Reporter) -> Vec<ListenerIr> {
        let span = span!(Level::DEBUG, "translate_listeners", gateway = gateway.name(), namespace = gateway.namespace());
        let _entered = span.enter();
        let log_context = self.log_context;

        let validated_listeners = validate_gateway(gateway, reporter);
        debug!(target: TARGET, "{log_context} Gateway {} has {} valid listeners", gateway.key(), validated_listeners.len());

        let mut merged_listeners = MergedListeners::new(gateway.namespace());
        for listener in validated_listeners {
            let routes = routes_for_gw.listener_result(&listener.listener_ref()).map(|result| result.routes.as_slice()).unwrap_or_default();
            // TODO: report route selection errors (ListenerResult::error) as a listener condition once a reason for them is agreed on.
            if let Err(e) = merged_listeners.append_listener(listener, routes) {
                debug!(target: TARGET, "{log_context} Skipping listener {} {e}", listener.name);
            }
        }

        let translated = merged_listeners.translate_listeners(self, reporter);
        debug!(target: TARGET, "{log_context} Translated gateway {} into {} listeners", gateway.key(), translated.len());
        translated
    }
}

/// Translates the listeners of one gateway with the default route rule
/// translator.
pub fn translate_listeners(
    queries: &dyn GatewayQueries,
    gateway: &Gateway,
    routes_for_gw: &RoutesForGwResult,
    reporter: &mut dyn Reporter,
    settings: ListenerTranslatorConfig,
) -> Vec<ListenerIr> {
    ListenerTranslator::builder().queries(queries).settings(settings).build().translate(gateway, routes_for_gw, reporter)
}
