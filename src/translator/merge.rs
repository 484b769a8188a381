use tracing::{debug, error};

use super::{
    http::HttpFilterChain, https::HttpsFilterChain, merged_listener_name, tcp::TcpFilterChain, ListenerTranslator,
    TCP_TLS_LISTENER_NO_BACKENDS_MESSAGE, TARGET,
};
use crate::{
    common::{Listener, ListenerError, ProtocolType, RouteInfo},
    ir::ListenerIr,
    reports::{ConditionStatus, ListenerCondition, ListenerConditionReason, ListenerConditionType, Reporter},
};

/// Every listener of one gateway grouped by port, in first-seen port order.
pub(super) struct MergedListeners<'a> {
    gateway_namespace: &'a str,
    listeners: Vec<MergedListener<'a>>,
}

/// All listeners bound to one port. Plaintext HTTP listeners share a single
/// filter chain, every other listener keeps its own.
pub(super) struct MergedListener<'a> {
    name: String,
    gateway_namespace: &'a str,
    port: u32,
    listener: &'a Listener,
    http_filter_chain: Option<HttpFilterChain<'a>>,
    https_filter_chains: Vec<HttpsFilterChain<'a>>,
    tcp_filter_chains: Vec<TcpFilterChain<'a>>,
}

impl<'a> MergedListeners<'a> {
    pub fn new(gateway_namespace: &'a str) -> Self {
        Self { gateway_namespace, listeners: vec![] }
    }

    pub fn append_listener(&mut self, listener: &'a Listener, routes: &'a [RouteInfo]) -> std::result::Result<(), ListenerError> {
        let port = u32::try_from(listener.port).map_err(|_| ListenerError::InvalidPort(listener.port, listener.name.clone()))?;
        match listener.protocol {
            ProtocolType::Http => {
                self.merged_listener(port, listener).append_http_listener(listener, routes);
            },
            ProtocolType::Https => {
                self.merged_listener(port, listener).https_filter_chains.push(HttpsFilterChain::new(listener, routes));
            },
            ProtocolType::Tcp | ProtocolType::Tls => {
                self.merged_listener(port, listener).tcp_filter_chains.push(TcpFilterChain::new(listener, routes));
            },
            ProtocolType::Udp | ProtocolType::Unset | ProtocolType::Other(_) => {
                return Err(ListenerError::UnsupportedProtocol(listener.protocol.clone(), listener.name.clone()));
            },
        }
        Ok(())
    }

    fn merged_listener(&mut self, port: u32, listener: &'a Listener) -> &mut MergedListener<'a> {
        let index = match self.listeners.iter().position(|merged| merged.port == port) {
            Some(index) => index,
            None => {
                debug!(target: TARGET, "Creating merged listener for port {port} from {}", listener.name);
                self.listeners.push(MergedListener::new(self.gateway_namespace, port, listener));
                self.listeners.len() - 1
            },
        };
        &mut self.listeners[index]
    }

    pub fn translate_listeners(&self, translator: &ListenerTranslator, reporter: &mut dyn Reporter) -> Vec<ListenerIr> {
        self.listeners.iter().map(|merged| merged.translate_listener(translator, reporter)).collect()
    }
}

impl<'a> MergedListener<'a> {
    fn new(gateway_namespace: &'a str, port: u32, listener: &'a Listener) -> Self {
        Self {
            name: merged_listener_name(port),
            gateway_namespace,
            port,
            listener,
            http_filter_chain: None,
            https_filter_chains: vec![],
            tcp_filter_chains: vec![],
        }
    }

    fn append_http_listener(&mut self, listener: &'a Listener, routes: &'a [RouteInfo]) {
        self.http_filter_chain.get_or_insert_with(HttpFilterChain::default).add_parent(listener, routes);
    }

    fn translate_listener(&self, translator: &ListenerTranslator, reporter: &mut dyn Reporter) -> ListenerIr {
        let log_context = translator.log_context;
        let mut http_filter_chain = vec![];

        if let Some(chain) = &self.http_filter_chain {
            http_filter_chain.push(chain.translate(&self.name, translator.route_translator, reporter));
        }

        for chain in &self.https_filter_chains {
            match chain.translate(self.gateway_namespace, translator, reporter) {
                Ok(translated) => http_filter_chain.push(translated),
                Err(e) => {
                    error!(target: TARGET, "{log_context} Dropping HTTPS filter chain {} on {} {e}", chain.listener_ref(), self.name);
                },
            }
        }

        let mut tcp = vec![];
        for chain in &self.tcp_filter_chains {
            if let Some(translated) = chain.translate(&self.name, reporter) {
                tcp.push(translated);
            }
        }

        if !self.tcp_filter_chains.is_empty() && tcp.is_empty() {
            debug!(target: TARGET, "{log_context} No TCP/TLS filter chain could be built for {}", self.name);
            for chain in &self.tcp_filter_chains {
                reporter.listener(&chain.listener_ref()).set_condition(
                    ListenerCondition::builder()
                        .type_(ListenerConditionType::Programmed)
                        .status(ConditionStatus::False)
                        .reason(ListenerConditionReason::Invalid)
                        .message(TCP_TLS_LISTENER_NO_BACKENDS_MESSAGE)
                        .build(),
                );
            }
        }

        ListenerIr {
            name: self.name.clone(),
            bind_address: translator.settings.bind_address().to_owned(),
            bind_port: self.port,
            attached_policies: Default::default(),
            policy_ancestor_ref: self.listener.policy_ancestor_ref.clone(),
            http_filter_chain,
            tcp,
        }
    }
}
