use thiserror::Error;
use tracing::debug;

use super::{
    http::{build_routes_per_host, build_virtual_hosts, RoutesByHost},
    ListenerTranslator, TARGET,
};
use crate::{
    common::{AttachedPolicies, Listener, ListenerRef, ResourceKey, RouteInfo, TlsMode},
    ir::{FilterChainCommon, FilterChainMatch, HttpFilterChainIr, TlsBundle},
    query::{GatewayQueries, QueryError},
    reports::{ConditionStatus, ListenerCondition, ListenerConditionReason, ListenerConditionType, Reporter},
    ssl::{tls_bundle_from_secret, TlsSecretError},
};

const INVALID_CERTIFICATE_REF_MESSAGE: &str = "Invalid certificate ref.";
const REF_NOT_PERMITTED_MESSAGE: &str = "Reference not permitted by ReferenceGrant.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SslConfigError {
    #[error("exactly one certificate ref is supported, got {0}")]
    CertificateRefCount(usize),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    TlsSecret(#[from] TlsSecretError),
}

impl SslConfigError {
    /// `ResolvedRefs` reason and message reported for this failure.
    pub(super) fn condition(&self) -> (ListenerConditionReason, String) {
        match self {
            SslConfigError::Query(QueryError::MissingReferenceGrant(_)) => (ListenerConditionReason::RefNotPermitted, REF_NOT_PERMITTED_MESSAGE.to_owned()),
            SslConfigError::Query(QueryError::NotFound(key)) => {
                (ListenerConditionReason::InvalidCertificateRef, format!("Secret {}/{} not found.", key.namespace, key.name))
            },
            SslConfigError::TlsSecret(e) => (ListenerConditionReason::InvalidCertificateRef, e.to_string()),
            SslConfigError::CertificateRefCount(_) | SslConfigError::Query(QueryError::UnsupportedKind(_)) => {
                (ListenerConditionReason::InvalidCertificateRef, INVALID_CERTIFICATE_REF_MESSAGE.to_owned())
            },
        }
    }
}

/// Resolves the certificate a terminating listener serves. Listeners without
/// TLS config, or not terminating TLS, get no bundle.
pub fn translate_ssl_config(queries: &dyn GatewayQueries, gateway_namespace: &str, listener: &Listener) -> std::result::Result<Option<TlsBundle>, SslConfigError> {
    let Some(tls) = &listener.tls else {
        return Ok(None);
    };
    if tls.mode != Some(TlsMode::Terminate) {
        return Ok(None);
    }

    let [certificate_ref] = tls.certificate_refs.as_slice() else {
        return Err(SslConfigError::CertificateRefCount(tls.certificate_refs.len()));
    };

    let from = ResourceKey::namespaced("", gateway_namespace);
    let secret = queries.get_secret_for_ref(&from, gateway_namespace, certificate_ref)?;
    Ok(Some(tls_bundle_from_secret(&secret)?))
}

/// Filter chain of one HTTPS listener, selected by SNI.
pub(super) struct HttpsFilterChain<'a> {
    listener: &'a Listener,
    routes: &'a [RouteInfo],
}

impl<'a> HttpsFilterChain<'a> {
    pub fn new(listener: &'a Listener, routes: &'a [RouteInfo]) -> Self {
        Self { listener, routes }
    }

    pub fn listener_ref(&self) -> ListenerRef {
        self.listener.listener_ref()
    }

    /// Fails when the listener certificate cannot be resolved; the failure is
    /// reported on this listener and the chain must be dropped.
    pub fn translate(&self, gateway_namespace: &str, translator: &ListenerTranslator, reporter: &mut dyn Reporter) -> std::result::Result<HttpFilterChainIr, SslConfigError> {
        let listener_ref = self.listener_ref();
        let parent_name = listener_ref.route_key();

        let mut routes_by_host = RoutesByHost::new();
        build_routes_per_host(&mut routes_by_host, self.routes, translator.route_translator, reporter);
        let vhosts = build_virtual_hosts(&parent_name, routes_by_host, |_| (AttachedPolicies::default(), Some(listener_ref.clone())));

        let tls = match translate_ssl_config(translator.queries, gateway_namespace, self.listener) {
            Ok(tls) => tls,
            Err(e) => {
                self.report_ssl_error(&listener_ref, &e, reporter);
                return Err(e);
            },
        };
        debug!(target: TARGET, "{} Built HTTPS filter chain {parent_name} with {} virtual hosts", translator.log_context, vhosts.len());

        Ok(HttpFilterChainIr {
            common: FilterChainCommon {
                name: parent_name,
                matcher: FilterChainMatch::sni(self.listener.hostname()),
                tls,
            },
            attached_policies: self.listener.attached_policies.clone(),
            vhosts,
        })
    }

    fn report_ssl_error(&self, listener_ref: &ListenerRef, error: &SslConfigError, reporter: &mut dyn Reporter) {
        let (reason, message) = error.condition();
        reporter.listener(listener_ref).set_condition(
            ListenerCondition::builder()
                .type_(ListenerConditionType::ResolvedRefs)
                .status(ConditionStatus::False)
                .reason(reason)
                .message(message.clone())
                .build(),
        );
        reporter.listener(listener_ref).set_condition(
            ListenerCondition::builder()
                .type_(ListenerConditionType::Programmed)
                .status(ConditionStatus::False)
                .reason(ListenerConditionReason::Invalid)
                .message(message)
                .build(),
        );
    }
}
