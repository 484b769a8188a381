mod in_memory;
mod routes;
#[cfg(test)]
mod test;

use std::sync::Arc;

pub use in_memory::{FromResourceKey, InMemoryQueries, ReferenceGrantRef, ToResourceKey};
use k8s_openapi::api::core::v1::Secret;
pub use routes::{ListenerResult, RoutesForGwResult};
use thiserror::Error;

use crate::{
    common::{BackendError, BackendResolver, CertificateRef, ParentReference, ResourceKey},
    reports::{ConditionStatus, Reporter, RouteCondition, RouteConditionReason, RouteConditionType},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("reference to {0} is not permitted by any ReferenceGrant")]
    MissingReferenceGrant(ResourceKey),
    #[error("{} {}/{} not found", .0.kind, .0.namespace, .0.name)]
    NotFound(ResourceKey),
    #[error("unsupported reference kind {0}")]
    UnsupportedKind(String),
}

/// Read access to the objects listener translation depends on.
pub trait GatewayQueries: BackendResolver {
    /// Fetches the secret a certificate reference points at. `from` is the
    /// referring object (group/kind) in `from_namespace`; cross-namespace
    /// references must be allowed by a ReferenceGrant.
    fn get_secret_for_ref(&self, from: &ResourceKey, from_namespace: &str, secret_ref: &CertificateRef) -> std::result::Result<Arc<Secret>, QueryError>;
}

/// Maps a backend resolution failure to a `ResolvedRefs=False` condition on
/// one route parent reference.
pub fn process_backend_error(error: &BackendError, route: &ResourceKey, parent_ref: &ParentReference, reporter: &mut dyn Reporter) {
    let reason = match error {
        BackendError::InvalidKind { .. } => RouteConditionReason::InvalidKind,
        BackendError::MissingReferenceGrant(_) => RouteConditionReason::RefNotPermitted,
        BackendError::NotFound(_) | BackendError::Invalid(..) => RouteConditionReason::BackendNotFound,
    };

    reporter.route(route, parent_ref).set_condition(
        RouteCondition::builder()
            .type_(RouteConditionType::ResolvedRefs)
            .status(ConditionStatus::False)
            .reason(reason)
            .message(error.to_string())
            .build(),
    );
}
