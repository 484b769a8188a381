use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use gateway_api::apis::standard::referencegrants::{ReferenceGrant, ReferenceGrantFrom, ReferenceGrantTo};
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::ResourceExt;
use tracing::debug;
use typed_builder::TypedBuilder;

use super::{GatewayQueries, QueryError};
use crate::common::{
    BackendError, BackendObject, BackendReference, BackendResolver, CertificateRef, ResourceKey, DEFAULT_NAMESPACE_NAME, SECRET_KIND_NAME,
    SERVICE_KIND_NAME,
};

const TARGET: &str = "listener_translator::query";

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, TypedBuilder)]
pub struct ReferenceGrantRef {
    from: FromResourceKey,
    to: ToResourceKey,
    namespace: String,
}

impl ReferenceGrantRef {
    fn permits(&self, from: &FromResourceKey, to: &ResourceKey) -> bool {
        self.namespace == to.namespace
            && &self.from == from
            && self.to.group == to.group
            && self.to.kind == to.kind
            && self.to.name.as_ref().map_or(true, |name| name == &to.name)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FromResourceKey {
    pub group: String,
    pub namespace: String,
    pub kind: String,
}

impl From<&ResourceKey> for FromResourceKey {
    fn from(rk: &ResourceKey) -> Self {
        Self {
            group: rk.group.clone(),
            namespace: rk.namespace.clone(),
            kind: rk.kind.clone(),
        }
    }
}

impl From<&ReferenceGrantFrom> for FromResourceKey {
    fn from(rk: &ReferenceGrantFrom) -> Self {
        Self {
            group: rk.group.clone(),
            namespace: rk.namespace.clone(),
            kind: rk.kind.clone(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ToResourceKey {
    pub group: String,
    pub name: Option<String>,
    pub kind: String,
}

impl From<&ReferenceGrantTo> for ToResourceKey {
    fn from(rk: &ReferenceGrantTo) -> Self {
        Self {
            group: rk.group.clone(),
            name: rk.name.clone().filter(|name| !name.is_empty()),
            kind: rk.kind.clone(),
        }
    }
}

/// Snapshot of secrets, services and ReferenceGrants answering translator
/// queries without an API server.
#[derive(Clone, Debug, Default)]
pub struct InMemoryQueries {
    secrets: BTreeMap<ResourceKey, Arc<Secret>>,
    services: BTreeSet<ResourceKey>,
    reference_grants: BTreeSet<ReferenceGrantRef>,
}

impl InMemoryQueries {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.add_secret(secret);
        self
    }

    #[must_use]
    pub fn with_service(mut self, service: &Service) -> Self {
        self.add_service(service);
        self
    }

    #[must_use]
    pub fn with_reference_grant(mut self, grant: &ReferenceGrant) -> Self {
        self.add_reference_grant(grant);
        self
    }

    pub fn add_secret(&mut self, secret: Secret) {
        let key = ResourceKey::from(&secret);
        self.secrets.insert(key, Arc::new(secret));
    }

    pub fn add_service(&mut self, service: &Service) {
        let namespace = service.namespace().unwrap_or(DEFAULT_NAMESPACE_NAME.to_owned());
        self.services.insert(ResourceKey::namespaced(&service.name_any(), &namespace).with_kind("", SERVICE_KIND_NAME));
    }

    pub fn add_reference_grant(&mut self, grant: &ReferenceGrant) {
        let namespace = grant.namespace().unwrap_or(DEFAULT_NAMESPACE_NAME.to_owned());
        for from in &grant.spec.from {
            for to in &grant.spec.to {
                self.reference_grants.insert(ReferenceGrantRef::builder().namespace(namespace.clone()).from(from.into()).to(to.into()).build());
            }
        }
    }

    /// Same-namespace references are always allowed, anything else needs a
    /// ReferenceGrant in the target namespace.
    pub fn is_allowed(&self, from: &ResourceKey, to: &ResourceKey) -> bool {
        if from.namespace == to.namespace {
            return true;
        }
        let from = FromResourceKey::from(from);
        let allowed = self.reference_grants.iter().any(|grant| grant.permits(&from, to));
        debug!(target: TARGET, "Checking reference {from:?} -> {to:?} {allowed}");
        allowed
    }
}

impl GatewayQueries for InMemoryQueries {
    fn get_secret_for_ref(&self, from: &ResourceKey, from_namespace: &str, secret_ref: &CertificateRef) -> std::result::Result<Arc<Secret>, QueryError> {
        if !secret_ref.group.is_empty() || secret_ref.kind != SECRET_KIND_NAME {
            return Err(QueryError::UnsupportedKind(secret_ref.kind.clone()));
        }

        let to = secret_ref.resource_key(from_namespace);
        let from = ResourceKey {
            namespace: from_namespace.to_owned(),
            ..from.clone()
        };
        if !self.is_allowed(&from, &to) {
            return Err(QueryError::MissingReferenceGrant(to));
        }

        self.secrets.get(&to).map(Arc::clone).ok_or(QueryError::NotFound(to))
    }
}

impl BackendResolver for InMemoryQueries {
    fn resolve_backend(&self, from: &ResourceKey, reference: &BackendReference) -> std::result::Result<BackendObject, BackendError> {
        if !reference.group.is_empty() || reference.kind != SERVICE_KIND_NAME {
            return Err(BackendError::InvalidKind {
                kind: reference.kind.clone(),
                name: reference.name.clone(),
            });
        }

        let key = reference.resource_key();
        if !self.is_allowed(from, &key) {
            return Err(BackendError::MissingReferenceGrant(key));
        }

        if self.services.contains(&key) {
            Ok(BackendObject { key, port: reference.port })
        } else {
            Err(BackendError::NotFound(key))
        }
    }
}
