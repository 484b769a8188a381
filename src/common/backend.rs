use serde::Serialize;
use thiserror::Error;

use super::ResourceKey;

pub const SERVICE_KIND_NAME: &str = "Service";
const DEFAULT_BACKEND_WEIGHT: u32 = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unknown backend kind {kind} for {name}")]
    InvalidKind { kind: String, name: String },
    #[error("backend {0} is not permitted by any ReferenceGrant")]
    MissingReferenceGrant(ResourceKey),
    #[error("backend {0} not found")]
    NotFound(ResourceKey),
    #[error("backend {0} is invalid: {1}")]
    Invalid(ResourceKey, String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackendObject {
    #[serde(serialize_with = "serialize_key")]
    pub key: ResourceKey,
    pub port: Option<i32>,
}

impl BackendObject {
    pub fn cluster_name(&self) -> String {
        match self.port {
            Some(port) => format!("{}.{}:{port}", self.key.name, self.key.namespace),
            None => format!("{}.{}", self.key.name, self.key.namespace),
        }
    }
}

/// A route backend reference after resolution. Unresolved references keep
/// their slot so traffic to them fails rather than silently vanishing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackendRefIr {
    pub cluster_name: String,
    pub weight: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendObject>,
    #[serde(skip)]
    pub error: Option<BackendError>,
}

impl BackendRefIr {
    pub fn resolved(backend: BackendObject, weight: Option<i32>) -> Self {
        Self {
            cluster_name: backend.cluster_name(),
            weight: Self::weight(weight),
            backend: Some(backend),
            error: None,
        }
    }

    pub fn failed(cluster_name: String, weight: Option<i32>, error: BackendError) -> Self {
        Self {
            cluster_name,
            weight: Self::weight(weight),
            backend: None,
            error: Some(error),
        }
    }

    /// The error to report for this backend, if any. A backend that carries
    /// no object and no error is reported as not found.
    pub fn resolution_error(&self) -> Option<BackendError> {
        match (&self.error, &self.backend) {
            (Some(error), _) => Some(error.clone()),
            (None, None) => Some(BackendError::NotFound(ResourceKey::new(&self.cluster_name).with_kind("", SERVICE_KIND_NAME))),
            (None, Some(_)) => None,
        }
    }

    fn weight(weight: Option<i32>) -> u32 {
        weight.and_then(|w| u32::try_from(w).ok()).unwrap_or(DEFAULT_BACKEND_WEIGHT)
    }
}

fn serialize_key<S: serde::Serializer>(key: &ResourceKey, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&key.to_string())
}
