use gateway_api::apis::standard::gateways::{Gateway as KubeGateway, GatewayListeners};
use kube::ResourceExt;
use thiserror::Error;
use tracing::warn;

use super::{Listener, ListenerError, ResourceKey, DEFAULT_GROUP_NAME, LISTENER_SET_KIND_NAME};

const TARGET: &str = "listener_translator::gateway";

#[derive(Error, Debug, PartialEq)]
pub enum GatewayError {
    #[error("gateway has no name")]
    MissingName,
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// A Gateway together with every listener attached to it, its own and
/// those contributed by ListenerSets, in declaration order.
#[derive(Clone, Debug)]
pub struct Gateway {
    resource_key: ResourceKey,
    generation: Option<i64>,
    listeners: Vec<Listener>,
}

impl PartialEq for Gateway {
    fn eq(&self, other: &Self) -> bool {
        self.resource_key == other.resource_key
    }
}

impl Gateway {
    pub fn new(resource_key: ResourceKey, listeners: Vec<Listener>) -> Self {
        Self { resource_key, generation: None, listeners }
    }

    pub fn name(&self) -> &str {
        &self.resource_key.name
    }

    pub fn namespace(&self) -> &str {
        &self.resource_key.namespace
    }

    pub fn key(&self) -> &ResourceKey {
        &self.resource_key
    }

    pub fn generation(&self) -> Option<i64> {
        self.generation
    }

    pub fn listeners(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.iter()
    }

    pub fn listener(&self, parent: &ResourceKey, name: &str) -> Option<&Listener> {
        self.listeners.iter().find(|l| &l.parent == parent && l.name == name)
    }

    /// Appends listeners contributed by a ListenerSet attached to this gateway.
    pub fn add_listener_set(&mut self, name: &str, namespace: &str, listeners: &[GatewayListeners]) -> std::result::Result<(), GatewayError> {
        let parent = ResourceKey::namespaced(name, namespace).with_kind(DEFAULT_GROUP_NAME, LISTENER_SET_KIND_NAME);
        for gateway_listener in listeners {
            self.listeners.push(Listener::from_gateway_listener(gateway_listener, &parent)?);
        }
        Ok(())
    }
}

impl TryFrom<&KubeGateway> for Gateway {
    type Error = GatewayError;

    fn try_from(gateway: &KubeGateway) -> std::result::Result<Self, Self::Error> {
        if gateway.metadata.name.is_none() {
            return Err(GatewayError::MissingName);
        }
        let resource_key = ResourceKey::from(gateway);
        let mut listeners = Vec::with_capacity(gateway.spec.listeners.len());
        for gateway_listener in &gateway.spec.listeners {
            match Listener::from_gateway_listener(gateway_listener, &resource_key) {
                Ok(listener) => listeners.push(listener),
                Err(e) => {
                    warn!(target: TARGET, "Skipping listener on gateway {} {e}", gateway.name_any());
                },
            }
        }

        Ok(Self {
            resource_key,
            generation: gateway.metadata.generation,
            listeners,
        })
    }
}
