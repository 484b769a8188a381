use std::fmt::Display;

use gateway_api::apis::standard::gateways::{GatewayListeners, GatewayListenersTlsMode};
use thiserror::Error;
use typed_builder::TypedBuilder;

use super::{AttachedPolicies, ParentReference, ResourceKey, SECRET_KIND_NAME};

#[derive(Debug, Clone, PartialEq, PartialOrd, Hash, Eq, Ord)]
pub enum ProtocolType {
    Http,
    Https,
    Tcp,
    Tls,
    Udp,
    Unset,
    Other(String),
}

impl From<&str> for ProtocolType {
    fn from(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "HTTP" => Self::Http,
            "HTTPS" => Self::Https,
            "TCP" => Self::Tcp,
            "TLS" => Self::Tls,
            "UDP" => Self::Udp,
            "" => Self::Unset,
            _ => Self::Other(value.to_owned()),
        }
    }
}

impl Display for ProtocolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolType::Other(protocol) => write!(f, "{protocol}"),
            ProtocolType::Unset => write!(f, "<unset>"),
            _ => {
                let mut e = format! {"{self:?}"};
                e.make_ascii_uppercase();
                write!(f, "{e}")
            },
        }
    }
}

impl ProtocolType {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Http | Self::Https | Self::Tcp | Self::Tls)
    }

    /// Plaintext HTTP cannot share a port with anything terminating TLS or
    /// proxying raw TCP.
    pub fn is_compatible_with(&self, other: &ProtocolType) -> bool {
        (*self == ProtocolType::Http) == (*other == ProtocolType::Http)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlsMode {
    Terminate,
    Passthrough,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateRef {
    pub group: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

impl CertificateRef {
    pub fn secret(name: &str) -> Self {
        Self {
            group: String::new(),
            kind: SECRET_KIND_NAME.to_owned(),
            name: name.to_owned(),
            namespace: None,
        }
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_owned());
        self
    }

    pub fn resource_key(&self, default_namespace: &str) -> ResourceKey {
        ResourceKey {
            group: self.group.clone(),
            namespace: self.namespace.clone().unwrap_or(default_namespace.to_owned()),
            name: self.name.clone(),
            kind: self.kind.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerTlsConfig {
    pub mode: Option<TlsMode>,
    pub certificate_refs: Vec<CertificateRef>,
}

impl ListenerTlsConfig {
    pub fn terminate(certificate_refs: Vec<CertificateRef>) -> Self {
        Self { mode: Some(TlsMode::Terminate), certificate_refs }
    }

    pub fn passthrough() -> Self {
        Self { mode: Some(TlsMode::Passthrough), certificate_refs: vec![] }
    }
}

/// Identity of a listener: its parent (a Gateway or a ListenerSet) plus the
/// listener name inside that parent.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerRef {
    pub parent: ResourceKey,
    pub listener_name: String,
}

impl ListenerRef {
    pub fn new(parent: ResourceKey, listener_name: &str) -> Self {
        Self { parent, listener_name: listener_name.to_owned() }
    }

    /// Key used for route bookkeeping and HTTPS filter chain names.
    pub fn route_key(&self) -> String {
        if self.parent.is_gateway() {
            self.listener_name.clone()
        } else {
            format!("{}/{}/{}", self.parent.namespace, self.parent.name, self.listener_name)
        }
    }
}

impl Display for ListenerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.parent, self.listener_name)
    }
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct Listener {
    #[builder(setter(into))]
    pub name: String,
    pub protocol: ProtocolType,
    pub port: i32,
    #[builder(default, setter(strip_option, into))]
    pub hostname: Option<String>,
    #[builder(default, setter(strip_option))]
    pub tls: Option<ListenerTlsConfig>,
    #[builder(default)]
    pub attached_policies: AttachedPolicies,
    #[builder(default)]
    pub parent: ResourceKey,
    #[builder(default)]
    pub policy_ancestor_ref: ParentReference,
}

impl Listener {
    pub fn from_gateway_listener(gateway_listener: &GatewayListeners, parent: &ResourceKey) -> std::result::Result<Self, ListenerError> {
        let tls = gateway_listener
            .tls
            .as_ref()
            .map(|tls| {
                let mode = match tls.mode {
                    Some(GatewayListenersTlsMode::Terminate) => Some(TlsMode::Terminate),
                    Some(GatewayListenersTlsMode::Passthrough) => Some(TlsMode::Passthrough),
                    None => None,
                };
                let certificate_refs = tls
                    .certificate_refs
                    .as_ref()
                    .map(|refs| {
                        refs.iter()
                            .map(|r| CertificateRef {
                                group: r.group.clone().unwrap_or_default(),
                                kind: r.kind.clone().unwrap_or(SECRET_KIND_NAME.to_owned()),
                                name: r.name.clone(),
                                namespace: r.namespace.clone(),
                            })
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                ListenerTlsConfig { mode, certificate_refs }
            });

        if gateway_listener.name.is_empty() {
            return Err(ListenerError::MissingName(parent.clone()));
        }

        Ok(Self {
            name: gateway_listener.name.clone(),
            protocol: ProtocolType::from(gateway_listener.protocol.as_str()),
            port: gateway_listener.port,
            hostname: gateway_listener.hostname.clone(),
            tls,
            attached_policies: AttachedPolicies::default(),
            parent: parent.clone(),
            policy_ancestor_ref: ParentReference::from(parent),
        })
    }

    pub fn listener_ref(&self) -> ListenerRef {
        ListenerRef::new(self.parent.clone(), &self.name)
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ListenerError {
    #[error("unsupported protocol {0} on listener {1}")]
    UnsupportedProtocol(ProtocolType, String),
    #[error("port {0} of listener {1} is out of range")]
    InvalidPort(i32, String),
    #[error("listener of {0} has no name")]
    MissingName(ResourceKey),
}
