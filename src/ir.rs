//! Output of listener translation, consumed by the proxy configuration
//! generator.

use serde::{Serialize, Serializer};

use crate::common::{AttachedPolicies, BackendRefIr, HttpRouteMatchIr, ListenerRef, ParentReference};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerIr {
    pub name: String,
    pub bind_address: String,
    pub bind_port: u32,
    pub attached_policies: AttachedPolicies,
    pub policy_ancestor_ref: ParentReference,
    pub http_filter_chain: Vec<HttpFilterChainIr>,
    pub tcp: Vec<TcpIr>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChainMatch {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sni_domains: Vec<String>,
}

impl FilterChainMatch {
    /// SNI match on the listener hostname; matches everything when the
    /// listener has none.
    pub fn sni(hostname: Option<&str>) -> Self {
        Self { sni_domains: hostname.map(|h| vec![h.to_owned()]).unwrap_or_default() }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsBundle {
    #[serde(serialize_with = "serialize_redacted")]
    pub private_key: Vec<u8>,
    #[serde(serialize_with = "serialize_pem")]
    pub cert_chain: Vec<u8>,
    #[serde(serialize_with = "serialize_pem", skip_serializing_if = "Vec::is_empty")]
    pub ca: Vec<u8>,
}

impl std::fmt::Debug for TlsBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsBundle")
            .field("private_key", &"<redacted>")
            .field("cert_chain", &String::from_utf8_lossy(&self.cert_chain))
            .field("ca", &String::from_utf8_lossy(&self.ca))
            .finish()
    }
}

fn serialize_pem<S: Serializer>(pem: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(pem))
}

fn serialize_redacted<S: Serializer>(_: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str("<redacted>")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChainCommon {
    pub name: String,
    pub matcher: FilterChainMatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsBundle>,
}

/// One HTTP route rule match, ready to be ordered inside a virtual host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRouteRuleMatchIr {
    pub name: String,
    pub parent_ref: ParentReference,
    #[serde(rename = "match")]
    pub matcher: HttpRouteMatchIr,
    pub backends: Vec<BackendRefIr>,
    pub attached_policies: AttachedPolicies,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHost {
    pub name: String,
    pub hostname: String,
    pub rules: Vec<HttpRouteRuleMatchIr>,
    pub attached_policies: AttachedPolicies,
    /// Listener the policies were taken from.
    #[serde(skip)]
    pub parent_listener: Option<ListenerRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpFilterChainIr {
    #[serde(flatten)]
    pub common: FilterChainCommon,
    pub attached_policies: AttachedPolicies,
    pub vhosts: Vec<VirtualHost>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpIr {
    #[serde(flatten)]
    pub common: FilterChainCommon,
    pub backends: Vec<BackendRefIr>,
}
