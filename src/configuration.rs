use serde::Deserialize;
use thiserror::Error;
use typed_builder::TypedBuilder;

const IPV6_ANY_ADDRESS: &str = "::";
const IPV4_ANY_ADDRESS: &str = "0.0.0.0";

#[derive(Clone, Debug, Default, PartialEq, Eq, TypedBuilder, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListenerTranslatorConfig {
    /// Bind listeners on the IPv6 any-address instead of the IPv4 one.
    #[builder(default)]
    pub listener_bind_ipv6: bool,
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("unable to parse listener translator configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ListenerTranslatorConfig {
    pub fn from_yaml(configuration: &str) -> std::result::Result<Self, ConfigurationError> {
        if configuration.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(configuration)?)
    }

    pub fn bind_address(&self) -> &'static str {
        if self.listener_bind_ipv6 {
            IPV6_ANY_ADDRESS
        } else {
            IPV4_ANY_ADDRESS
        }
    }
}
