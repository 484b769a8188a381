use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PolicyRef {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
}

/// Policies attached to an object, grouped by policy group/kind. The
/// translator never looks inside; it only decides which object's policies
/// flow into which output element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttachedPolicies(BTreeMap<String, Vec<PolicyRef>>);

impl AttachedPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, policy: PolicyRef) {
        let group_kind = format!("{}/{}", policy.group, policy.kind);
        self.0.entry(group_kind).or_default().push(policy);
    }

    pub fn with(mut self, policy: PolicyRef) -> Self {
        self.attach(policy);
        self
    }

    /// Adds every policy of `other` after the ones already attached.
    pub fn extend(&mut self, other: &AttachedPolicies) {
        for (group_kind, policies) in &other.0 {
            self.0.entry(group_kind.clone()).or_default().extend(policies.iter().cloned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn policies(&self, group_kind: &str) -> &[PolicyRef] {
        self.0.get(group_kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<PolicyRef>)> {
        self.0.iter()
    }
}
