//! Status conditions produced while translating listeners.
//!
//! Translation never fails outright; every problem it finds ends up as a
//! condition on a listener or on a route parent reference. [`Reporter`] is
//! the sink, [`ReportMap`] the in-memory implementation status writers read
//! from.

#[cfg(test)]
mod test;

use std::{collections::BTreeMap, fmt::Display};

use k8s_openapi::{
    apimachinery::pkg::apis::meta::v1::{Condition, Time},
    chrono::Utc,
};
use typed_builder::TypedBuilder;

use crate::common::{ListenerRef, ParentReference, ResourceKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConditionStatus {
    True,
    False,
}

impl Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerConditionType {
    Accepted,
    Programmed,
    ResolvedRefs,
    Conflicted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerConditionReason {
    Accepted,
    Programmed,
    ResolvedRefs,
    NoConflicts,
    Invalid,
    InvalidCertificateRef,
    RefNotPermitted,
    UnsupportedProtocol,
    ProtocolConflict,
    HostnameConflict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteConditionType {
    Accepted,
    ResolvedRefs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteConditionReason {
    Accepted,
    ResolvedRefs,
    UnsupportedValue,
    InvalidKind,
    RefNotPermitted,
    BackendNotFound,
}

macro_rules! display_as_debug {
    ($($t:ty),*) => {
        $(impl Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{self:?}")
            }
        })*
    };
}

display_as_debug!(ListenerConditionType, ListenerConditionReason, RouteConditionType, RouteConditionReason);

#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct ListenerCondition {
    pub type_: ListenerConditionType,
    pub status: ConditionStatus,
    pub reason: ListenerConditionReason,
    #[builder(default, setter(into))]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct RouteCondition {
    pub type_: RouteConditionType,
    pub status: ConditionStatus,
    pub reason: RouteConditionReason,
    #[builder(default, setter(into))]
    pub message: String,
}

pub trait Reporter {
    /// Records a listener condition, replacing any earlier one of the same type.
    fn set_listener_condition(&mut self, listener: &ListenerRef, condition: ListenerCondition);
    /// Records a route condition for one parent reference of the route,
    /// replacing any earlier one of the same type.
    fn set_route_condition(&mut self, route: &ResourceKey, parent_ref: &ParentReference, condition: RouteCondition);
}

impl<'r> dyn Reporter + 'r {
    pub fn listener<'a>(&'a mut self, listener: &'a ListenerRef) -> ListenerReporter<'a, 'r> {
        ListenerReporter { reporter: self, listener }
    }

    pub fn route<'a>(&'a mut self, route: &'a ResourceKey, parent_ref: &'a ParentReference) -> ParentRefReporter<'a, 'r> {
        ParentRefReporter { reporter: self, route, parent_ref }
    }
}

pub struct ListenerReporter<'a, 'r> {
    reporter: &'a mut (dyn Reporter + 'r),
    listener: &'a ListenerRef,
}

impl ListenerReporter<'_, '_> {
    pub fn set_condition(&mut self, condition: ListenerCondition) {
        self.reporter.set_listener_condition(self.listener, condition);
    }
}

pub struct ParentRefReporter<'a, 'r> {
    reporter: &'a mut (dyn Reporter + 'r),
    route: &'a ResourceKey,
    parent_ref: &'a ParentReference,
}

impl ParentRefReporter<'_, '_> {
    pub fn set_condition(&mut self, condition: RouteCondition) {
        self.reporter.set_route_condition(self.route, self.parent_ref, condition);
    }
}

type RouteParentKey = (ResourceKey, ParentReference);

#[derive(Clone, Debug, Default)]
pub struct ReportMap {
    listeners: BTreeMap<ListenerRef, BTreeMap<ListenerConditionType, ListenerCondition>>,
    routes: BTreeMap<RouteParentKey, BTreeMap<RouteConditionType, RouteCondition>>,
}

impl Reporter for ReportMap {
    fn set_listener_condition(&mut self, listener: &ListenerRef, condition: ListenerCondition) {
        self.listeners.entry(listener.clone()).or_default().insert(condition.type_, condition);
    }

    fn set_route_condition(&mut self, route: &ResourceKey, parent_ref: &ParentReference, condition: RouteCondition) {
        self.routes.entry((route.clone(), parent_ref.clone())).or_default().insert(condition.type_, condition);
    }
}

impl ReportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_condition(&self, listener: &ListenerRef, type_: ListenerConditionType) -> Option<&ListenerCondition> {
        self.listeners.get(listener).and_then(|conditions| conditions.get(&type_))
    }

    pub fn listener_conditions(&self, listener: &ListenerRef) -> impl Iterator<Item = &ListenerCondition> {
        self.listeners.get(listener).into_iter().flat_map(BTreeMap::values)
    }

    pub fn route_condition(&self, route: &ResourceKey, parent_ref: &ParentReference, type_: RouteConditionType) -> Option<&RouteCondition> {
        self.routes.get(&(route.clone(), parent_ref.clone())).and_then(|conditions| conditions.get(&type_))
    }

    pub fn route_conditions(&self, route: &ResourceKey, parent_ref: &ParentReference) -> impl Iterator<Item = &RouteCondition> {
        self.routes.get(&(route.clone(), parent_ref.clone())).into_iter().flat_map(BTreeMap::values)
    }

    pub fn reported_listeners(&self) -> impl Iterator<Item = &ListenerRef> {
        self.listeners.keys()
    }

    pub fn reported_routes(&self) -> impl Iterator<Item = &RouteParentKey> {
        self.routes.keys()
    }

    /// Listener status conditions, with the positive defaults filled in for
    /// every type nobody reported on.
    pub fn listener_status(&self, listener: &ListenerRef, observed_generation: Option<i64>) -> Vec<Condition> {
        let mut conditions = listener_defaults();
        if let Some(reported) = self.listeners.get(listener) {
            for (type_, condition) in reported {
                conditions.insert(*type_, condition.clone());
            }
        }
        conditions
            .values()
            .map(|c| render(c.type_.to_string(), c.status, c.reason.to_string(), &c.message, observed_generation))
            .collect()
    }

    pub fn route_status(&self, route: &ResourceKey, parent_ref: &ParentReference, observed_generation: Option<i64>) -> Vec<Condition> {
        let mut conditions = route_defaults();
        if let Some(reported) = self.routes.get(&(route.clone(), parent_ref.clone())) {
            for (type_, condition) in reported {
                conditions.insert(*type_, condition.clone());
            }
        }
        conditions
            .values()
            .map(|c| render(c.type_.to_string(), c.status, c.reason.to_string(), &c.message, observed_generation))
            .collect()
    }
}

fn listener_defaults() -> BTreeMap<ListenerConditionType, ListenerCondition> {
    [
        (ListenerConditionType::Accepted, ConditionStatus::True, ListenerConditionReason::Accepted),
        (ListenerConditionType::Programmed, ConditionStatus::True, ListenerConditionReason::Programmed),
        (ListenerConditionType::ResolvedRefs, ConditionStatus::True, ListenerConditionReason::ResolvedRefs),
        (ListenerConditionType::Conflicted, ConditionStatus::False, ListenerConditionReason::NoConflicts),
    ]
    .into_iter()
    .map(|(type_, status, reason)| (type_, ListenerCondition::builder().type_(type_).status(status).reason(reason).build()))
    .collect()
}

fn route_defaults() -> BTreeMap<RouteConditionType, RouteCondition> {
    [
        (RouteConditionType::Accepted, RouteConditionReason::Accepted),
        (RouteConditionType::ResolvedRefs, RouteConditionReason::ResolvedRefs),
    ]
    .into_iter()
    .map(|(type_, reason)| (type_, RouteCondition::builder().type_(type_).status(ConditionStatus::True).reason(reason).build()))
    .collect()
}

fn render(type_: String, status: ConditionStatus, reason: String, message: &str, observed_generation: Option<i64>) -> Condition {
    Condition {
        last_transition_time: Time(Utc::now()),
        message: message.to_owned(),
        observed_generation,
        reason,
        status: status.to_string(),
        type_,
    }
}
