use std::collections::BTreeMap;

use tracing::debug;

use super::TARGET;
use crate::{
    common::{Gateway, Listener, ListenerRef, ProtocolType},
    reports::{ConditionStatus, ListenerCondition, ListenerConditionReason, ListenerConditionType, Reporter},
};

/// Listeners already accepted on one port.
#[derive(Default)]
struct PortListeners<'a> {
    protocol: Option<&'a ProtocolType>,
    listeners: Vec<&'a Listener>,
}

impl PortListeners<'_> {
    fn has_hostname_conflict(&self, listener: &Listener) -> bool {
        self.listeners.iter().any(|other| other.protocol == listener.protocol && other.hostname == listener.hostname)
    }
}

/// Drops listeners that cannot be served and reports why. Listeners are
/// checked in declaration order, so on a conflict the earlier listener
/// stays. Listeners without a protocol are passed through untouched.
pub fn validate_gateway<'a>(gateway: &'a Gateway, reporter: &mut dyn Reporter) -> Vec<&'a Listener> {
    let mut ports: BTreeMap<i32, PortListeners<'a>> = BTreeMap::new();
    let mut valid = vec![];

    for listener in gateway.listeners() {
        let listener_ref = listener.listener_ref();
        if listener.protocol == ProtocolType::Unset {
            valid.push(listener);
            continue;
        }

        if !listener.protocol.is_supported() {
            debug!(target: TARGET, "Listener {listener_ref} has unsupported protocol {}", listener.protocol);
            reporter.listener(&listener_ref).set_condition(
                ListenerCondition::builder()
                    .type_(ListenerConditionType::Accepted)
                    .status(ConditionStatus::False)
                    .reason(ListenerConditionReason::UnsupportedProtocol)
                    .message(format!("Protocol {} is not supported", listener.protocol))
                    .build(),
            );
            continue;
        }

        let port = ports.entry(listener.port).or_default();
        let conflict = match port.protocol {
            Some(protocol) if !protocol.is_compatible_with(&listener.protocol) => Some((
                ListenerConditionReason::ProtocolConflict,
                format!("Protocol {} conflicts with {protocol} on port {}", listener.protocol, listener.port),
            )),
            _ if port.has_hostname_conflict(listener) => Some((
                ListenerConditionReason::HostnameConflict,
                format!("Hostname {} is already used on port {}", listener.hostname().unwrap_or("<none>"), listener.port),
            )),
            _ => None,
        };

        if let Some((reason, message)) = conflict {
            debug!(target: TARGET, "Listener {listener_ref} conflicts {message}");
            report_conflict(&listener_ref, reason, &message, reporter);
            continue;
        }

        port.protocol.get_or_insert(&listener.protocol);
        port.listeners.push(listener);
        valid.push(listener);
    }

    valid
}

fn report_conflict(listener_ref: &ListenerRef, reason: ListenerConditionReason, message: &str, reporter: &mut dyn Reporter) {
    reporter.listener(listener_ref).set_condition(
        ListenerCondition::builder()
            .type_(ListenerConditionType::Conflicted)
            .status(ConditionStatus::True)
            .reason(reason)
            .message(message)
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
