//! Port reconciler.
//!
//! [`reconcile`] is the pure half: given a desired and a current port set it
//! says what to open and what to close. The client drives it through
//! `opened-ports`, `open-port` and `close-port`, so the net effect goes
//! through the same validation as a single call.
//!
//! # Invariants
//!
//! - Applying a plan to `current` yields exactly `desired`
//! - Plans are sorted by key, never by set iteration order
//! - Opening an open port and closing a closed one are no-ops

use std::collections::{BTreeMap, BTreeSet};

use hooksim_proto::{Port, Protocol};
use serde_json::Value;

use crate::{dispatch::Request, error::HookError, state::Snapshot};

/// Changes needed to move from the current port set to the desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortPlan {
    /// Ports to open, sorted by key.
    pub open: Vec<Port>,
    /// Ports to close, sorted by key.
    pub close: Vec<Port>,
}

impl PortPlan {
    /// Whether the sets already agree.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.close.is_empty()
    }
}

/// Diff `desired` against `current`, keyed by `<port>/<protocol>`.
pub fn reconcile<'a>(
    desired: impl IntoIterator<Item = &'a Port>,
    current: impl IntoIterator<Item = &'a Port>,
) -> PortPlan {
    let desired: BTreeMap<String, Port> = desired.into_iter().map(|p| (p.key(), *p)).collect();
    let current: BTreeMap<String, Port> = current.into_iter().map(|p| (p.key(), *p)).collect();

    PortPlan {
        open: desired.iter().filter(|(k, _)| !current.contains_key(*k)).map(|(_, p)| *p).collect(),
        close: current.iter().filter(|(k, _)| !desired.contains_key(*k)).map(|(_, p)| *p).collect(),
    }
}

/// Decode the single port token of `open-port` / `close-port`.
///
/// ICMP is refused here: the individual tools only handle numbered ports.
fn port_arg(req: &Request<'_>) -> Result<Port, HookError> {
    let token = req.first().ok_or_else(|| req.malformed("port required"))?;
    let port: Port = token.parse().map_err(|e| req.protocol(e))?;
    if port.protocol == Protocol::Icmp {
        return Err(req.malformed(format!("protocol must be tcp or udp, got {token:?}")));
    }
    Ok(port)
}

/// `open-port <port>[/<protocol>]`
pub(crate) fn open_port(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let port = port_arg(req)?;
    snapshot.ports.insert(port);
    Ok(Value::Null)
}

/// `close-port <port>[/<protocol>]`
pub(crate) fn close_port(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let port = port_arg(req)?;
    snapshot.ports.remove(&port);
    Ok(Value::Null)
}

/// `opened-ports`
pub(crate) fn opened_ports(snapshot: &mut Snapshot, _req: &Request<'_>) -> Result<Value, HookError> {
    Ok(snapshot.ports.iter().map(|p| Value::String(p.key())).collect())
}

/// Apply a plan to a port set.
pub fn apply(plan: &PortPlan, ports: &mut BTreeSet<Port>) {
    for port in &plan.close {
        ports.remove(port);
    }
    ports.extend(plan.open.iter().copied());
}

#[cfg(test)]
mod tests {
    use hooksim_proto::HookCommand;
    use proptest::prelude::*;

    use super::*;
    use crate::{
        dispatch::{Dispatcher, DispatcherConfig},
        error::ErrorKind,
        testing::MapEnv,
    };

    fn port() -> impl Strategy<Value = Port> {
        prop_oneof![
            (0u16..=1024).prop_map(Port::tcp),
            (0u16..=1024).prop_map(Port::udp),
            Just(Port::icmp()),
        ]
    }

    #[test]
    fn plan_is_sorted_difference() {
        let desired = [Port::tcp(443), Port::tcp(80)];
        let current = [Port::udp(81), Port::tcp(80)];

        let plan = reconcile(&desired, &current);

        assert_eq!(plan.open, vec![Port::tcp(443)]);
        assert_eq!(plan.close, vec![Port::udp(81)]);
        assert!(reconcile(&desired, &desired).is_empty());
    }

    #[test]
    fn tools_validate_and_are_idempotent() {
        fn run(d: &mut Dispatcher<MapEnv>, command: HookCommand, token: &str) -> Result<Vec<u8>, HookError> {
            d.dispatch(command, &[token.to_string()])
        }
        let mut d = Dispatcher::new(Snapshot::default(), MapEnv::default(), DispatcherConfig::default());

        run(&mut d, HookCommand::OpenPort, "80/tcp").unwrap();
        run(&mut d, HookCommand::OpenPort, "80").unwrap();
        run(&mut d, HookCommand::ClosePort, "53/udp").unwrap();
        assert_eq!(d.snapshot().ports, BTreeSet::from([Port::tcp(80)]));

        for bad in ["icmp", "70000/tcp", "80/sctp", "+80/tcp"] {
            let err = run(&mut d, HookCommand::OpenPort, bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedArguments, "{bad}");
        }
        assert_eq!(d.snapshot().ports, BTreeSet::from([Port::tcp(80)]));

        let listed = d.dispatch(HookCommand::OpenedPorts, &[]).unwrap();
        assert_eq!(listed, b"80/tcp\n");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_plan_reaches_desired(
            desired in prop::collection::btree_set(port(), 0..8),
            current in prop::collection::btree_set(port(), 0..8),
        ) {
            let plan = reconcile(&desired, &current);
            let mut ports = current.clone();
            apply(&plan, &mut ports);

            prop_assert_eq!(&ports, &desired);
            prop_assert!(reconcile(&desired, &ports).is_empty());
        }
    }
}
