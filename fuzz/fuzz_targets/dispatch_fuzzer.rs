//! Fuzz target for the hook tool dispatcher
//!
//! Drives one dispatcher with a sequence of calls mixing known tool names,
//! unknown names and arbitrary argument lists, against a seed with a
//! relation, a peer relation and a secret.
//!
//! # Invariants
//!
//! - Dispatch never panics, whatever the arguments
//! - Every call lands in the history, in order, known tool or not
//! - Output requested as JSON always parses as JSON
//! - An action tool outside an action always fails with `NotInActionContext`
//! - The snapshot still passes validation after every call

#![no_main]

use arbitrary::Arbitrary;
use hooksim_core::{
    CommandRunner, Dispatcher, DispatcherConfig, ErrorKind, PeerRelation, Relation, Secret,
    Snapshot, bag, env,
};
use hooksim_harness::SimEnv;
use hooksim_proto::{FORMAT_JSON, Format, HookArgs, HookCommand};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: u64,
    leader: bool,
    in_action: bool,
    calls: Vec<Call>,
}

#[derive(Debug, Arbitrary)]
struct Call {
    tool: Tool,
    args: Vec<ArgToken>,
    json: bool,
}

#[derive(Debug, Arbitrary)]
enum Tool {
    Known(u8),
    Unknown(String),
}

#[derive(Debug, Arbitrary)]
enum ArgToken {
    RelationId(bool),
    Unit(u8),
    Pair(String, String),
    Label(String),
    Flag(String),
    Raw(String),
}

impl ArgToken {
    fn render(&self) -> String {
        match self {
            Self::RelationId(peer) => {
                format!("--relation={}", if *peer { "cluster:1" } else { "db:0" })
            },
            Self::Unit(n) => format!("postgresql/{}", n % 3),
            Self::Pair(k, v) => format!("{k}={v}"),
            Self::Label(l) => format!("--label={l}"),
            Self::Flag(f) => format!("--{f}"),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

fn seed(leader: bool) -> Snapshot {
    Snapshot {
        leader,
        app_name: "fuzz".into(),
        unit_id: "fuzz/0".into(),
        relations: vec![
            Relation::new("db", "db:0")
                .with_remote_app("postgresql")
                .with_remote_unit("postgresql/0", bag([("host", "10.0.0.1")])),
        ],
        peer_relations: vec![
            PeerRelation::new("cluster", "cluster:1").with_peer("fuzz/1", bag([("ready", "yes")])),
        ],
        secrets: vec![Secret::new("secret:d0fuzz0000000000000a").with_label("tls")],
        ..Snapshot::default()
    }
}

fuzz_target!(|scenario: Scenario| {
    let mut sim = SimEnv::new().with_var(env::UNIT_NAME, "fuzz/0");
    if scenario.in_action {
        sim.set_var(env::ACTION_NAME, "fuzz");
    } else {
        sim.set_var(env::HOOK_NAME, "update-status");
    }

    let config = DispatcherConfig { seed: scenario.seed };
    let mut dispatcher = Dispatcher::new(seed(scenario.leader), sim, config);

    for (index, call) in scenario.calls.iter().take(64).enumerate() {
        let name = match &call.tool {
            Tool::Known(n) => {
                HookCommand::ALL[usize::from(*n) % HookCommand::ALL.len()].name().to_string()
            },
            Tool::Unknown(name) => name.clone(),
        };
        let mut args: Vec<String> = call.args.iter().map(ArgToken::render).collect();
        if call.json {
            args.push(FORMAT_JSON.to_string());
        }

        let result = dispatcher.run(&name, &args);

        assert_eq!(dispatcher.history().len(), index + 1);
        assert_eq!(dispatcher.history()[index].name, name);

        let command = name.parse::<HookCommand>().ok();
        if let Some(command) = command
            && command.requires_action()
            && !scenario.in_action
        {
            let kind = result.as_ref().err().map(|e| e.kind());
            assert_eq!(kind, Some(ErrorKind::NotInActionContext));
        }
        if command.is_none() {
            assert_eq!(result.as_ref().err().map(|e| e.kind()), Some(ErrorKind::UnknownCommand));
        }

        // Raw tokens may override or swallow our marker; trust the decoder.
        let json = HookArgs::parse(&args).is_ok_and(|decoded| decoded.format() == Format::Json);
        if let Ok(output) = &result
            && json
        {
            assert!(serde_json::from_slice::<serde_json::Value>(output).is_ok());
        }

        assert!(dispatcher.snapshot().validate().is_ok());
    }
});
