//! `resource-get`.

use serde_json::Value;

use crate::{dispatch::Request, error::HookError, state::Snapshot};

/// `resource-get <name>`
///
/// Returns the seeded path. When the charm descriptor can be read, the
/// resource must also be declared there.
pub(crate) fn resource_get(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let name = req.first().ok_or_else(|| req.malformed("resource name required"))?;

    if let Ok(metadata) = req.env.metadata()
        && !metadata.declares_resource(name)
    {
        return Err(req.not_found(format!("resource {name}")));
    }

    snapshot
        .resources
        .get(name)
        .map(|path| Value::String(path.clone()))
        .ok_or_else(|| req.not_found(format!("resource {name}")))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use hooksim_proto::HookCommand;

    use super::*;
    use crate::{
        dispatch::{Dispatcher, DispatcherConfig},
        env::CHARM_DIR,
        error::ErrorKind,
        testing::MapEnv,
    };

    fn snapshot() -> Snapshot {
        Snapshot {
            resources: BTreeMap::from([
                ("model".to_string(), "/resources/model.bin".to_string()),
                ("stale".to_string(), "/resources/stale.bin".to_string()),
            ]),
            ..Snapshot::default()
        }
    }

    #[test]
    fn seeded_path_without_metadata() {
        let mut d = Dispatcher::new(snapshot(), MapEnv::default(), DispatcherConfig::default());

        assert_eq!(d.dispatch(HookCommand::ResourceGet, &["model".into()]).unwrap(), b"/resources/model.bin\n");
        let err = d.dispatch(HookCommand::ResourceGet, &["other".into()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn metadata_must_declare_resource() {
        let env = MapEnv::new([(CHARM_DIR, "/charm")])
            .with_file("/charm/metadata.yaml", "name: ml\nresources:\n  model:\n    type: file\n");
        let mut d = Dispatcher::new(snapshot(), env, DispatcherConfig::default());

        d.dispatch(HookCommand::ResourceGet, &["model".into()]).unwrap();
        let err = d.dispatch(HookCommand::ResourceGet, &["stale".into()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
