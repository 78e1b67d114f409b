//! Secret store.
//!
//! Secrets live in [`Snapshot::secrets`], in creation order. Lookup goes by
//! label when `--label=` is given, otherwise by id. Ids are accepted as
//! `secret:<xid>`, bare `<xid>`, or `secret://<model-uuid>/<xid>`.
//!
//! # Visibility
//!
//! The leader sees every secret. Any other unit sees only secrets it owns
//! (`owner == unit`). A hidden secret and an absent one produce the same
//! error, message included, so ownership never leaks through a failure.
//!
//! Leader gating is not uniform across tools. `secret-get` and
//! `secret-info-get` fail on a hidden secret and `secret-grant` fails for any
//! non-leader, while `secret-set` and `secret-remove` quietly do nothing for
//! one. `secret-revoke` never mutates.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    dispatch::Request,
    error::HookError,
    state::{RotatePolicy, Secret, SecretOwner, Snapshot},
};

const XID_ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";
const XID_LEN: usize = 20;

/// Deterministic source of secret ids.
///
/// The same seed yields the same sequence of ids, so a test can predict the
/// id a charm will be handed.
#[derive(Debug, Clone)]
pub struct SecretIdGenerator {
    rng: ChaCha8Rng,
}

impl SecretIdGenerator {
    /// Generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Next id, `secret:` followed by 20 characters of `[0-9a-v]`.
    pub fn next_id(&mut self) -> String {
        let xid: String = (0..XID_LEN)
            .map(|_| char::from(XID_ALPHABET[(self.rng.next_u32() % 32) as usize]))
            .collect();
        format!("secret:{xid}")
    }
}

/// Strip any `secret:` or `secret://<model>/` prefix, leaving the xid.
pub fn normalize_id(id: &str) -> &str {
    if let Some(rest) = id.strip_prefix("secret://") {
        return rest.rsplit_once('/').map_or(rest, |(_, xid)| xid);
    }
    id.strip_prefix("secret:").unwrap_or(id)
}

/// Whether two ids name the same secret, whatever form each is written in.
pub fn id_matches(a: &str, b: &str) -> bool {
    normalize_id(a) == normalize_id(b)
}

/// Metadata reported by `secret-info-get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretInfo {
    /// Revision. The simulation keeps a single revision.
    pub revision: u32,
    /// Label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Owning scope.
    pub owner: SecretOwner,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rotation schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<RotatePolicy>,
    /// Expiry timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

impl From<&Secret> for SecretInfo {
    fn from(secret: &Secret) -> Self {
        Self {
            revision: 1,
            label: secret.label.clone(),
            owner: secret.owner,
            description: secret.description.clone(),
            rotation: secret.rotate,
            expiry: secret.expire.clone(),
        }
    }
}

fn visible(snapshot: &Snapshot, secret: &Secret) -> bool {
    snapshot.leader || secret.owner == SecretOwner::Unit
}

/// Resolve by `--label=` first, then by the first positional id.
fn lookup<'a>(snapshot: &'a Snapshot, req: &Request<'_>) -> Result<&'a Secret, HookError> {
    let (query, found) = match req.args.option("label") {
        Some(label) => {
            let found = snapshot
                .secrets
                .iter()
                .find(|s| visible(snapshot, s) && s.label.as_deref() == Some(label));
            (label, found)
        },
        None => {
            let id = req.first().ok_or_else(|| req.malformed("secret id or label required"))?;
            let found =
                snapshot.secrets.iter().find(|s| visible(snapshot, s) && id_matches(&s.id, id));
            (id, found)
        },
    };
    found.ok_or_else(|| req.not_found(format!("secret {query}")))
}

fn parse_owner(req: &Request<'_>) -> Result<Option<SecretOwner>, HookError> {
    req.args
        .option("owner")
        .map(|value| {
            SecretOwner::parse(value).ok_or_else(|| req.malformed(format!("invalid owner {value:?}")))
        })
        .transpose()
}

fn parse_rotate(req: &Request<'_>) -> Result<Option<RotatePolicy>, HookError> {
    req.args
        .option("rotate")
        .map(|value| {
            RotatePolicy::parse(value)
                .ok_or_else(|| req.malformed(format!("invalid rotate policy {value:?}")))
        })
        .transpose()
}

/// `secret-add key=value... [--owner=] [--label=] [--description=] [--rotate=] [--expire=]`
pub(crate) fn secret_add(
    snapshot: &mut Snapshot,
    req: &Request<'_>,
    ids: &mut SecretIdGenerator,
) -> Result<Value, HookError> {
    let content = req.pairs()?;
    if content.is_empty() {
        return Err(req.malformed("secret content required"));
    }
    let owner = parse_owner(req)?.unwrap_or_default();
    let rotate = parse_rotate(req)?;
    if owner != SecretOwner::Unit && !snapshot.leader {
        return Err(req.denied("only the leader can add application secrets"));
    }

    let id = loop {
        let id = ids.next_id();
        if !snapshot.secrets.iter().any(|s| id_matches(&s.id, &id)) {
            break id;
        }
    };
    snapshot.secrets.push(Secret {
        id: id.clone(),
        label: req.args.option("label").map(str::to_string),
        owner,
        description: req.args.option("description").map(str::to_string),
        rotate,
        expire: req.args.option("expire").map(str::to_string),
        content,
    });

    Ok(Value::String(id))
}

/// `secret-get <id> | --label=<label> [--peek] [--refresh]`
pub(crate) fn secret_get(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let secret = lookup(snapshot, req)?;

    Ok(Value::Object(
        secret.content.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect(),
    ))
}

/// `secret-info-get <id> | --label=<label>`
pub(crate) fn secret_info_get(
    snapshot: &mut Snapshot,
    req: &Request<'_>,
) -> Result<Value, HookError> {
    let secret = lookup(snapshot, req)?;
    let info = serde_json::to_value(SecretInfo::from(secret))
        .map_err(|e| HookError::Encoding { command: req.command, detail: e.to_string() })?;

    let mut out = Map::new();
    out.insert(secret.id.clone(), info);
    Ok(Value::Object(out))
}

/// `secret-ids`
///
/// `null` when the store is empty, otherwise the visible ids, possibly none.
pub(crate) fn secret_ids(snapshot: &mut Snapshot, _req: &Request<'_>) -> Result<Value, HookError> {
    if snapshot.secrets.is_empty() {
        return Ok(Value::Null);
    }

    Ok(snapshot
        .secrets
        .iter()
        .filter(|s| visible(snapshot, s))
        .map(|s| Value::String(s.id.clone()))
        .collect())
}

/// `secret-set <id> [key=value...] [--owner=] [--label=] [--description=] [--rotate=] [--expire=]`
///
/// Content, when given, replaces the old content wholesale. Metadata flags
/// overlay; anything not given is left alone.
pub(crate) fn secret_set(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    if !snapshot.leader {
        return Ok(Value::Null);
    }
    let id = req.first().ok_or_else(|| req.malformed("secret id required"))?;
    let owner = parse_owner(req)?;
    let rotate = parse_rotate(req)?;

    let secret = snapshot
        .secrets
        .iter_mut()
        .find(|s| id_matches(&s.id, id))
        .ok_or_else(|| req.not_found(format!("secret {id}")))?;

    let content = req.pairs()?;
    if !content.is_empty() {
        secret.content = content;
    }
    if let Some(owner) = owner {
        secret.owner = owner;
    }
    if let Some(rotate) = rotate {
        secret.rotate = Some(rotate);
    }
    if let Some(label) = req.args.option("label") {
        secret.label = Some(label.to_string());
    }
    if let Some(description) = req.args.option("description") {
        secret.description = Some(description.to_string());
    }
    if let Some(expire) = req.args.option("expire") {
        secret.expire = Some(expire.to_string());
    }

    Ok(Value::Null)
}

/// `secret-grant <id> --relation=<id> [--unit=<unit>]`
///
/// Grants are not modelled beyond validation.
pub(crate) fn secret_grant(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let id = req.first().ok_or_else(|| req.malformed("secret id required"))?;
    let relation_id = req
        .args
        .option("relation")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| req.malformed("--relation is required"))?;

    if !snapshot.leader || !snapshot.secrets.iter().any(|s| id_matches(&s.id, id)) {
        return Err(req.not_found(format!("secret {id}")));
    }

    let remote_units: Vec<&String> = match snapshot.relations.iter().find(|r| r.id == relation_id) {
        Some(relation) => relation.remote_units_data.keys().collect(),
        None => match snapshot.peer_relations.iter().find(|r| r.id == relation_id) {
            Some(relation) => relation.peers_data.keys().collect(),
            None => return Err(req.not_found(format!("relation {relation_id}"))),
        },
    };
    if let Some(unit) = req.args.option("unit")
        && !remote_units.iter().any(|u| u.as_str() == unit)
    {
        return Err(req.not_found(format!("unit {unit} in relation {relation_id}")));
    }

    Ok(Value::Null)
}

/// `secret-remove <id> | --label=<fragment>`
///
/// Removes the first secret whose id matches or whose label contains the
/// fragment. The fragment must be non-empty.
pub(crate) fn secret_remove(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    if !snapshot.leader {
        return Ok(Value::Null);
    }
    let id = req.first();
    let label = req.args.option("label");
    if id.is_none() && label.is_none() {
        return Err(req.malformed("secret id or label required"));
    }
    if label == Some("") {
        return Err(req.malformed("empty label fragment"));
    }

    let index = snapshot
        .secrets
        .iter()
        .position(|s| {
            id.is_some_and(|id| id_matches(&s.id, id))
                || label.is_some_and(|fragment| {
                    s.label.as_deref().is_some_and(|l| l.contains(fragment))
                })
        })
        .ok_or_else(|| req.not_found(format!("secret {}", id.or(label).unwrap_or_default())))?;
    snapshot.secrets.remove(index);

    Ok(Value::Null)
}

/// `secret-revoke`: accepted and ignored.
pub(crate) fn secret_revoke(_snapshot: &mut Snapshot, _req: &Request<'_>) -> Result<Value, HookError> {
    Ok(Value::Null)
}
