//! Relation model.
//!
//! Regular relations connect this application to a remote one: the local
//! unit sees its own bags plus the remote application bag and one bag per
//! remote unit. Peer relations connect units of the same application: every
//! participant is a peer and the application bag is shared.
//!
//! # Invariants
//!
//! - Writing the application bag requires leadership; a refused write leaves
//!   the bag exactly as it was, including unset
//! - Unit enumeration is sorted by unit id
//! - An unset local unit bag is reported, never papered over with an empty
//!   one

use serde_json::{Map, Value, json};

use crate::{
    dispatch::Request,
    error::HookError,
    state::{DataBag, PeerRelation, Relation, Snapshot},
};

/// Relation resolved by id.
enum Resolved<'a> {
    Regular(&'a Relation),
    Peer(&'a PeerRelation),
}

fn resolve<'a>(
    snapshot: &'a Snapshot,
    req: &Request<'_>,
    id: &str,
) -> Result<Resolved<'a>, HookError> {
    if let Some(relation) = snapshot.relations.iter().find(|r| r.id == id) {
        return Ok(Resolved::Regular(relation));
    }
    snapshot
        .peer_relations
        .iter()
        .find(|r| r.id == id)
        .map(Resolved::Peer)
        .ok_or_else(|| req.not_found(format!("relation {id}")))
}

/// Local application and unit bags of a relation, for writing.
fn local_bags_mut<'a>(
    snapshot: &'a mut Snapshot,
    id: &str,
) -> Option<(&'a mut Option<DataBag>, &'a mut Option<DataBag>)> {
    if let Some(relation) = snapshot.relations.iter_mut().find(|r| r.id == id) {
        return Some((&mut relation.local_app_data, &mut relation.local_unit_data));
    }
    snapshot
        .peer_relations
        .iter_mut()
        .find(|r| r.id == id)
        .map(|r| (&mut r.local_app_data, &mut r.local_unit_data))
}

fn bag_value(bag: &DataBag) -> Value {
    Value::Object(bag.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect())
}

/// `relation-ids <endpoint>`
pub(crate) fn relation_ids(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let endpoint = req
        .first()
        .filter(|endpoint| !endpoint.is_empty())
        .ok_or_else(|| req.malformed("no endpoint name specified"))?;

    Ok(snapshot
        .relations
        .iter()
        .filter(|r| r.endpoint == endpoint)
        .map(|r| Value::String(r.id.clone()))
        .collect())
}

/// `relation-get [-r <id>] [--app] <key|-> [<unit|app>]`
pub(crate) fn relation_get(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let id = req.relation_id()?;
    let app = req.args.flag("app");
    let mut tokens = req.args.bare();
    let key = tokens.next().unwrap_or("-");
    let target = match tokens.next() {
        Some(token) => Some(token.to_string()),
        None if app => req.env.remote_app(),
        None => req.env.remote_unit(),
    }
    .ok_or_else(|| req.malformed("no unit or application specified"))?;

    let relation = resolve(snapshot, req, &id)?;
    let local = target == snapshot.unit_id || target == snapshot.app_name;
    let bag = match (relation, app) {
        (Resolved::Regular(r), true) if local => r.local_app_data.clone().unwrap_or_default(),
        (Resolved::Regular(r), true) => r.remote_app_data.clone(),
        (Resolved::Peer(r), true) => r.local_app_data.clone().unwrap_or_default(),
        (Resolved::Regular(r), false) if target == snapshot.unit_id => r
            .local_unit_data
            .clone()
            .ok_or_else(|| req.not_found(format!("local unit data in relation {id}")))?,
        (Resolved::Peer(r), false) if target == snapshot.unit_id => r
            .local_unit_data
            .clone()
            .ok_or_else(|| req.not_found(format!("local unit data in relation {id}")))?,
        (Resolved::Regular(r), false) => r
            .remote_units_data
            .get(&target)
            .cloned()
            .ok_or_else(|| req.not_found(format!("unit {target} in relation {id}")))?,
        (Resolved::Peer(r), false) => r
            .peers_data
            .get(&target)
            .cloned()
            .ok_or_else(|| req.not_found(format!("unit {target} in relation {id}")))?,
    };

    Ok(match key {
        "-" => bag_value(&bag),
        key => bag.get(key).map_or(Value::Null, |value| Value::String(value.clone())),
    })
}

/// `relation-list [-r <id>] [--app]`
pub(crate) fn relation_list(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let id = req.relation_id()?;
    let app = req.args.flag("app");

    Ok(match resolve(snapshot, req, &id)? {
        Resolved::Regular(r) if app => Value::String(r.remote_app_name.clone()),
        Resolved::Peer(_) if app => Value::String(snapshot.app_name.clone()),
        Resolved::Regular(r) => r.remote_units_data.keys().cloned().map(Value::String).collect(),
        Resolved::Peer(r) => r.peers_data.keys().cloned().map(Value::String).collect(),
    })
}

/// `relation-set [-r <id>] [--app] key=value...`
///
/// An empty value deletes the key. With no pairs the bags are not touched.
pub(crate) fn relation_set(snapshot: &mut Snapshot, req: &Request<'_>) -> Result<Value, HookError> {
    let id = req.relation_id()?;
    if let Some(token) = req.args.bare().next() {
        return Err(req.malformed(format!("expected key=value, got {token:?}")));
    }
    let pairs = req.pairs()?;
    let app = req.args.flag("app");
    let leader = snapshot.leader;

    let (app_bag, unit_bag) =
        local_bags_mut(snapshot, &id).ok_or_else(|| req.not_found(format!("relation {id}")))?;
    if app && !leader {
        return Err(req.denied("only the leader can set application data"));
    }

    if pairs.is_empty() {
        return Ok(Value::Null);
    }

    let bag = if app { app_bag } else { unit_bag }.get_or_insert_with(DataBag::new);
    for (key, value) in pairs {
        if value.is_empty() {
            bag.remove(&key);
        } else {
            bag.insert(key, value);
        }
    }
    Ok(Value::Null)
}

/// `relation-model-get [-r <id>]`
pub(crate) fn relation_model_get(
    snapshot: &mut Snapshot,
    req: &Request<'_>,
) -> Result<Value, HookError> {
    let id = req.relation_id()?;
    let uuid = match resolve(snapshot, req, &id)? {
        Resolved::Regular(Relation { remote_model_uuid: Some(uuid), .. }) => uuid.clone(),
        _ => req.env.model_uuid().unwrap_or_default(),
    };

    Ok(json!({ "uuid": uuid }))
}

/// `goal-state`
///
/// Everything the simulation knows about is assumed to be where it should
/// be: units are `active`, remote applications `joined`.
pub(crate) fn goal_state(snapshot: &mut Snapshot, _req: &Request<'_>) -> Result<Value, HookError> {
    let mut units = Map::new();
    units.insert(snapshot.unit_id.clone(), json!({ "status": "active" }));
    for peer in snapshot.peer_relations.iter().flat_map(|r| r.peers_data.keys()) {
        units.insert(peer.clone(), json!({ "status": "active" }));
    }

    let mut relations = Map::new();
    for relation in &snapshot.relations {
        let entry = relations
            .entry(relation.endpoint.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(endpoint) = entry {
            endpoint.insert(relation.remote_app_name.clone(), json!({ "status": "joined" }));
            for unit in relation.remote_units_data.keys() {
                endpoint.insert(unit.clone(), json!({ "status": "active" }));
            }
        }
    }

    Ok(json!({ "units": units, "relations": relations }))
}
