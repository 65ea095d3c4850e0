//! Cross-document reduction: `PartialIr[]` → `Ir`.
//!
//! Order matters and is fixed: seeds first, then documents in the order they
//! were handed in (sorted relative path). Within every collection the first
//! definition of an identifier wins. A later definition that differs is
//! dropped with a warning naming both files.
use std::collections::HashSet;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::{debug, warn};

use crate::config::Config;
use crate::extract::PartialIr;
use crate::ir::{
    Alias, Combinator, Endpoint, EndpointParams, Enum, Flags, GatewaySection, Ir, Structure, is_primitive,
};

/// Origin label for entities that come from the config instead of a document.
pub const SEED_SOURCE: &str = "<seed>";
/// Origin label for structures and aliases synthesized from endpoint sections.
pub const ENDPOINT_SOURCE: &str = "<endpoint>";

/// An entity together with the file it was extracted from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<'a, T> {
    pub source: &'a str,
    pub item: T,
}

impl<'a, T> Sourced<'a, T> {
    pub fn new(source: &'a str, item: T) -> Self {
        Self { source, item }
    }
}

// ----- Dedup -----

/// First-wins dedup keyed by `key`, preserving first-seen order.
pub fn dedup_first<'a, T, I>(kind: &str, items: I, key: impl Fn(&T) -> &str) -> Vec<T>
where
    T: PartialEq,
    I: IntoIterator<Item = Sourced<'a, T>>,
{
    let mut kept: IndexMap<String, Sourced<'a, T>> = IndexMap::new();
    for next in items {
        match kept.entry(key(&next.item).to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(next);
            }
            Entry::Occupied(slot) => {
                let first = slot.get();
                if first.item == next.item {
                    debug!(kind, identifier = slot.key().as_str(), dropped = next.source, "duplicate definition");
                } else {
                    warn!(
                        kind,
                        identifier = slot.key().as_str(),
                        kept = first.source,
                        dropped = next.source,
                        "conflicting definitions; keeping the first"
                    );
                }
            }
        }
    }
    kept.into_values().map(|s| s.item).collect()
}

// ----- Endpoint aliases -----

fn is_alias(endpoint: &Endpoint) -> bool {
    endpoint.response.as_ref().is_some_and(|r| r.alias)
}

/// Walk alias pointers from `start` to a concrete endpoint. `None` on a miss or a cycle.
fn follow<'e>(by_route: &IndexMap<&'e str, &'e Endpoint>, start: &'e Endpoint) -> Option<&'e Endpoint> {
    let mut seen: HashSet<&str> = HashSet::from([start.route.as_str()]);
    let mut current = start;
    while let Some(response) = current.response.as_ref().filter(|r| r.alias) {
        let target = by_route.get(response.identifier.as_str()).copied()?;
        if !seen.insert(target.route.as_str()) {
            return None;
        }
        current = target;
    }
    Some(current)
}

/// Replace every "functions the same as" endpoint by a copy carrying the
/// target's params and response. Chains are followed; a missing target or a
/// cycle drops the endpoint.
pub fn resolve_endpoint_aliases<'a>(endpoints: Vec<Sourced<'a, Endpoint>>) -> Vec<Sourced<'a, Endpoint>> {
    let mut by_route: IndexMap<&str, &Endpoint> = IndexMap::new();
    for e in &endpoints {
        by_route.entry(e.item.route.as_str()).or_insert(&e.item);
    }

    let mut out = Vec::with_capacity(endpoints.len());
    for e in &endpoints {
        if !is_alias(&e.item) {
            out.push(e.clone());
            continue;
        }
        match follow(&by_route, &e.item) {
            Some(target) => {
                let resolved = Endpoint {
                    params: target.params.clone(),
                    response: target.response.clone(),
                    ..e.item.clone()
                };
                out.push(Sourced::new(e.source, resolved));
            }
            None => debug!(route = %e.item.route, file = e.source, "unresolved endpoint alias dropped"),
        }
    }
    out
}

/// Or-alias over the structures of a params/response set with more than one member.
fn or_alias(params: &EndpointParams) -> Option<Alias> {
    if params.alias || params.structures.len() < 2 {
        return None;
    }
    Some(Alias {
        identifier: params.identifier.clone(),
        nullable: false,
        types: params.structures.iter().map(|s| s.identifier.clone()).collect(),
        combinator: Some(Combinator::Or),
        array: Some(params.array),
    })
}

fn endpoint_parts(endpoint: &Endpoint) -> impl Iterator<Item = &EndpointParams> {
    endpoint.params.iter().chain(endpoint.response.iter())
}

// ----- Merge -----

/// Reduce per-document results into one IR.
pub fn merge_all(config: &Config, partials: &[PartialIr]) -> Ir {
    let endpoints = partials
        .iter()
        .flat_map(|p| p.endpoints.iter().map(|e| Sourced::new(p.path.as_str(), e.clone())));
    let endpoints = resolve_endpoint_aliases(endpoints.collect());
    let endpoints = dedup_first("endpoint", endpoints, |e: &Endpoint| e.route.as_str());

    let structures = config
        .seed_structures
        .iter()
        .map(|s| Sourced::new(SEED_SOURCE, s.clone()))
        .chain(partials.iter().flat_map(|p| {
            p.structures.iter().map(|s| Sourced::new(p.path.as_str(), s.clone()))
        }))
        .chain(endpoints.iter().flat_map(|e| {
            endpoint_parts(e)
                .flat_map(|p| p.structures.iter())
                .map(|s| Sourced::new(ENDPOINT_SOURCE, s.clone()))
        }))
        .filter(|s| !config.is_blacklisted(&s.item.identifier) && !s.item.fields.is_empty());
    let structures = dedup_first("structure", structures, |s: &Structure| s.identifier.as_str());

    let enums = partials
        .iter()
        .flat_map(|p| p.enums.iter().map(|e| Sourced::new(p.path.as_str(), e.clone())))
        .filter(|e| !config.is_blacklisted(&e.item.identifier));
    let enums = dedup_first("enum", enums, |e: &Enum| e.identifier.as_str());

    let flags = partials
        .iter()
        .flat_map(|p| p.flags.iter().map(|f| Sourced::new(p.path.as_str(), f.clone())))
        .filter(|f| !config.is_blacklisted(&f.item.identifier));
    let flags = dedup_first("flags", flags, |f: &Flags| f.identifier.as_str());

    let gateway = partials
        .iter()
        .flat_map(|p| p.gateway.iter().map(|g| Sourced::new(p.path.as_str(), g.clone())));
    let gateway = dedup_first("gateway section", gateway, |g: &GatewaySection| g.identifier.as_str());

    let aliases = config
        .seed_aliases
        .iter()
        .map(|a| Sourced::new(SEED_SOURCE, a.clone()))
        .chain(partials.iter().flat_map(|p| {
            p.aliases.iter().map(|a| Sourced::new(p.path.as_str(), a.clone()))
        }))
        .chain(endpoints.iter().flat_map(|e| {
            endpoint_parts(e)
                .filter_map(or_alias)
                .map(|a| Sourced::new(ENDPOINT_SOURCE, a))
        }))
        .filter(|a| !config.is_alias_blacklisted(&a.item.identifier));
    let aliases = dedup_first("alias", aliases, |a: &Alias| a.identifier.as_str());

    let ir = Ir {
        structures,
        enums,
        flags,
        endpoints,
        gateway,
        aliases,
        id_maps: config.id_maps.clone(),
    };
    for (owner, target) in dangling_references(&ir) {
        debug!(owner, target, "field type names no extracted entity");
    }
    ir
}

/// `(structure, type)` pairs whose field type is neither a primitive nor an
/// entity defined anywhere in `ir`.
pub fn dangling_references(ir: &Ir) -> Vec<(&str, &str)> {
    let known = ir
        .structures
        .iter()
        .map(|s| s.identifier.as_str())
        .chain(ir.enums.iter().map(|e| e.identifier.as_str()))
        .chain(ir.flags.iter().map(|f| f.identifier.as_str()))
        .chain(ir.aliases.iter().map(|a| a.identifier.as_str()))
        .collect::<HashSet<_>>();
    ir.structures
        .iter()
        .flat_map(|s| s.fields.iter().map(move |f| (s.identifier.as_str(), f.ty.identifier.as_str())))
        .filter(|(_, target)| !is_primitive(target) && !known.contains(target))
        .collect()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, Method, TypeDescriptor};

    fn structure(id: &str, fields: &[&str]) -> Structure {
        Structure {
            identifier: id.into(),
            fields: fields
                .iter()
                .map(|name| Field {
                    name: (*name).into(),
                    optional: false,
                    ty: TypeDescriptor::named("string"),
                    description: String::new(),
                })
                .collect(),
        }
    }

    fn endpoint(route: &str, response: Option<EndpointParams>) -> Endpoint {
        Endpoint {
            route: route.into(),
            description: None,
            method: Method::Post,
            url: format!("/{route}"),
            params: None,
            response,
        }
    }

    fn alias_to(route: &str) -> Option<EndpointParams> {
        Some(EndpointParams { identifier: route.into(), array: false, structures: vec![], alias: true })
    }

    #[test]
    fn first_definition_wins_in_file_order() {
        let a = PartialIr { path: "a.md".into(), structures: vec![structure("User", &["id"])], ..Default::default() };
        let b = PartialIr { path: "b.md".into(), structures: vec![structure("User", &["name"])], ..Default::default() };
        let ir = merge_all(&Config::empty(), &[a.clone(), b.clone()]);
        assert_eq!(ir.structures, vec![structure("User", &["id"])]);
        let ir = merge_all(&Config::empty(), &[b, a]);
        assert_eq!(ir.structures, vec![structure("User", &["name"])]);
    }

    #[test]
    fn blacklisted_and_empty_structures_are_dropped() {
        let mut config = Config::empty();
        config.blacklist = vec!["GatewayPayload".into()];
        let p = PartialIr {
            path: "a.md".into(),
            structures: vec![structure("GatewayPayload", &["op"]), structure("Empty", &[]), structure("Kept", &["x"])],
            ..Default::default()
        };
        let ids: Vec<_> = merge_all(&config, &[p]).structures.into_iter().map(|s| s.identifier).collect();
        assert_eq!(ids, vec!["Kept"]);
    }

    #[test]
    fn seeds_precede_documents() {
        let mut config = Config::empty();
        config.seed_structures = vec![structure("ActionRow", &["type"])];
        let p = PartialIr { path: "a.md".into(), structures: vec![structure("ActionRow", &["other"])], ..Default::default() };
        assert_eq!(merge_all(&config, &[p]).structures, vec![structure("ActionRow", &["type"])]);
    }

    #[test]
    fn alias_endpoint_takes_target_shape_and_keeps_its_own_route() {
        let target_response = EndpointParams::reference("Message", false);
        let target = Endpoint {
            params: Some(EndpointParams {
                identifier: "ExecuteWebhookParams".into(),
                array: false,
                structures: vec![structure("ExecuteWebhookParams", &["content"])],
                alias: false,
            }),
            ..endpoint("executeWebhook", Some(target_response.clone()))
        };
        let follow = endpoint("createFollowupMessage", alias_to("executeWebhook"));
        let p = PartialIr { path: "a.md".into(), endpoints: vec![follow, target.clone()], ..Default::default() };
        let ir = merge_all(&Config::empty(), &[p]);
        assert_eq!(ir.endpoints.len(), 2);
        let resolved = &ir.endpoints[0];
        assert_eq!(resolved.route, "createFollowupMessage");
        assert_eq!(resolved.url, "/createFollowupMessage");
        assert_eq!(resolved.response, Some(target_response));
        assert_eq!(resolved.params, target.params);
        assert_eq!(ir.structures.len(), 1);
    }

    #[test]
    fn unresolvable_aliases_are_dropped() {
        let p = PartialIr {
            path: "a.md".into(),
            endpoints: vec![
                endpoint("orphan", alias_to("missing")),
                endpoint("ping", alias_to("pong")),
                endpoint("pong", alias_to("ping")),
            ],
            ..Default::default()
        };
        assert!(merge_all(&Config::empty(), &[p]).endpoints.is_empty());
    }

    #[test]
    fn alias_chains_are_followed() {
        let p = PartialIr {
            path: "a.md".into(),
            endpoints: vec![
                endpoint("a", alias_to("b")),
                endpoint("b", alias_to("c")),
                endpoint("c", Some(EndpointParams::reference("Thing", true))),
            ],
            ..Default::default()
        };
        let ir = merge_all(&Config::empty(), &[p]);
        assert!(ir.endpoints.iter().all(|e| e.response == Some(EndpointParams::reference("Thing", true))));
    }

    #[test]
    fn several_structures_produce_an_or_alias() {
        let params = EndpointParams {
            identifier: "CreateMessageParams".into(),
            array: false,
            structures: vec![structure("CreateMessageBodyParams", &["a"]), structure("CreateMessagePollParams", &["b"])],
            alias: false,
        };
        let e = Endpoint { params: Some(params), ..endpoint("createMessage", None) };
        let p = PartialIr { path: "a.md".into(), endpoints: vec![e], ..Default::default() };
        let ir = merge_all(&Config::empty(), &[p]);
        assert_eq!(ir.aliases, vec![Alias {
            identifier: "CreateMessageParams".into(),
            nullable: false,
            types: vec!["CreateMessageBodyParams".into(), "CreateMessagePollParams".into()],
            combinator: Some(Combinator::Or),
            array: Some(false),
        }]);
        assert_eq!(ir.structures.len(), 2);
    }

    #[test]
    fn alias_blacklist_filters_aliases() {
        let mut config = Config::empty();
        config.alias_blacklist = vec!["HelloEvent".into()];
        let alias = |id: &str| Alias { identifier: id.into(), nullable: false, types: vec!["X".into()], combinator: None, array: None };
        let p = PartialIr { path: "a.md".into(), aliases: vec![alias("HelloEvent"), alias("ReadyEvent")], ..Default::default() };
        let ids: Vec<_> = merge_all(&config, &[p]).aliases.into_iter().map(|a| a.identifier).collect();
        assert_eq!(ids, vec!["ReadyEvent"]);
    }

    #[test]
    fn endpoints_dedup_by_route() {
        let a = PartialIr { path: "a.md".into(), endpoints: vec![endpoint("getUser", None)], ..Default::default() };
        let b = PartialIr { path: "b.md".into(), endpoints: vec![endpoint("getUser", None)], ..Default::default() };
        assert_eq!(merge_all(&Config::empty(), &[a, b]).endpoints.len(), 1);
    }

    #[test]
    fn dangling_references_skip_primitives_and_known_entities() {
        let mut channel = structure("Channel", &["id", "owner", "kind", "recipients"]);
        channel.fields[0].ty = TypeDescriptor::named("snowflake");
        channel.fields[1].ty = TypeDescriptor::named("User");
        channel.fields[2].ty = TypeDescriptor::named("ChannelType");
        channel.fields[3].ty = TypeDescriptor::array_of("Recipient");
        let ir = Ir {
            structures: vec![channel, structure("User", &["username"])],
            enums: vec![Enum { identifier: "ChannelType".into(), values: vec![] }],
            ..Default::default()
        };
        assert_eq!(dangling_references(&ir), vec![("Channel", "Recipient")]);
    }
}
