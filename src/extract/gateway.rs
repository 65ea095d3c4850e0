//! Gateway event catalogs and per-event payload aliases.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::{Renamer, column_index, constantify, typeify};
use crate::document::{Document, parse_inline};
use crate::extract::reference;
use crate::ir::{Alias, GatewaySection, GatewayValue};

static CATALOG_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(send|receive) events").unwrap());
static RECEIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)receive").unwrap());

static ANY_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\n)#+\s+").unwrap());
static INNER_PAYLOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(The inner payload is|Inner payload is)\b").unwrap());

/// Send/receive catalogs. Receive entries point at `<Name>Event` types.
pub fn sections(doc: &Document, renamer: Renamer<'_>) -> Vec<GatewaySection> {
    doc.headings()
        .filter(|(_, h)| CATALOG_HEADING.is_match(&h.text))
        .filter_map(|(ix, h)| {
            let table = doc.table_for(ix)?;
            let header = table.header_texts();
            let name_ix = column_index(&["name", "event", "command"], &header).unwrap_or(0);
            let desc_ix = column_index(&["description"], &header).unwrap_or(1);
            let suffix = if RECEIVE.is_match(&h.text) { "Event" } else { "" };
            let values: Vec<GatewayValue> = table
                .rows
                .iter()
                .filter_map(|row| {
                    let name = row.get(name_ix)?.text.trim();
                    let ty = typeify(name, true);
                    if ty.is_empty() {
                        return None;
                    }
                    Some(GatewayValue {
                        name: constantify(name),
                        ty: renamer.rename(&format!("{ty}{suffix}")),
                        description: row.get(desc_ix).map(|c| c.text.clone()).unwrap_or_default(),
                    })
                })
                .collect();
            (!values.is_empty()).then(|| GatewaySection { identifier: renamer.type_name(&h.text), values })
        })
        .collect()
}

/// `<Heading>Event` aliases for every section whose prose names its inner payload.
pub fn event_aliases(doc: &Document, renamer: Renamer<'_>) -> Vec<Alias> {
    let markdown = doc.markdown.replace("\r\n", "\n");
    ANY_HEADING
        .split(&markdown)
        .skip(1)
        .filter_map(|section| {
            let heading = section.lines().next()?.trim();
            let intro = INNER_PAYLOAD.find(section)?;
            // the link has to sit in the same paragraph as the phrase
            let rest = &section[intro.start()..];
            let paragraph = rest.split("\n\n").next().unwrap_or(rest);
            let link = parse_inline(paragraph).links.into_iter().next()?;
            let payload = reference::from_link(&link, renamer, true)?;
            Some(Alias {
                identifier: renamer.type_name(&format!("{heading} Event")),
                nullable: false,
                types: vec![payload],
                combinator: None,
                array: None,
            })
        })
        .collect()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    const EVENTS: &str = "\
## Receive Events

| Name | Description |
|---|---|
| [Ready](#DOCS_TOPICS_GATEWAY_EVENTS/ready) | Contains the initial state information |
| [Guild Create](#DOCS_TOPICS_GATEWAY_EVENTS/guild-create) | Lazy-load for unavailable guild |

## Send Events

| Name | Description |
|---|---|
| [Identify](#DOCS_TOPICS_GATEWAY_EVENTS/identify) | Triggers the initial handshake |

#### Guild Role Create

Sent when a guild role is created.

The inner payload is a [role](#DOCS_TOPICS_PERMISSIONS/role-object) object.

#### Guild Delete

Sent when a guild becomes unavailable.

Inner payload is an
[unavailable guild](#DOCS_RESOURCES_GUILD/unavailable-guild-object).

#### Typing Start

No payload sentence here, but a [link](#DOCS_RESOURCES_CHANNEL/channel-object).
";

    #[test]
    fn catalogs_distinguish_receive_from_send() {
        let config = Config::default();
        let doc = Document::parse("topics/Gateway_Events.md", EVENTS);
        let out = sections(&doc, Renamer::new(&config, &doc.path));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].identifier, "ReceiveEvent");
        let receive: Vec<_> = out[0].values.iter().map(|v| (v.name.as_str(), v.ty.as_str())).collect();
        assert_eq!(receive, vec![("READY", "ReadyEvent"), ("GUILD_CREATE", "GuildCreateEvent")]);
        assert_eq!(out[1].identifier, "SendEvent");
        assert_eq!(out[1].values[0].ty, "Identify");
        assert_eq!(out[1].values[0].description, "Triggers the initial handshake");
    }

    #[test]
    fn inner_payload_phrase_yields_alias() {
        let config = Config::default();
        let doc = Document::parse("topics/Gateway_Events.md", EVENTS);
        let aliases = event_aliases(&doc, Renamer::new(&config, &doc.path));
        let pairs: Vec<_> = aliases.iter().map(|a| (a.identifier.as_str(), a.types[0].as_str())).collect();
        assert_eq!(pairs, vec![
            ("GuildRoleCreateEvent", "Role"),
            ("GuildDeleteEvent", "UnavailableGuild"),
        ]);
        assert!(aliases.iter().all(|a| a.combinator.is_none() && !a.nullable));
    }
}
