//! `## Title % METHOD /url` sections → `Endpoint`.
//!
//! Params and responses prefer field tables inside the section. Without one
//! they fall back to the first linked sentence of the right shape, and a
//! response may instead point at another route ("functions the same as").
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::common::{Renamer, camelify, typeify};
use crate::document::{Document, parse_inline};
use crate::extract::{reference, structures};
use crate::extract::structures::{ARRAY_WORD, Filter};
use crate::ir::{Endpoint, EndpointParams, Method, Structure};

static SECTION_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\n)##\s+").unwrap());
static ENDPOINT_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*) % (get|post|put|patch|delete) (.*)$").unwrap());
static URL_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(.*?)\}").unwrap());
static NON_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z]").unwrap());

static PARAMS_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)params").unwrap());
static RESPONSE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)response").unwrap());
// The endpoint's own h2 spans the whole section; never let it bind a table.
static BODY_EXCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%|query\s*string").unwrap());
static QUERY_EXCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%|json").unwrap());
static RESPONSE_EXCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%").unwrap());

static PARAM_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(json|form|query\s*string|params?)\b").unwrap());
static RESPONSE_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(response|structure|body|object|json)\b").unwrap());

static TAKES_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Takes a.*?\.|Body is.*?\.").unwrap());
static RETURNS_SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\breturns .*?\.|\bresponses? includes? .*?\.|\bbody is an? .*?\.").unwrap()
});
static SAME_AS_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)functions the same as .*?\.").unwrap());

/// Every endpoint section of `doc`, in document order.
pub fn from_document(doc: &Document, renamer: Renamer<'_>) -> Vec<Endpoint> {
    let markdown = doc.markdown.replace("\r\n", "\n");
    SECTION_SPLIT
        .split(&markdown)
        .skip(1)
        .filter_map(|section| from_section(doc, renamer, section))
        .collect()
}

fn from_section(doc: &Document, renamer: Renamer<'_>, section: &str) -> Option<Endpoint> {
    let heading = section.lines().next()?.trim();
    let Some(caps) = ENDPOINT_HEADING.captures(heading) else {
        debug!(file = %doc.path, heading, "not an endpoint heading");
        return None;
    };
    let method = Method::parse(&caps[2])?;
    let route = renamer.rename(&camelify(caps[1].trim()));
    let url = normalize_url(caps[3].trim());

    let section_doc = Document::parse(doc.path.clone(), format!("## {section}"));
    let description = section_doc
        .paragraph_after(0)
        .map(|p| p.text.clone())
        .filter(|text| !text.is_empty());
    let prose = section.replace('\n', " ");

    Some(Endpoint {
        params: params(&section_doc, &prose, renamer, &route, method.has_body()),
        response: response(&section_doc, &prose, renamer, &route),
        route,
        description,
        method,
        url,
    })
}

/// `{channel.id#DOCS_RESOURCES_CHANNEL/channel-object}` → `{channel_id}`.
pub fn normalize_url(raw: &str) -> String {
    URL_PLACEHOLDER
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            let name = caps[1].split('#').next().unwrap_or_default();
            format!("{{{}}}", NON_LETTER.replace_all(name, "_"))
        })
        .into_owned()
}

/// Field tables under headings matching `include`, renamed by `name`.
fn table_structures(
    section: &Document,
    renamer: Renamer<'_>,
    filter: Filter<'_>,
    name: impl Fn(&str) -> String,
) -> Vec<Structure> {
    structures::tables(section, filter)
        .into_iter()
        .map(|(heading, table)| Structure {
            identifier: name(&heading.text),
            fields: structures::fields(renamer, table),
        })
        .collect()
}

fn from_structures(identifier: String, structures: Vec<Structure>) -> EndpointParams {
    EndpointParams { identifier, array: false, structures, alias: false }
}

/// Reference from the first link of a prose sentence.
fn sentence_reference(sentence: &str, renamer: Renamer<'_>) -> Option<EndpointParams> {
    let inline = parse_inline(sentence);
    let id = reference::from_link(inline.first_link()?, renamer, true)?;
    Some(EndpointParams::reference(id, ARRAY_WORD.is_match(&inline.text)))
}

fn params(
    section: &Document,
    prose: &str,
    renamer: Renamer<'_>,
    route: &str,
    has_body: bool,
) -> Option<EndpointParams> {
    let exclude: &Regex = if has_body { &*BODY_EXCLUDE } else { &*QUERY_EXCLUDE };
    let filter = Filter { exclude: Some(exclude), include: Some(&*PARAMS_HEADING) };
    let base = typeify(route, true);
    let several = structures::tables(section, filter).len() > 1;
    let found = table_structures(section, renamer, filter, |heading| {
        let mut variant = typeify(&PARAM_TOKENS.replace_all(heading, " "), true);
        // the combined alias owns the bare name
        if variant.is_empty() && several {
            variant = if has_body { "Body" } else { "Query" }.to_string();
        }
        renamer.rename(&format!("{base}{variant}Params"))
    });
    match found.len() {
        0 => sentence_reference(TAKES_SENTENCE.find(prose)?.as_str(), renamer),
        1 => {
            let id = found[0].identifier.clone();
            Some(from_structures(id, found))
        }
        _ => Some(from_structures(renamer.rename(&format!("{base}Params")), found)),
    }
}

fn response(section: &Document, prose: &str, renamer: Renamer<'_>, route: &str) -> Option<EndpointParams> {
    let filter = Filter { exclude: Some(&*RESPONSE_EXCLUDE), include: Some(&*RESPONSE_HEADING) };
    let base = typeify(route, true);
    let identifier = renamer.rename(&format!("{base}Response"));
    let several = structures::tables(section, filter).len() > 1;
    let mut found = table_structures(section, renamer, filter, |heading| {
        let mut variant = typeify(&RESPONSE_TOKENS.replace_all(heading, " "), true);
        if variant.is_empty() && several {
            variant = "Body".to_string();
        }
        renamer.rename(&format!("{base}{variant}Response"))
    });
    if found.len() == 1 {
        found[0].identifier = identifier.clone();
    }
    if !found.is_empty() {
        return Some(from_structures(identifier, found));
    }
    let returned = RETURNS_SENTENCE
        .find_iter(prose)
        .find_map(|sentence| sentence_reference(sentence.as_str(), renamer));
    if returned.is_some() {
        return returned;
    }
    let sentence = SAME_AS_SENTENCE.find(prose)?;
    let inline = parse_inline(sentence.as_str());
    let target = renamer.rename(&camelify(&inline.first_link()?.text));
    (!target.is_empty()).then(|| EndpointParams {
        identifier: target,
        array: false,
        structures: Vec::new(),
        alias: true,
    })
}

// ------------------------------- Tests ------------------------------------ //
