//! Hyperlink → canonical identifier.
//!
//! Only the URL fragment after the last `/` is inspected. The rules are tried
//! in order; each applies `maybeRename` to what it produces.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::{Renamer, Resolution, Waterfall};
use crate::document::Link;
use crate::extract::{enums, structures};

static EXTERNAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"wikipedia").unwrap());

static POLL_RESULTS_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^poll-results-object-").unwrap());
static OBJECT_STRUCTURE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-object-structure$").unwrap());
static OBJECT_INFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*-object-").unwrap());
static DATA_MODELS_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^data-models-").unwrap());
static SHARED_RESOURCES_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^shared-resources-").unwrap());
static UPDATE_STATUS_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^update-status-").unwrap());
static BUTTONS_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^buttons-").unwrap());
static OBJECT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-object$").unwrap());

/// The fragment a reference is read from, or `None` for external/empty links.
pub fn fragment(href: &str) -> Option<&str> {
    if EXTERNAL.is_match(href) {
        return None;
    }
    href.rsplit('/').next().filter(|s| !s.is_empty())
}

fn strip(re: &Regex, s: &str) -> String {
    re.replace(s, "").into_owned()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Ordered reference rules over a link fragment.
///
/// With `include_structures == false` only the enum rule can fire, so
/// primitive-looking fields never get re-typed as objects.
pub fn rules<'a>(renamer: Renamer<'a>, include_structures: bool) -> Waterfall<'a, str, String> {
    Waterfall::new()
        .rule("structure", move |frag: &str| {
            if !include_structures
                || structures::EXCLUDE.is_match(frag)
                || enums::SUFFIX.is_match(frag)
            {
                return None;
            }
            let s = strip(&POLL_RESULTS_PREFIX, frag);
            let s = strip(&OBJECT_STRUCTURE_SUFFIX, &s);
            let s = strip(&OBJECT_INFIX, &s);
            let s = strip(&DATA_MODELS_PREFIX, &s);
            let s = strip(&SHARED_RESOURCES_PREFIX, &s);
            let s = s.replacen("identify-identify", "identify", 1);
            non_empty(structures::identifier(&renamer, &s, false))
        })
        .rule("enum", move |frag: &str| {
            if !enums::SUFFIX.is_match(frag) {
                return None;
            }
            let s = strip(&OBJECT_INFIX, frag);
            let s = strip(&DATA_MODELS_PREFIX, &s);
            let s = strip(&SHARED_RESOURCES_PREFIX, &s);
            let s = strip(&UPDATE_STATUS_PREFIX, &s);
            let s = strip(&BUTTONS_PREFIX, &s);
            non_empty(enums::identifier(&renamer, &s))
        })
        .rule("object", move |frag: &str| {
            if !include_structures || !OBJECT_SUFFIX.is_match(frag) {
                return None;
            }
            let s = strip(&DATA_MODELS_PREFIX, frag);
            let s = strip(&OBJECT_SUFFIX, &s);
            non_empty(renamer.type_name(&s))
        })
        .rule("fragment", move |frag: &str| {
            if !include_structures {
                return None;
            }
            non_empty(renamer.type_name(frag))
        })
}

pub fn resolve(link: &Link, renamer: Renamer<'_>, include_structures: bool) -> Resolution<String> {
    match fragment(&link.href) {
        Some(frag) => rules(renamer, include_structures).run(frag),
        None => Resolution::NotFound,
    }
}

pub fn from_link(link: &Link, renamer: Renamer<'_>, include_structures: bool) -> Option<String> {
    resolve(link, renamer, include_structures).value()
}

/// Reference from the first link only; later links are never consulted.
pub fn from_links(links: &[Link], renamer: Renamer<'_>, include_structures: bool) -> Option<String> {
    links.first().and_then(|link| from_link(link, renamer, include_structures))
}

// ------------------------------- Tests ------------------------------------ //
