//! Heading + field table → `Structure`.
//!
//! A table qualifies when its header has a name-like, a type-like and a
//! description-like column. Field types go through two waterfalls: a textual
//! guess over the type cell, then link-based overrides.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::{Renamer, Resolution, Waterfall, column_index, typeify};
use crate::document::{Document, Heading, Inline, Table};
use crate::extract::reference;
use crate::ir::{Field, Structure, TypeDescriptor};

/// Headings never treated as structures; also consulted by the reference resolver.
pub static EXCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(%|example|json|type|change key|flag|(modes?|styles)$)").unwrap()
});

/// The docs' one structure that lives under an h3/h4 instead of an h2/h6.
const ANCHOR_EXCEPTION: &str = "client-status-object";

static FIELDS_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\s+|-)fields").unwrap());
static OBJECT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\s+|-)object").unwrap());
static STRUCTURE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\s+|-)structure$").unwrap());
static OPTIONAL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)optional").unwrap());

static FIELD_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*").unwrap());

/// Heading filters for one extraction pass.
#[derive(Debug, Clone, Copy)]
pub struct Filter<'r> {
    pub exclude: Option<&'r Regex>,
    pub include: Option<&'r Regex>,
}

impl Default for Filter<'_> {
    fn default() -> Self {
        Self { exclude: Some(&*EXCLUDE), include: None }
    }
}

impl Filter<'_> {
    fn accepts(&self, heading: &str) -> bool {
        self.exclude.is_none_or(|re| !re.is_match(heading))
            && self.include.is_none_or(|re| re.is_match(heading))
    }
}

/// Headings that may own an entity table: every h2 and h6, plus the anchor exception.
pub fn is_entity_heading(heading: &Heading) -> bool {
    heading.level == 2 || heading.level == 6 || heading.id == ANCHOR_EXCEPTION
}

/// `(name, type, description)` column positions, when the header has all three.
fn columns(table: &Table) -> Option<(usize, usize, usize)> {
    let header = table.header_texts();
    let name = column_index(&["field", "name"], &header)?;
    let ty = column_index(&["type", "value"], &header)?;
    let description = column_index(&["description"], &header)?;
    Some((name, ty, description))
}

/// Heading/table pairs that pass `filter` and look like field tables.
pub fn tables<'d>(doc: &'d Document, filter: Filter<'_>) -> Vec<(&'d Heading, &'d Table)> {
    doc.headings()
        .filter(|(_, h)| is_entity_heading(h) && filter.accepts(&h.text))
        .filter_map(|(ix, h)| doc.table_for(ix).map(|t| (h, t)))
        .filter(|(_, t)| columns(t).is_some())
        .collect()
}

/// Heading or link fragment → structure identifier.
pub fn identifier(renamer: &Renamer<'_>, text: &str, from_heading: bool) -> String {
    let s = FIELDS_SUFFIX.replace(text, "");
    let s = OBJECT_SUFFIX.replace(&s, "");
    let s = STRUCTURE_SUFFIX.replace(&s, "");
    let s = OPTIONAL_WORD.replace(&s, "");
    let id = typeify(s.trim(), true);
    if from_heading { renamer.rename_heading(&id) } else { renamer.rename(&id) }
}

pub fn from_document(doc: &Document, renamer: Renamer<'_>, filter: Filter<'_>) -> Vec<Structure> {
    tables(doc, filter)
        .into_iter()
        .map(|(heading, table)| Structure {
            identifier: identifier(&renamer, &heading.text, true),
            fields: fields(renamer, table),
        })
        .collect()
}

pub fn fields(renamer: Renamer<'_>, table: &Table) -> Vec<Field> {
    let Some((name_ix, type_ix, desc_ix)) = columns(table) else {
        return Vec::new();
    };
    table
        .rows
        .iter()
        .filter_map(|row| {
            let name = row.get(name_ix)?;
            let ty = row.get(type_ix)?;
            let description = row.get(desc_ix)?;
            field(renamer, &name.text, ty, description)
        })
        .collect()
}

fn field(renamer: Renamer<'_>, name: &str, ty: &Inline, description: &Inline) -> Option<Field> {
    let name = name.replace('*', "");
    let name = name.trim();
    let optional = name.ends_with('?');
    let ident = FIELD_NAME.find(&name.replace('?', ""))?.as_str().to_string();
    Some(Field {
        name: ident,
        optional,
        ty: type_descriptor(renamer, ty, description),
        description: description.text.clone(),
    })
}

// ----- Type guessing -----

static SNOWFLAKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(snowflake|object id)s?\b").unwrap());
static ARRAY_OF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\??(?:array|list) of (.*)$").unwrap());
static STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bstrings?\b").unwrap());
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"timestamp").unwrap());
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"int").unwrap());
static FLOAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(float|double)\b").unwrap());
static BOOLEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bbool(ean)?\b").unwrap());
static ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(array|list)\b|component object").unwrap());
static DICT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdict").unwrap());
static NULL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnull\b").unwrap());
static MIXED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmixed\b|option type").unwrap());
static NON_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z]").unwrap());

/// Marks a type cell as a collection, wherever the phrase sits.
pub static ARRAY_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(array|list)s?\b").unwrap());
static SNOWFLAKE_MAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)map of snowflakes").unwrap());

/// Textual guess for a type cell. Never fails: the last rule typeifies whatever is left.
pub fn sanitize(renamer: Renamer<'_>, text: &str) -> String {
    guesses(renamer).run(text).value().unwrap_or_else(|| "mixed".to_string())
}

fn guesses<'a>(renamer: Renamer<'a>) -> Waterfall<'a, str, String> {
    let fixed = |re: &'static Lazy<Regex>, id: &'static str| {
        move |text: &str| re.is_match(text).then(|| id.to_string())
    };
    Waterfall::new()
        .rule("snowflake", fixed(&SNOWFLAKE, "snowflake"))
        .rule("array-of", move |text: &str| {
            let inner = ARRAY_OF.captures(text)?.get(1)?.as_str().trim();
            (!inner.is_empty()).then(|| sanitize(renamer, inner))
        })
        .rule("string", fixed(&STRING, "string"))
        .rule("timestamp", fixed(&TIMESTAMP, "timestamp"))
        .rule("integer", fixed(&INTEGER, "integer"))
        .rule("float", fixed(&FLOAT, "float"))
        .rule("boolean", fixed(&BOOLEAN, "boolean"))
        .rule("array", fixed(&ARRAY, "array"))
        .rule("dict", fixed(&DICT, "dict"))
        .rule("null", fixed(&NULL, "null"))
        .rule("mixed", fixed(&MIXED, "mixed"))
        .rule("fallback", move |text: &str| {
            let letters = NON_LETTER.replace_all(text, "");
            (!letters.is_empty()).then(|| renamer.type_name(&letters))
        })
}

/// Guess, then let links overrule it.
pub fn type_descriptor(renamer: Renamer<'_>, ty: &Inline, description: &Inline) -> TypeDescriptor {
    let text = ty.text.trim();
    let guess = sanitize(renamer, text);
    let array = guess == "array" || ARRAY_WORD.is_match(text);
    let relation = reference::from_links(&ty.links, renamer, true);
    let identifier = match link_overrides(renamer, relation, description).run(&guess) {
        Resolution::Found { value, .. } => value,
        Resolution::NotFound => guess,
    };
    TypeDescriptor {
        // a bare "array" with nothing to point at is an array of anything
        identifier: if identifier == "array" { "mixed".to_string() } else { identifier },
        nullable: text.starts_with('?'),
        array,
        snowflake_map: SNOWFLAKE_MAP.is_match(text),
    }
}

fn link_overrides<'a>(
    renamer: Renamer<'a>,
    relation: Option<String>,
    description: &'a Inline,
) -> Waterfall<'a, str, String> {
    Waterfall::new()
        .rule("type-link", move |guess: &str| {
            if guess == "snowflake" || guess == "mixed" {
                return None;
            }
            relation.clone()
        })
        .rule("description-link", move |guess: &str| {
            if guess != "array" && guess != "mixed" {
                return None;
            }
            reference::from_links(&description.links, renamer, true)
        })
        .rule("description-enum", move |guess: &str| {
            if guess != "string" && guess != "integer" {
                return None;
            }
            reference::from_links(&description.links, renamer, false)
        })
}

// ------------------------------- Tests ------------------------------------ //
