//! Bit-flag tables (`N << M`) and the gateway intents listing.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::{Renamer, column_index, constantify};
use crate::document::{Document, Inline, Table};
use crate::extract::structures;
use crate::ir::{FlagValue, Flags};

static SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bflags$").unwrap());
static BITWISE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)bitwise").unwrap());
static SHIFT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) << (\d+)").unwrap());
static HEX_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b0x[0-9a-f]+\b").unwrap());

static INTENTS_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)list of intents").unwrap());
static INTENT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+) \((\d+) << (\d+)\)").unwrap());

/// Fixed name of the intents flag set; the listing has no usable heading.
pub const INTENTS_IDENTIFIER: &str = "GatewayIntentBits";

pub fn identifier(renamer: &Renamer<'_>, heading: &str) -> String {
    renamer.type_name(BITWISE_WORD.replace(heading, "").trim())
}

pub fn from_document(doc: &Document, renamer: Renamer<'_>) -> Vec<Flags> {
    doc.headings()
        .filter(|(_, h)| structures::is_entity_heading(h) && SUFFIX.is_match(&h.text))
        .filter_map(|(ix, h)| {
            let values = values(doc.table_for(ix)?);
            (!values.is_empty()).then(|| Flags { identifier: identifier(&renamer, &h.text), values })
        })
        .collect()
}

pub fn values(table: &Table) -> Vec<FlagValue> {
    let header = table.header_texts();
    let value_ix = column_index(&["value", "integer", "id"], &header).unwrap_or(0);
    let name_ix = if value_ix == 0 { 1 } else { 0 };
    let desc_ix = column_index(&["description"], &header)
        .or_else(|| (header.len() > 2).then_some(2))
        .filter(|ix| *ix != value_ix && *ix != name_ix);

    table
        .rows
        .iter()
        .filter_map(|row| {
            let value = &row.get(value_ix)?.text;
            let shift = SHIFT.captures(value)?;
            let name = constantify(&row.get(name_ix)?.text);
            if name.is_empty() {
                return None;
            }
            let bigint = value.contains('x') || row.iter().any(|cell| HEX_LITERAL.is_match(&cell.text));
            let description = desc_ix
                .and_then(|ix| row.get(ix))
                .map(|cell: &Inline| cell.text.trim().to_string())
                .filter(|text| !text.is_empty());
            Some(FlagValue {
                name,
                bigint,
                left: shift[1].to_string(),
                right: shift[2].to_string(),
                description,
            })
        })
        .collect()
}

/// `NAME (N << M)` lines from the preformatted block under "list of intents".
pub fn intents(doc: &Document, renamer: Renamer<'_>) -> Option<Flags> {
    let (ix, _) = doc.headings().find(|(_, h)| INTENTS_HEADING.is_match(&h.text))?;
    let listing = doc.preformatted_for(ix)?;
    let values: Vec<FlagValue> = INTENT_LINE
        .captures_iter(listing)
        .map(|caps| FlagValue {
            name: constantify(&caps[1]),
            bigint: false,
            left: caps[2].to_string(),
            right: caps[3].to_string(),
            description: None,
        })
        .collect();
    (!values.is_empty()).then(|| Flags { identifier: renamer.rename(INTENTS_IDENTIFIER), values })
}

// ------------------------------- Tests ------------------------------------ //
