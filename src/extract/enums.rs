//! Headings with an enum-like suffix and a table → `Enum`.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::{Renamer, column_index, constantify};
use crate::document::{Document, Inline, Table};
use crate::extract::structures;
use crate::ir::{Enum, EnumLiteral, EnumValue};

/// Trailing words that mark a heading (or link fragment) as an enum.
pub static SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(behaviors|enum|events|features|level|modes|opcodes|scopes|status|styles|tier|types)$")
        .unwrap()
});

/// Event catalogs; the gateway extractor owns those.
static EXCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(send|receive) events").unwrap());

static ENUM_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)enum").unwrap());
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

pub fn identifier(renamer: &Renamer<'_>, text: &str) -> String {
    renamer.type_name(ENUM_WORD.replace(text.trim(), "").trim())
}

pub fn from_document(doc: &Document, renamer: Renamer<'_>) -> Vec<Enum> {
    doc.headings()
        .filter(|(_, h)| structures::is_entity_heading(h))
        .filter(|(_, h)| SUFFIX.is_match(&h.text) && !EXCLUDE.is_match(&h.text))
        .filter_map(|(ix, h)| {
            let values = values(doc.table_for(ix)?);
            (!values.is_empty()).then(|| Enum { identifier: identifier(&renamer, &h.text), values })
        })
        .collect()
}

struct Columns {
    name: usize,
    value: Option<usize>,
    description: Option<usize>,
}

fn columns(table: &Table) -> Option<Columns> {
    let header = table.header_texts();
    let value = column_index(&["id", "value", "integer", "code"], &header)
        .or_else(|| column_index(&["type"], &header));
    let description = column_index(&["explaination", "explanation", "description"], &header);
    let remaining: Vec<usize> = (0..header.len())
        .filter(|ix| Some(*ix) != value && Some(*ix) != description)
        .collect();
    let name = match remaining.as_slice() {
        [] => return None,
        [only] => *only,
        [first, ..] => column_index(&["name"], &header)
            .filter(|ix| remaining.contains(ix))
            .unwrap_or(*first),
    };
    Some(Columns { name, value, description })
}

pub fn values(table: &Table) -> Vec<EnumValue> {
    let Some(cols) = columns(table) else {
        return Vec::new();
    };
    table
        .rows
        .iter()
        .filter_map(|row| {
            let name = row.get(cols.name)?.text.trim();
            let constant = constantify(name);
            if constant.is_empty() {
                return None;
            }
            let value = match cols.value {
                Some(ix) => literal(&row.get(ix)?.text),
                None => EnumLiteral::String(name.to_string()),
            };
            let description = cols
                .description
                .and_then(|ix| row.get(ix))
                .map(|cell: &Inline| cell.text.trim().to_string())
                .filter(|text| !text.is_empty());
            Some(EnumValue { name: constant, value, description })
        })
        .collect()
}

/// Numeric cells become numbers; everything else is text with quotes removed.
pub fn literal(cell: &str) -> EnumLiteral {
    let text = cell.trim().replace('"', "");
    if NUMERIC.is_match(&text) {
        if let Ok(int) = text.parse::<i64>() {
            return EnumLiteral::Integer(int);
        }
        if let Ok(float) = text.parse::<f64>() {
            return EnumLiteral::Float(float);
        }
    }
    EnumLiteral::String(text)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn extract(md: &str) -> Vec<Enum> {
        let config = Config::default();
        let doc = Document::parse("resources/Channel.md", md);
        from_document(&doc, Renamer::new(&config, "resources/Channel.md"))
    }

    #[test]
    fn numeric_values_are_coerced() {
        let out = extract("###### Channel Types\n\n| Type | ID | Description |\n|---|---|---|\n| GUILD_TEXT | 0 | a text channel |\n| DM | \"1\" | a direct message |\n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].identifier, "ChannelType");
        assert_eq!(
            serde_json::to_value(&out[0].values).unwrap(),
            json!([
                {"name": "GUILD_TEXT", "value": 0, "description": "a text channel"},
                {"name": "DM", "value": 1, "description": "a direct message"},
            ])
        );
    }

    #[test]
    fn name_text_is_the_value_without_a_value_column() {
        let out = extract("###### Activity Status\n\n| Status | Description |\n|---|---|\n| online | Online |\n");
        assert_eq!(out[0].values[0].name, "ONLINE");
        assert_eq!(out[0].values[0].value, EnumLiteral::String("online".into()));
    }

    #[test]
    fn string_values_stay_strings() {
        let out = extract("###### Premium Tier\n\n| Name | Value |\n|---|---|\n| Online | ONLINE |\n");
        assert_eq!(out[0].values[0].name, "ONLINE");
        assert_eq!(out[0].values[0].value, EnumLiteral::String("ONLINE".into()));
        assert_eq!(out[0].values[0].description, None);
    }

    #[test]
    fn explicit_name_column_breaks_ambiguity() {
        let out = extract("###### Message Flags Types\n\n| Note | Name | Value |\n|---|---|---|\n| n/a | Crossposted | 1 |\n");
        assert_eq!(out[0].values[0].name, "CROSSPOSTED");
        assert_eq!(out[0].values[0].value, EnumLiteral::Integer(1));
    }

    #[test]
    fn event_catalogs_and_tableless_headings_are_skipped() {
        assert!(extract("## Receive Events\n\n| Name | Description |\n|---|---|\n| Hello | hi |\n").is_empty());
        assert!(extract("###### Guild Features\n\nNo table here.\n").is_empty());
    }

    #[test]
    fn literal_coercion() {
        assert_eq!(literal("1"), EnumLiteral::Integer(1));
        assert_eq!(literal(" -2 "), EnumLiteral::Integer(-2));
        assert_eq!(literal("1.5"), EnumLiteral::Float(1.5));
        assert_eq!(literal("\"en-US\""), EnumLiteral::String("en-US".into()));
        assert_eq!(literal("inf"), EnumLiteral::String("inf".into()));
    }
}
