//! Identifier and column utilities shared by every extractor.
//!
//! - `typeify` / `camelify` / `constantify` normalize free text into identifiers.
//! - `Renamer` applies the configured rename tables (`maybeRename`).
//! - `column_index` finds a column by fuzzy header text.
//! - `Waterfall` runs an ordered list of heuristics, first match wins.
use convert_case::{Case, Casing};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;

// ------------------------------- Casing ---------------------------------- //

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Every run of punctuation becomes a single space; `convert_case` handles the
/// camel-case humps and acronym tails.
fn spaced(input: &str) -> String {
    NON_ALNUM.replace_all(input, " ").trim().to_string()
}

/// Free text → singular PascalCase (`caps`) or camelCase identifier.
///
/// `typeify(&typeify(x, c), c) == typeify(x, c)` for every input.
pub fn typeify(input: &str, caps: bool) -> String {
    let case = if caps { Case::Pascal } else { Case::Camel };
    let mut current = singularize(&spaced(input).to_case(case));
    // runs of one-letter words ("A B Cde") re-split differently once joined
    for _ in 0..MAX_PASSES {
        let next = singularize(&current.to_case(case));
        if next == current {
            break;
        }
        current = next;
    }
    current
}

const MAX_PASSES: usize = 8;

/// `typeify(input, false)` without singularization; used for endpoint routes.
pub fn camelify(input: &str) -> String {
    spaced(input).to_case(Case::Camel)
}

static CONSTANT_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_. ]").unwrap());

/// Free text → SCREAMING_SNAKE_CASE. Dots become underscores.
pub fn constantify(input: &str) -> String {
    let stripped = CONSTANT_STRIP.replace_all(input, "").replace('.', " ");
    stripped.trim().to_case(Case::Constant)
}

const SINGULAR_IRREGULAR: &[(&str, &str)] = &[
    ("metadata", "metadatum"),
    ("data", "datum"),
    ("statuses", "status"),
    ("bonuses", "bonus"),
    ("aliases", "alias"),
    ("indices", "index"),
    ("children", "child"),
    ("people", "person"),
    ("caches", "cache"),
    ("movies", "movie"),
    ("cookies", "cookie"),
];

/// Singular form of the last word of a cased identifier, applied until
/// nothing changes so a stripped plural `s` cannot expose another rule.
pub fn singularize(ident: &str) -> String {
    let mut current = ident.to_string();
    loop {
        let next = singularize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn singularize_once(ident: &str) -> String {
    let lower = ident.to_ascii_lowercase();
    let keep = |n: usize| ident[..ident.len() - n].to_string();

    if SINGULAR_IRREGULAR.iter().any(|(_, single)| lower.ends_with(single)) {
        return ident.to_string();
    }
    for (plural, single) in SINGULAR_IRREGULAR {
        if lower.ends_with(plural) {
            let stem = keep(plural.len());
            let tail = &ident[ident.len() - plural.len()..];
            let single = if tail.starts_with(|c: char| c.is_uppercase()) {
                single.to_case(Case::Pascal)
            } else {
                single.to_string()
            };
            return stem + &single;
        }
    }
    if lower.len() <= 2 || lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return ident.to_string();
    }
    if lower.ends_with("ies") && lower.len() > 4 {
        return keep(3) + "y";
    }
    for suffix in ["sses", "shes", "ches", "xes"] {
        if lower.ends_with(suffix) {
            return keep(2);
        }
    }
    if lower.ends_with('s') {
        return keep(1);
    }
    ident.to_string()
}

// ------------------------------- Renaming -------------------------------- //

/// `maybeRename(file)`: per-file override first, then the global table, else identity.
#[derive(Debug, Clone, Copy)]
pub struct Renamer<'a> {
    config: &'a Config,
    file: &'a str,
}

impl<'a> Renamer<'a> {
    pub fn new(config: &'a Config, file: &'a str) -> Self {
        Self { config, file }
    }

    pub fn rename(&self, id: &str) -> String {
        self.config
            .file_renames
            .get(self.file)
            .and_then(|table| table.get(id))
            .or_else(|| self.config.renames.get(id))
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// `rename`, then the per-file heading table. Only for identifiers taken
    /// from heading text.
    pub fn rename_heading(&self, id: &str) -> String {
        let id = self.rename(id);
        self.config
            .heading_renames
            .get(self.file)
            .and_then(|table| table.get(&id))
            .cloned()
            .unwrap_or(id)
    }

    /// `typeify` followed by `rename`.
    pub fn type_name(&self, text: &str) -> String {
        self.rename(&typeify(text, true))
    }
}

// ------------------------------- Columns --------------------------------- //

/// Index of the first header cell matching any of `labels` as a whole word,
/// case-insensitive. Header order decides ties, not label order.
pub fn column_index(labels: &[&str], header: &[&str]) -> Option<usize> {
    let alternation = labels.iter().map(|l| regex::escape(l)).collect::<Vec<_>>().join("|");
    let pattern = Regex::new(&format!(r"(?i)\b({alternation})\b")).ok()?;
    header.iter().position(|text| pattern.is_match(text))
}

// ------------------------------ Waterfall -------------------------------- //

/// Outcome of a waterfall: the first rule that produced a value, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<O> {
    Found { rule: &'static str, value: O },
    NotFound,
}

impl<O> Resolution<O> {
    pub fn value(self) -> Option<O> {
        match self {
            Self::Found { value, .. } => Some(value),
            Self::NotFound => None,
        }
    }

    pub fn rule(&self) -> Option<&'static str> {
        match self {
            Self::Found { rule, .. } => Some(*rule),
            Self::NotFound => None,
        }
    }
}

type Rule<'a, I, O> = Box<dyn Fn(&I) -> Option<O> + 'a>;

/// Ordered heuristic rules; evaluation stops at the first `Some`.
pub struct Waterfall<'a, I: ?Sized, O> {
    rules: Vec<(&'static str, Rule<'a, I, O>)>,
}

impl<'a, I: ?Sized, O> Waterfall<'a, I, O> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rule(mut self, name: &'static str, f: impl Fn(&I) -> Option<O> + 'a) -> Self {
        self.rules.push((name, Box::new(f)));
        self
    }

    pub fn run(&self, input: &I) -> Resolution<O> {
        for (name, f) in &self.rules {
            if let Some(value) = f(input) {
                return Resolution::Found { rule: *name, value };
            }
        }
        Resolution::NotFound
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(n, _)| *n).collect()
    }
}

impl<I: ?Sized, O> Default for Waterfall<'_, I, O> {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------- Tests ------------------------------------ //
