//! Per-document extraction.
//!
//! `extract_all` is a pure function of one parsed document and the config:
//! - path partitions decide which extractors run;
//! - every extractor works on the document alone and hands back finished entities;
//! - nothing is deduplicated here, `merge` does that across the whole tree.
pub mod reference;
pub mod structures;
pub mod enums;
pub mod flags;
pub mod endpoints;
pub mod gateway;

use tracing::debug;

use crate::common::Renamer;
use crate::config::{CompiledPartitions, Config};
use crate::document::Document;
use crate::ir::{Alias, Endpoint, Enum, Flags, GatewaySection, Structure};

/// Everything one document contributed, tagged with its relative path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialIr {
    pub path: String,
    pub structures: Vec<Structure>,
    pub enums: Vec<Enum>,
    pub flags: Vec<Flags>,
    pub endpoints: Vec<Endpoint>,
    pub gateway: Vec<GatewaySection>,
    pub aliases: Vec<Alias>,
}

impl PartialIr {
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
            && self.enums.is_empty()
            && self.flags.is_empty()
            && self.endpoints.is_empty()
            && self.gateway.is_empty()
            && self.aliases.is_empty()
    }
}

pub fn extract_all(doc: &Document, config: &Config, partitions: &CompiledPartitions) -> PartialIr {
    let renamer = Renamer::new(config, &doc.path);
    let mut out = PartialIr { path: doc.path.clone(), ..PartialIr::default() };

    if partitions.schema.is_match(&doc.path) {
        out.structures = structures::from_document(doc, renamer, structures::Filter::default());
        out.enums = enums::from_document(doc, renamer);
        out.flags = flags::from_document(doc, renamer);
        out.endpoints = endpoints::from_document(doc, renamer);
    }
    if partitions.gateway.is_match(&doc.path) {
        out.gateway = gateway::sections(doc, renamer);
        out.aliases = gateway::event_aliases(doc, renamer);
        out.flags.extend(flags::intents(doc, renamer));
    }

    debug!(
        file = %doc.path,
        structures = out.structures.len(),
        enums = out.enums.len(),
        flags = out.flags.len(),
        endpoints = out.endpoints.len(),
        gateway = out.gateway.len(),
        aliases = out.aliases.len(),
        "extracted"
    );
    out
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "\
###### Role Structure

| Field | Type | Description |
|---|---|---|
| id | snowflake | role id |

## Receive Events

| Name | Description |
|---|---|
| Ready | ready |
";

    fn run(path: &str) -> PartialIr {
        let config = Config::default();
        let partitions = config.partitions.compile().unwrap();
        extract_all(&Document::parse(path, PAGE), &config, &partitions)
    }

    #[test]
    fn schema_partition_runs_schema_extractors_only() {
        let out = run("topics/Permissions.md");
        assert_eq!(out.structures.len(), 1);
        assert!(out.gateway.is_empty());
    }

    #[test]
    fn gateway_docs_run_both_passes() {
        let out = run("topics/Gateway_Events.md");
        assert_eq!(out.structures.len(), 1);
        assert_eq!(out.gateway.len(), 1);
    }

    #[test]
    fn unpartitioned_paths_contribute_nothing() {
        let out = run("reference.md");
        assert!(out.is_empty());
        assert_eq!(out.path, "reference.md");
    }
}
