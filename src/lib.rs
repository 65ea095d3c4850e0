//! Markdown API docs → typed IR.
//!
//! `source::extract_tree` is the whole pipeline: walk the docs tree, extract
//! each document independently (`extract`), then reduce (`merge`).
pub mod cli;
pub mod common;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod ir;
pub mod merge;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};
pub use ir::Ir;
pub use source::extract_tree;
