//! CLI support for twoway-sql
//!
//! Provides programmatic access to the `twoway` commands so other tools can
//! render templates without spawning a process.

mod convert;
mod docs;
mod render;

pub use convert::{json_to_param, parse_type_declaration};
pub use docs::{DocCategory, get_doc_category, get_docs_overview};
pub use render::{RenderOptions, RenderResult, execute_render};

use std::io;

use thiserror::Error;

use crate::{config::ConfigError, render::RenderError, template::TemplateSyntaxError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] TemplateSyntaxError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No parameters provided
    #[error("No parameters provided. Use --params or pipe JSON to stdin.")]
    NoInput,

    #[error("Invalid type declaration '{0}' (expected path=type, e.g. member.birthdate=string)")]
    InvalidType(String),

    /// Unknown documentation category
    #[error("Unknown category: '{0}'\nRun 'twoway docs' to see available categories.")]
    UnknownCategory(String),
}
