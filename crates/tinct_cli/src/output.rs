//! Rendering resolved tokens

use anyhow::{Context, Result};
use serde_json::Value;
use tinct_tokens::{flatten, Dictionary};

use crate::config::OutputFormat;

/// Render a resolved dictionary, optionally flattened to `dot.path` keys.
pub fn render(resolved: &Dictionary, format: OutputFormat, pretty: bool, flat: bool) -> Result<String> {
    let document = if flat {
        flatten(resolved).into_iter().collect::<Dictionary>()
    } else {
        resolved.clone()
    };
    let document = Value::Object(document);

    let mut out = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(&document)?,
        OutputFormat::Json => serde_json::to_string(&document)?,
        OutputFormat::Yaml => serde_yaml::to_string(&document)?,
        OutputFormat::Toml if pretty => toml::to_string_pretty(&document)
            .context("Tokens cannot be written as TOML (null values are not representable)")?,
        OutputFormat::Toml => toml::to_string(&document)
            .context("Tokens cannot be written as TOML (null values are not representable)")?,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}
