//! Structured input documents and template overrides on disk.
//!
//! The ideal-customer-profile (ICP) and offer documents are YAML key-value
//! files that supply default fields when the pipeline runs without
//! interactive input. List fields accept either a YAML sequence or a
//! newline-delimited string.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::channel::ChannelId;
use crate::core::context::RawFields;

/// A list field written either as a sequence or as multi-line text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    fn into_text(self) -> String {
        match self {
            TextOrList::Text(text) => text,
            TextOrList::List(items) => items.join("\n"),
        }
    }
}

/// Ideal-customer-profile document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IcpDocument {
    pub name: Option<String>,
    pub company: Option<String>,
    pub handle: Option<String>,
    pub pain_points: Option<TextOrList>,
}

/// Offer document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OfferDocument {
    pub offer: Option<String>,
    pub benefits: Option<TextOrList>,
}

/// Convert both documents into raw pipeline fields.
pub fn documents_to_fields(icp: IcpDocument, offer: OfferDocument) -> RawFields {
    RawFields {
        recipient_name: icp.name,
        company: icp.company,
        handle: icp.handle,
        pain_points: icp.pain_points.map(TextOrList::into_text),
        offer: offer.offer,
        benefits: offer.benefits.map(TextOrList::into_text),
        ..RawFields::default()
    }
}

/// Load a YAML document.
///
/// A missing file yields the empty document unless `required` is set (the
/// caller named the path explicitly). An empty file is the empty document.
pub fn load_document<T: DeserializeOwned + Default>(path: &Path, required: bool) -> Result<T> {
    if !path.exists() {
        if required {
            return Err(anyhow!("document not found: {}", path.display()));
        }
        debug!(path = %path.display(), "document missing, using empty default");
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml_ng::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Read `<channel>.txt` template overrides from `dir`.
pub fn load_template_overrides(dir: &Path) -> Result<Vec<(ChannelId, String)>> {
    if !dir.is_dir() {
        return Err(anyhow!("templates directory not found: {}", dir.display()));
    }
    let mut overrides = Vec::new();
    for channel in ChannelId::ALL {
        let path = dir.join(format!("{channel}.txt"));
        if path.is_file() {
            let source = fs::read_to_string(&path)
                .with_context(|| format!("read template {}", path.display()))?;
            overrides.push((channel, source));
        }
    }
    debug!(dir = %dir.display(), count = overrides.len(), "template overrides loaded");
    Ok(overrides)
}
