//! Blob format for attribution records.
//!
//! Records are stored as JSON objects tagged with
//! `"schema_version": "attrib/<major>.<minor>"`. Any minor version of a
//! supported major decodes: fields this version does not know are skipped,
//! and `extra` maps round-trip verbatim.

use serde_json::Value;

use crate::record::AttributionRecord;

/// Tag written on every record produced by this version.
pub const SCHEMA_VERSION: &str = "attrib/1.0";

const SCHEMA_PREFIX: &str = "attrib/";
const SUPPORTED_MAJOR: u32 = 1;

/// A blob that cannot be read as an attribution record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// No `schema_version` field.
    #[error("missing schema_version tag")]
    MissingVersion,

    /// Tag is malformed or names an unsupported major version.
    #[error("unrecognized schema version '{0}'")]
    UnsupportedVersion(String),

    /// Not JSON, truncated, or fields of the wrong shape.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// A portion outside `[0, 1]` or not a finite number.
    #[error("portion {portion} for '{contributor}' is outside [0, 1]")]
    InvalidPortion { contributor: String, portion: f64 },
}

/// Serialize a record.
///
/// # Errors
/// Returns `InvalidPortion` if any entry's portion is out of range.
pub fn encode(record: &AttributionRecord) -> Result<Vec<u8>, SchemaError> {
    validate(record)?;
    serde_json::to_vec_pretty(record).map_err(|e| SchemaError::Malformed(e.to_string()))
}

/// Deserialize a record.
///
/// # Errors
/// Returns `SchemaError` if the tag is missing or unsupported, or the
/// layout is invalid.
pub fn decode(bytes: &[u8]) -> Result<AttributionRecord, SchemaError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| SchemaError::Malformed(e.to_string()))?;

    let Some(object) = value.as_object() else {
        return Err(SchemaError::Malformed("expected a JSON object".into()));
    };
    let tag = object
        .get("schema_version")
        .ok_or(SchemaError::MissingVersion)?
        .as_str()
        .ok_or_else(|| SchemaError::Malformed("schema_version must be a string".into()))?;

    match parse_version(tag) {
        Some((SUPPORTED_MAJOR, _)) => {}
        _ => return Err(SchemaError::UnsupportedVersion(tag.to_string())),
    }

    let record: AttributionRecord =
        serde_json::from_value(value).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    validate(&record)?;
    Ok(record)
}

/// Split `attrib/<major>.<minor>` into its numbers.
fn parse_version(tag: &str) -> Option<(u32, u32)> {
    let (major, minor) = tag.strip_prefix(SCHEMA_PREFIX)?.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

fn validate(record: &AttributionRecord) -> Result<(), SchemaError> {
    for entry in &record.entries {
        if !(0.0..=1.0).contains(&entry.portion) {
            return Err(SchemaError::InvalidPortion {
                contributor: entry.contributor.clone(),
                portion: entry.portion,
            });
        }
    }
    Ok(())
}
