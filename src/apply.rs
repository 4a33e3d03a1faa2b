//! Patch transaction around the pure section patcher.
//!
//! Order of work: validate the request, read the file, patch, enforce the
//! sanity floor, take a best-effort backup, write the whole file. Nothing is
//! written when any step before the write fails. The backup never fails the
//! transaction; its absence only shows as a missing `backupCount`.

use crate::backup::{self, BackupOutcome};
use crate::error::PatchError;
use crate::models::section::SectionPath;
use crate::models::{PatchRequest, PatchResponse};
use crate::patch::{ensure_sane, patch_section, PatchOptions};
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Back up and write the patched file.
    Write,
    /// Compute the patched text only.
    Preview,
}

#[derive(Debug)]
/// Result of a successful transaction.
pub struct PatchOutcome {
    pub response: PatchResponse,
    pub original: String,
    pub patched: String,
    pub wrote: bool,
    pub backup: Option<BackupOutcome>,
}

#[derive(Debug, Clone)]
/// A request whose required fields are present and well-formed.
pub struct ValidatedRequest {
    pub file: PathBuf,
    pub section_name: String,
    pub path: SectionPath,
    pub data: Map<String, Json>,
    pub options: PatchOptions,
}

impl ValidatedRequest {
    pub fn from_request(req: &PatchRequest) -> Result<Self, PatchError> {
        let file = req.file_path.as_deref().filter(|s| !s.is_empty());
        let section = req.section_name.as_deref().filter(|s| !s.is_empty());
        let mut missing = Vec::new();
        if file.is_none() {
            missing.push("filePath");
        }
        if section.is_none() {
            missing.push("sectionName");
        }
        if req.section_data.is_none() {
            missing.push("sectionData");
        }
        let (Some(file), Some(section), Some(data)) = (file, section, req.section_data.as_ref())
        else {
            return Err(PatchError::MissingParameters(missing));
        };
        let data = match data {
            Json::Object(map) => map.clone(),
            other => {
                return Err(PatchError::InvalidSectionData(format!(
                    "expected an object, got {}",
                    json_kind(other)
                )))
            }
        };
        Ok(ValidatedRequest {
            file: PathBuf::from(file),
            section_name: section.to_string(),
            path: SectionPath::parse(section, req.is_athlete)?,
            data,
            options: PatchOptions {
                preserve_nested_keys: req.preserve_nested_keys.clone(),
            },
        })
    }
}

fn json_kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Run one patch transaction.
pub fn apply_patch(req: &PatchRequest, mode: Mode) -> Result<PatchOutcome, PatchError> {
    let valid = ValidatedRequest::from_request(req)?;
    let original =
        fs::read_to_string(&valid.file).map_err(|e| PatchError::from_io(&valid.file, e))?;

    let patched = patch_section(&original, &valid.path, &valid.data, &valid.options)?;
    ensure_sane(&patched)?;

    let file_path = valid.file.to_string_lossy().to_string();
    if mode == Mode::Preview {
        return Ok(PatchOutcome {
            response: PatchResponse {
                success: true,
                message: format!(
                    "Section '{}' patched (preview only, nothing written)",
                    valid.section_name
                ),
                file_path,
                backup_count: None,
            },
            original,
            patched,
            wrote: false,
            backup: None,
        });
    }

    let backup = backup::try_backup(&valid.file, &original);
    fs::write(&valid.file, &patched).map_err(|e| PatchError::from_io(&valid.file, e))?;
    tracing::info!(file = %file_path, section = %valid.path, "section written");

    Ok(PatchOutcome {
        response: PatchResponse {
            success: true,
            message: format!("Section '{}' updated successfully", valid.section_name),
            file_path,
            backup_count: backup.as_ref().map(|b| b.count),
        },
        original,
        patched,
        wrote: true,
        backup,
    })
}
