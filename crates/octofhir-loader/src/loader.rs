//! Directory scan, ordering and sequential submission of FHIR JSON files.
//!
//! Every file yields exactly one [`LoadOutcome`]; the outcomes are folded into
//! a [`LoadSummary`]. A failing file never stops the run.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::FhirClient;
use crate::error::LoadError;
use crate::output;

/// Substrings that pull a file to the front of the queue, in priority order.
const PRIORITY_MARKERS: [&str; 2] = ["practitionerInformation", "hospitalInformation"];

/// Result of processing one file.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Server answered 200 or 201.
    Loaded {
        /// `resourceType` as submitted; non-string values are rendered as JSON.
        resource_type: String,
        status: StatusCode,
    },
    /// Document has no `resourceType`; not counted as success or error.
    Skipped,
    /// Server answered with any other status.
    Rejected { status: StatusCode, body: String },
    /// Read, parse or transport failure.
    Failed(LoadError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of files found in the data directory.
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl LoadSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded { .. } => self.success += 1,
            LoadOutcome::Skipped => self.skipped += 1,
            LoadOutcome::Rejected { .. } | LoadOutcome::Failed(_) => self.errors += 1,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// `*.json` as a shell glob sees it: hidden entries never match.
/// Compared on raw bytes so non-UTF-8 names still match.
fn matches_json_glob(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    !bytes.starts_with(b".") && bytes.ends_with(b".json")
}

/// List `*.json` entries directly under `dir`, sorted by path.
///
/// Listing errors behave like an empty glob: a missing or unreadable
/// directory yields no files, and unreadable entries are left out.
pub fn enumerate_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %dir.display(), error = %e, "Cannot list data directory");
            }
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| matches_json_glob(&entry.file_name()))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files
}

pub fn file_priority(path: &Path) -> usize {
    let name = file_name(path);
    PRIORITY_MARKERS
        .iter()
        .position(|marker| name.contains(marker))
        .unwrap_or(PRIORITY_MARKERS.len())
}

/// Stable sort: practitioner files, then hospital files, then the rest.
pub fn order_files(files: &mut [PathBuf]) {
    files.sort_by_key(|path| file_priority(path));
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Python-style truthiness: null, false, zero and empty strings, arrays
/// and objects are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// The document's `resourceType`, unless it is missing or falsy.
pub fn resource_type(document: &Value) -> Option<&Value> {
    document.get("resourceType").filter(|rt| is_truthy(rt))
}

fn render_resource_type(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn read_document(path: &Path) -> Result<Value, LoadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::io(path, e))?;
    let document: Value = serde_json::from_slice(&bytes).map_err(|e| LoadError::json(path, e))?;
    if !document.is_object() {
        return Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
        });
    }
    Ok(document)
}

pub struct Loader {
    client: FhirClient,
}

impl Loader {
    pub fn new(client: FhirClient) -> Self {
        Self { client }
    }

    /// Read, classify and submit a single file.
    pub async fn process_file(&self, path: &Path) -> LoadOutcome {
        let document = match read_document(path).await {
            Ok(document) => document,
            Err(e) => return LoadOutcome::Failed(e),
        };

        let Some(resource_type) = resource_type(&document).map(render_resource_type) else {
            return LoadOutcome::Skipped;
        };
        debug!(file = %path.display(), resource_type = %resource_type, "Submitting document");

        match self.client.submit(&document).await {
            Ok(resp) if resp.is_accepted() => LoadOutcome::Loaded {
                resource_type,
                status: resp.status,
            },
            Ok(resp) => LoadOutcome::Rejected {
                status: resp.status,
                body: resp.body,
            },
            Err(e) => LoadOutcome::Failed(e),
        }
    }

    /// Load every `*.json` file under `data_dir`, one at a time, printing a
    /// progress line per file and a final summary.
    pub async fn run(&self, data_dir: &Path) -> LoadSummary {
        let mut files = enumerate_files(data_dir);

        if files.is_empty() {
            output::print_no_files(data_dir);
            return LoadSummary::default();
        }

        order_files(&mut files);
        let total = files.len();
        output::print_found(total);
        info!(
            files = total,
            endpoint = %self.client.endpoint(),
            "Starting load"
        );

        let mut summary = LoadSummary::new(total);
        for (i, path) in files.iter().enumerate() {
            let outcome = self.process_file(path).await;
            match &outcome {
                LoadOutcome::Loaded {
                    resource_type,
                    status,
                } => {
                    debug!(
                        file = %path.display(),
                        resource_type = %resource_type,
                        status = status.as_u16(),
                        "Loaded"
                    );
                }
                LoadOutcome::Skipped => debug!(file = %path.display(), "Skipped"),
                LoadOutcome::Rejected { status, .. } => {
                    warn!(file = %path.display(), status = status.as_u16(), "Rejected by server");
                }
                LoadOutcome::Failed(e) => warn!(file = %path.display(), error = %e, "Failed"),
            }
            output::print_outcome(i + 1, total, &file_name(path), &outcome);
            summary.record(&outcome);
        }

        output::print_summary(&summary);
        info!(
            success = summary.success,
            errors = summary.errors,
            skipped = summary.skipped,
            "Load finished"
        );
        summary
    }
}
