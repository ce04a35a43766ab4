//! Wire and in-memory model for folders and files.
//!
//! The backend is loose about shapes: ids may be numbers or strings, sizes may
//! be numbers or numeric strings, and a folder's children may be listed under
//! either `folders` or `subfolders`. The `Raw*` types accept all of that and
//! [`normalize_folder`] turns them into the canonical [`Folder`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Permission tag attached to a folder or file for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    View,
    Download,
    Upload,
    Manage,
    #[serde(alias = "no-access", alias = "noAccess")]
    NoAccess,
    #[serde(other)]
    Unknown,
}

impl AccessLevel {
    /// Short label for list rendering.
    pub fn label(&self) -> &'static str {
        match self {
            AccessLevel::View => "view",
            AccessLevel::Download => "download",
            AccessLevel::Upload => "upload",
            AccessLevel::Manage => "manage",
            AccessLevel::NoAccess => "no access",
            AccessLevel::Unknown => "?",
        }
    }
}

/// A file leaf inside a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_u64")]
    pub size: Option<u64>,
    #[serde(default, rename = "type", alias = "file_type")]
    pub file_type: Option<String>,
    #[serde(default, alias = "folderId", deserialize_with = "de_opt_id")]
    pub folder_id: Option<String>,
    #[serde(default, alias = "organizationId", deserialize_with = "de_opt_id")]
    pub organization_id: Option<String>,
    #[serde(default, alias = "uploadedBy", deserialize_with = "de_opt_id")]
    pub uploaded_by: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "de_lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "accessLevel")]
    pub access_level: Option<AccessLevel>,
}

impl FileEntry {
    /// Name shown to the user: the display name when set, else the stored filename.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.filename,
        }
    }
}

/// Canonical folder node. Children always live in `subfolders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_folder_id: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub subfolders: Vec<Folder>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub access_level: Option<AccessLevel>,
    #[serde(default, deserialize_with = "de_lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Folder as it arrives from the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFolder {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "parentFolderId", deserialize_with = "de_opt_id")]
    pub parent_folder_id: Option<String>,
    #[serde(default, alias = "organizationId", deserialize_with = "de_opt_id")]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub folders: Option<Vec<RawFolder>>,
    #[serde(default)]
    pub subfolders: Option<Vec<RawFolder>>,
    #[serde(default)]
    pub files: Option<Vec<FileEntry>>,
    #[serde(default, alias = "accessLevel")]
    pub access_level: Option<AccessLevel>,
    #[serde(default, alias = "createdAt", deserialize_with = "de_lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Recursively fold `folders`/`subfolders` into a single `subfolders` list.
/// When both keys are present, `subfolders` wins.
pub fn normalize_folder(raw: RawFolder) -> Folder {
    let children = raw.subfolders.or(raw.folders).unwrap_or_default();
    Folder {
        id: raw.id,
        name: raw.name,
        parent_folder_id: raw.parent_folder_id,
        organization_id: raw.organization_id,
        subfolders: children.into_iter().map(normalize_folder).collect(),
        files: raw.files.unwrap_or_default(),
        access_level: raw.access_level,
        created_at: raw.created_at,
    }
}

/// Normalize a list of top-level folders.
pub fn normalize_folders(raw: Vec<RawFolder>) -> Vec<Folder> {
    raw.into_iter().map(normalize_folder).collect()
}

/// The signed-in user, as far as this client needs to know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
}

/// Body of the create-folder request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_folder_id: Option<String>,
    pub created_by: String,
}

/// Body of the rename-folder request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpdateFolderRequest {
    pub id: String,
    pub name: String,
}

/// Body of the move-file request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoveFileRequest {
    pub file_id: String,
    pub destination_folder_id: String,
    pub moved_by: String,
}

/// Body of the move-folder request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoveFolderRequest {
    pub folder_id: String,
    pub destination_folder_id: String,
    pub moved_by: String,
}

// ── Lenient deserializers ────────────────────────────────────────────────────

fn value_to_id(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string().trim_matches('"').to_string()),
    }
}

fn de_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    value_to_id(value).ok_or_else(|| serde::de::Error::custom("id must not be null"))
}

fn de_opt_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_id))
}

fn de_lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(serde_json::Value::String(s)) => parse_leading_int(&s),
        _ => None,
    })
}

/// Timestamps in RFC 3339 or a bare `YYYY-MM-DD[ HH:MM:SS]` (taken as UTC).
/// Anything else becomes `None` rather than failing the whole body.
fn de_lenient_datetime<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_timestamp(s.trim()),
        _ => None,
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse the leading run of digits, so `"2048"` and `"2048 bytes"` both give 2048.
fn parse_leading_int(s: &str) -> Option<u64> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
