use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A gist as returned by the GitHub REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub files: HashMap<String, GistFile>,
}

/// One file inside a gist. Listing endpoints omit `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub raw_url: Option<String>,
}

/// File body sent on create/update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GistFileContent {
    pub content: String,
}

/// Body of `POST /gists`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateGistRequest {
    pub description: String,
    pub public: bool,
    pub files: HashMap<String, GistFileContent>,
}

/// Body of `PATCH /gists/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateGistRequest {
    pub files: HashMap<String, GistFileContent>,
}

/// What a fetch of the remote blob yields.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    /// `None` when the gist exists but our file is missing or empty.
    pub content: Option<String>,
    pub server_updated_at: DateTime<Utc>,
}
