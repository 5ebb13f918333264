use std::fmt;

// === StorageError ===

/// Errors related to the local key-value store.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Database operation failed.
    DatabaseError(String),
    /// Failed to serialize or deserialize stored data.
    SerializationError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::SerializationError(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

// === SyncError ===

/// Errors raised while talking to the remote gist or reconciling with it.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The credential was rejected (HTTP 401).
    AuthError(String),
    /// The remote gist no longer exists.
    NotFound(String),
    /// Any other non-2xx response.
    RemoteError { status: u16, message: String },
    /// The request never produced a response.
    NetworkError(String),
    /// The remote content could not be parsed as a collection list.
    MalformedRemote(String),
    /// A local write failed during the sync.
    Storage(StorageError),
}

impl SyncError {
    /// Only transport failures are worth another attempt, and even those wait for the next trigger.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::NetworkError(_))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::AuthError(msg) => write!(f, "Gist authentication failed: {}", msg),
            SyncError::NotFound(id) => write!(f, "Gist not found: {}", id),
            SyncError::RemoteError { status, message } => {
                write!(f, "Gist API error ({}): {}", status, message)
            }
            SyncError::NetworkError(msg) => write!(f, "Gist network error: {}", msg),
            SyncError::MalformedRemote(msg) => write!(f, "Malformed remote content: {}", msg),
            SyncError::Storage(e) => write!(f, "Sync storage error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<StorageError> for SyncError {
    fn from(e: StorageError) -> Self {
        SyncError::Storage(e)
    }
}

// === CollectionError ===

/// Errors related to collection and tab mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionError {
    /// Collection with the given ID was not found.
    NotFound(String),
    /// Tab with the given ID was not found.
    TabNotFound(String),
    /// A tab with an effectively equal URL already exists in the collection.
    DuplicateUrl(String),
    /// The provided tab index is out of bounds.
    InvalidIndex(usize),
    /// Persisting the mutation failed.
    Storage(StorageError),
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::NotFound(id) => write!(f, "Collection not found: {}", id),
            CollectionError::TabNotFound(id) => write!(f, "Tab not found: {}", id),
            CollectionError::DuplicateUrl(url) => write!(f, "Duplicate tab URL: {}", url),
            CollectionError::InvalidIndex(index) => write!(f, "Invalid tab index: {}", index),
            CollectionError::Storage(e) => write!(f, "Collection storage error: {}", e),
        }
    }
}

impl std::error::Error for CollectionError {}

impl From<StorageError> for CollectionError {
    fn from(e: StorageError) -> Self {
        CollectionError::Storage(e)
    }
}

// === ImportError ===

/// Errors related to importing collection files.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The file is neither the current nor the legacy format.
    InvalidFormat(String),
    /// Persisting the imported collections failed.
    Storage(StorageError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::InvalidFormat(msg) => write!(f, "Invalid import format: {}", msg),
            ImportError::Storage(e) => write!(f, "Import storage error: {}", e),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<StorageError> for ImportError {
    fn from(e: StorageError) -> Self {
        ImportError::Storage(e)
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
