use tabshelf::types::errors::*;

// === StorageError Tests ===

#[test]
fn storage_error_display_variants() {
    assert_eq!(
        StorageError::DatabaseError("disk full".to_string()).to_string(),
        "Storage database error: disk full"
    );
    assert!(StorageError::SerializationError("eof".to_string())
        .to_string()
        .contains("eof"));
}

#[test]
fn storage_error_from_serde_json() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: StorageError = parse_err.into();
    assert!(matches!(err, StorageError::SerializationError(_)));
}

#[test]
fn storage_error_from_rusqlite() {
    let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, StorageError::DatabaseError(_)));
}

// === SyncError Tests ===

#[test]
fn sync_error_display_variants() {
    assert_eq!(
        SyncError::AuthError("Bad credentials".to_string()).to_string(),
        "Gist authentication failed: Bad credentials"
    );
    assert_eq!(SyncError::NotFound("g1".to_string()).to_string(), "Gist not found: g1");
    assert_eq!(
        SyncError::RemoteError { status: 502, message: "Bad Gateway".to_string() }.to_string(),
        "Gist API error (502): Bad Gateway"
    );
    assert_eq!(
        SyncError::NetworkError("timed out".to_string()).to_string(),
        "Gist network error: timed out"
    );
    assert_eq!(
        SyncError::MalformedRemote("expected array".to_string()).to_string(),
        "Malformed remote content: expected array"
    );
}

#[test]
fn sync_error_only_network_is_retryable() {
    assert!(SyncError::NetworkError("reset".to_string()).is_retryable());
    assert!(!SyncError::AuthError("x".to_string()).is_retryable());
    assert!(!SyncError::NotFound("x".to_string()).is_retryable());
    assert!(!SyncError::RemoteError { status: 500, message: String::new() }.is_retryable());
    assert!(!SyncError::Storage(StorageError::DatabaseError("x".to_string())).is_retryable());
}

#[test]
fn sync_error_wraps_storage_error() {
    let err: SyncError = StorageError::DatabaseError("locked".to_string()).into();
    assert_eq!(err.to_string(), "Sync storage error: Storage database error: locked");
}

#[test]
fn sync_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(SyncError::NotFound("g".to_string()));
    assert!(err.source().is_none());
}

// === CollectionError Tests ===

#[test]
fn collection_error_display_variants() {
    assert_eq!(
        CollectionError::NotFound("c1".to_string()).to_string(),
        "Collection not found: c1"
    );
    assert_eq!(CollectionError::TabNotFound("t1".to_string()).to_string(), "Tab not found: t1");
    assert_eq!(
        CollectionError::DuplicateUrl("https://x.com/a".to_string()).to_string(),
        "Duplicate tab URL: https://x.com/a"
    );
    assert_eq!(CollectionError::InvalidIndex(7).to_string(), "Invalid tab index: 7");
}

// === ImportError Tests ===

#[test]
fn import_error_display_variants() {
    assert_eq!(
        ImportError::InvalidFormat("not json".to_string()).to_string(),
        "Invalid import format: not json"
    );
    let wrapped: ImportError = StorageError::DatabaseError("x".to_string()).into();
    assert!(wrapped.to_string().starts_with("Import storage error:"));
}

// === SettingsError Tests ===

#[test]
fn settings_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(SettingsError::InvalidKey("k".to_string()));
    assert!(err.to_string().contains('k'));
}
