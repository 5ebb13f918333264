//! RPC method handler for the tabshelf JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! appropriate managers and services via the `App` struct.

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::collection_manager::{CollectionManagerTrait, TabUpdate};
use crate::services::gist_client::GistApi;
use crate::services::import_export::{export_collections, import_collections, ImportMode};
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::collection::{CollectionColor, RawCollection};
use crate::types::sync::SyncOutcome;

const DEFAULT_HISTORY_LIMIT: usize = 20;

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn opt_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn color_param(params: &Value) -> Result<Option<CollectionColor>, String> {
    match opt_str(params, "color") {
        None => Ok(None),
        Some(name) => CollectionColor::from_name(name)
            .map(Some)
            .ok_or_else(|| format!("invalid color: {}", name)),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn outcome_json(outcome: &SyncOutcome) -> Value {
    match outcome {
        SyncOutcome::Created { handle } => json!({"outcome": outcome.label(), "handle": handle}),
        SyncOutcome::Merged { changed } => json!({"outcome": outcome.label(), "changed": changed}),
        _ => json!({"outcome": outcome.label()}),
    }
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method<A: GistApi + 'static>(app: &App<A>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Collections ───
        "collections.list" => to_json(&app.collection_manager.list_collections()),
        "collections.save" => {
            let collections: Vec<RawCollection> = params
                .get("collections")
                .cloned()
                .ok_or("missing collections")
                .and_then(|v| serde_json::from_value(v).map_err(|_| "invalid collections"))?;
            let sort = params.get("sort").and_then(|v| v.as_bool()).unwrap_or(true);
            if params.get("debounce").and_then(|v| v.as_bool()).unwrap_or(false) {
                app.save_debouncer.schedule(collections, sort);
                return Ok(json!({"scheduled": true}));
            }
            let saved = app.store.save(&collections, sort).map_err(|e| e.to_string())?;
            to_json(&saved)
        }
        "collections.flush" => {
            let saved = app.save_debouncer.flush().map_err(|e| e.to_string())?;
            let save_error = app.save_debouncer.take_last_error().map(|e| e.to_string());
            Ok(json!({"flushed": saved.is_some(), "save_error": save_error}))
        }
        "collection.create" => {
            let name = opt_str(params, "name").unwrap_or("");
            let color = color_param(params)?;
            let created = app
                .collection_manager
                .create_collection(name, color)
                .map_err(|e| e.to_string())?;
            to_json(&created)
        }
        "collection.rename" => {
            let id = str_param(params, "id")?;
            let name = str_param(params, "name")?;
            let updated = app
                .collection_manager
                .rename_collection(id, name)
                .map_err(|e| e.to_string())?;
            to_json(&updated)
        }
        "collection.set_color" => {
            let id = str_param(params, "id")?;
            let color = color_param(params)?.ok_or("missing color")?;
            let updated = app
                .collection_manager
                .set_collection_color(id, color)
                .map_err(|e| e.to_string())?;
            to_json(&updated)
        }
        "collection.delete" => {
            let id = str_param(params, "id")?;
            app.collection_manager.delete_collection(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Tabs ───
        "tab.add" => {
            let collection_id = str_param(params, "collection_id")?;
            let url = str_param(params, "url")?;
            let tab = app
                .collection_manager
                .add_tab(collection_id, url, opt_str(params, "title"), opt_str(params, "description"))
                .map_err(|e| e.to_string())?;
            to_json(&tab)
        }
        "tab.update" => {
            let collection_id = str_param(params, "collection_id")?;
            let tab_id = str_param(params, "tab_id")?;
            let update = TabUpdate {
                title: opt_str(params, "title").map(str::to_string),
                url: opt_str(params, "url").map(str::to_string),
                description: opt_str(params, "description").map(str::to_string),
            };
            let tab = app
                .collection_manager
                .update_tab(collection_id, tab_id, update)
                .map_err(|e| e.to_string())?;
            to_json(&tab)
        }
        "tab.remove" => {
            let collection_id = str_param(params, "collection_id")?;
            let tab_id = str_param(params, "tab_id")?;
            app.collection_manager
                .remove_tab(collection_id, tab_id)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.move" => {
            let from = str_param(params, "from_collection")?;
            let tab_id = str_param(params, "tab_id")?;
            let to = opt_str(params, "to_collection").unwrap_or(from);
            let index = params
                .get("index")
                .and_then(|v| v.as_u64())
                .ok_or("missing index")? as usize;
            app.collection_manager
                .move_tab(from, tab_id, to, index)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Sync ───
        "sync.connect" => {
            let token = str_param(params, "token")?;
            let handle = app.orchestrator.connect(token).await.map_err(|e| e.to_string())?;
            app.request_sync();
            Ok(json!({"connected": true, "remote_handle": handle}))
        }
        "sync.disconnect" => {
            app.orchestrator.disconnect().map_err(|e| e.to_string())?;
            Ok(json!({"connected": false}))
        }
        "sync.run" => {
            let outcome = app.orchestrator.sync().await.map_err(|e| e.to_string())?;
            Ok(outcome_json(&outcome))
        }
        "sync.status" => {
            let limit = params
                .get("limit")
                .and_then(|v| v.as_u64())
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_HISTORY_LIMIT);
            let state = app.orchestrator.status().map_err(|e| e.to_string())?;
            let history = app.store.sync_history(limit).map_err(|e| e.to_string())?;
            Ok(json!({
                "connected": state.is_connected(),
                "remote_handle": state.remote_handle,
                "last_modified": state.last_modified,
                "phase": app.orchestrator.phase(),
                "save_pending": app.save_debouncer.has_pending(),
                "history": history,
            }))
        }

        // ─── Import / export ───
        "data.export" => {
            let content = export_collections(&app.store).map_err(|e| e.to_string())?;
            Ok(json!({"content": content}))
        }
        "data.import" => {
            let content = str_param(params, "content")?;
            let mode = match opt_str(params, "mode") {
                Some(name) => ImportMode::from_name(name).ok_or_else(|| format!("invalid mode: {}", name))?,
                None => ImportMode::default(),
            };
            let imported = import_collections(&app.store, content, mode).map_err(|e| e.to_string())?;
            to_json(&imported)
        }

        // ─── Settings ───
        "settings.get" => {
            let engine = app.settings();
            to_json(engine.get_settings())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            app.settings().set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "restart_required": key.starts_with("sync.") || key.starts_with("storage.")}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
