//! The method registry and per-request dispatch cycle
//!
//! Maps a raw request payload to exactly one JSON-RPC response: parse,
//! validate the envelope, resolve the method, bind parameters, invoke the
//! handler, wrap the outcome. A handler failure of any kind becomes a
//! structured error response, never a dropped connection.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::rpc::codec::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::settings::SettingsStore;

/// A registered method: a pure function of (bound parameters, settings
/// store) to a JSON result or a domain error.
pub type Handler = fn(&Params<'_>, &SettingsStore) -> Result<Value, AppError>;

/// The request's `params` field, bindable as named or positional arguments.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    value: Option<&'a Value>,
}

impl<'a> Params<'a> {
    pub fn new(value: Option<&'a Value>) -> Self {
        Self { value }
    }

    /// Zero-argument methods reject anything but absent or empty params.
    pub fn ensure_empty(&self) -> Result<(), AppError> {
        match self.value {
            None => Ok(()),
            Some(Value::Object(map)) if map.is_empty() => Ok(()),
            Some(Value::Array(items)) if items.is_empty() => Ok(()),
            Some(_) => Err(AppError::invalid_params("method takes no parameters")),
        }
    }

    fn lookup(&self, index: usize, name: &str) -> Option<&'a Value> {
        match self.value {
            Some(Value::Object(map)) => map.get(name),
            Some(Value::Array(items)) => items.get(index),
            _ => None,
        }
    }

    pub fn str_arg(&self, index: usize, name: &str) -> Result<&'a str, AppError> {
        self.lookup(index, name)
            .ok_or_else(|| AppError::invalid_params(format!("missing required parameter: {name}")))?
            .as_str()
            .ok_or_else(|| AppError::invalid_params(format!("parameter {name} must be a string")))
    }

    pub fn bool_arg(&self, index: usize, name: &str) -> Result<bool, AppError> {
        self.lookup(index, name)
            .ok_or_else(|| AppError::invalid_params(format!("missing required parameter: {name}")))?
            .as_bool()
            .ok_or_else(|| AppError::invalid_params(format!("parameter {name} must be a boolean")))
    }
}

/// Exact-match, case-sensitive mapping from method name to handler.
/// Built once at startup via explicit registration; immutable thereafter.
#[derive(Default)]
pub struct Registry {
    methods: HashMap<&'static str, Handler>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Names must be unique.
    pub fn with(mut self, name: &'static str, handler: Handler) -> Self {
        let previous = self.methods.insert(name, handler);
        debug_assert!(previous.is_none(), "duplicate method registration");
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Resolves one raw request payload to at most one response.
    ///
    /// Returns `None` only for a well-formed request carrying no `id`:
    /// the method still runs, but nothing is written back. Malformed
    /// payloads always produce an error response (with a null id when no
    /// id is recoverable).
    pub fn dispatch(&self, store: &SettingsStore, raw: &[u8]) -> Option<Value> {
        let payload: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(_) => return Some(json_rpc_error(None, PARSE_ERROR, "Parse error")),
        };

        let Some(object) = payload.as_object() else {
            return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
        };

        let id = object.get("id").cloned();
        if object.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return Some(json_rpc_error(id, INVALID_REQUEST, "Invalid Request"));
        }

        let Some(method) = object
            .get("method")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
        else {
            return Some(json_rpc_error(id, INVALID_REQUEST, "Invalid Request"));
        };

        let params = Params::new(object.get("params"));
        let response = match self.methods.get(method) {
            None => json_rpc_error(id.clone(), METHOD_NOT_FOUND, "Method not found"),
            Some(handler) => match catch_unwind(AssertUnwindSafe(|| handler(&params, store))) {
                Ok(Ok(result)) => json_rpc_result(id.clone(), result),
                Ok(Err(err)) => app_error_to_json_rpc(id.clone(), err),
                Err(_) => {
                    app_error_to_json_rpc(id.clone(), AppError::internal("handler panicked"))
                }
            },
        };

        info!(
            method = %method,
            outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
            "method dispatched"
        );

        // A request without an id gets no response on the wire.
        id.as_ref()?;
        Some(response)
    }
}
