use thiserror::Error;

/// Errors a method handler can surface to the caller.
///
/// Every variant maps to a stable JSON-RPC error object in
/// `rpc::codec::app_error_to_json_rpc`; none of them terminate the
/// connection or the accept loop.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown setting: {name}")]
    UnknownSetting { name: String },
    #[error("invalid params: {message}")]
    InvalidParams { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn unknown_setting(name: impl Into<String>) -> Self {
        Self::UnknownSetting { name: name.into() }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
