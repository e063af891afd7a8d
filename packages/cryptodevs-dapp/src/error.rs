//! Error types for the service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cryptodevs_types::AbiError;
use std::fmt;

/// Service error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// JSON-RPC transport or node error.
    Rpc(String),
    /// Wallet bridge refused or is unreachable.
    Wallet(String),
    /// Contract call could not be encoded or its result decoded.
    Abi(AbiError),
    /// Transaction reverted or never confirmed.
    Transaction(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Rpc(msg) => write!(f, "rpc error: {msg}"),
            Error::Wallet(msg) => write!(f, "wallet error: {msg}"),
            Error::Abi(e) => write!(f, "abi error: {e}"),
            Error::Transaction(msg) => write!(f, "transaction error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Abi(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AbiError> for Error {
    fn from(e: AbiError) -> Self {
        Error::Abi(e)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Rpc(_) | Error::Wallet(_) => StatusCode::BAD_GATEWAY,
            Error::Abi(AbiError::UnknownMintKind(_)) => StatusCode::BAD_REQUEST,
            Error::Abi(_) => StatusCode::BAD_GATEWAY,
            Error::Transaction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string()
        });
        (status, Json(body)).into_response()
    }
}
