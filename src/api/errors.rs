// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::ChainError;
use crate::storage::StorageError;

/// Wire format of every error response: `{ "error": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
    /// Non-success answer from an endpoint, as seen by a client
    Upstream {
        context: String,
        status: u16,
        message: String,
    },
    /// The request never produced an HTTP answer
    Transport(String),
}

impl ApiError {
    pub fn missing_parameters() -> Self {
        ApiError::BadRequest("Missing required parameters".to_string())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Internal(_) => 500,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Transport(_) => 502,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => msg.clone(),
            ApiError::Upstream { message, .. } => message.clone(),
            ApiError::Transport(msg) => msg.clone(),
        }
    }

    pub fn to_response(&self) -> ErrorBody {
        ErrorBody {
            error: self.message(),
        }
    }

    /// Client-side view: "{context}: {status} {message}"
    pub fn with_context(self, context: &str) -> Self {
        match self {
            ApiError::Transport(msg) => ApiError::Transport(format!("{}: {}", context, msg)),
            ApiError::Upstream { .. } => self,
            other => ApiError::Upstream {
                context: context.to_string(),
                status: other.status_code(),
                message: other.message(),
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Upstream {
                context,
                status,
                message,
            } => write!(f, "{}: {} {}", context, status, message),
            ApiError::Transport(msg) => write!(f, "Request failed: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ChainError> for ApiError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::NotFound(id) => ApiError::NotFound(format!("Object not found: {}", id)),
            ChainError::InvalidAddress(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(id) => ApiError::NotFound(format!("Blob not found: {}", id)),
            StorageError::InvalidBlobId(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
