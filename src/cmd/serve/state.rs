// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;
use supercard_core::OwnerId;

use crate::db::Database;
use crate::error::ErrorReport;

#[derive(Clone)]
pub struct ServerState {
    /// Every request acts on this owner's cards.
    pub owner: OwnerId,
    pub page_size: usize,
    pub db: Arc<Mutex<Database>>,
}

impl ServerState {
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// The request itself is malformed.
    BadRequest(String),
    NotFound,
    /// Storage failed.
    Internal(String),
}

impl ApiError {
    pub fn bad_request(err: impl ToString) -> Self {
        let message = err.to_string();
        log::warn!("Rejected request: {message}");
        ApiError::BadRequest(message)
    }
}

impl From<ErrorReport> for ApiError {
    fn from(err: ErrorReport) -> Self {
        log::error!("{err}");
        ApiError::Internal(err.to_string())
    }
}

// Extractor rejections get the same JSON body as every other bad request.

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
