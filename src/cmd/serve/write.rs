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

use axum::Form;
use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use supercard_core::Card;
use supercard_core::CardEdit;
use supercard_core::CardId;
use supercard_core::Grade;
use supercard_core::NewCard;
use supercard_core::Outcome;
use supercard_core::Timestamp;

use crate::cmd::serve::state::ApiError;
use crate::cmd::serve::state::ServerState;

#[derive(Deserialize)]
pub struct CreateForm {
    title: String,
    content: String,
    #[serde(default)]
    answer: String,
}

pub async fn create_handler(
    State(state): State<ServerState>,
    form: Result<Form<CreateForm>, FormRejection>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let Form(form) = form?;
    let new_card = NewCard {
        owner_id: state.owner,
        title: form.title,
        content: form.content,
        answer: form.answer,
    };
    new_card.validate().map_err(ApiError::bad_request)?;
    let card = state.db()?.insert_card(new_card, Timestamp::now())?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// Either a four-way grade or the legacy pass/fail flag.
#[derive(Deserialize)]
pub struct ReviewForm {
    grade: Option<String>,
    success: Option<bool>,
}

impl ReviewForm {
    fn grade(self) -> Result<Grade, ApiError> {
        match (self.grade, self.success) {
            (Some(grade), None) => Grade::try_from(grade).map_err(ApiError::bad_request),
            (None, Some(success)) => Ok(Outcome::from(success).into()),
            (Some(_), Some(_)) => Err(ApiError::bad_request(
                "send either grade or success, not both",
            )),
            (None, None) => Err(ApiError::bad_request("missing grade")),
        }
    }
}

/// Replaces the text of a card. Fields left out of the form keep their value.
pub async fn edit_handler(
    State(state): State<ServerState>,
    id: Result<Path<CardId>, PathRejection>,
    form: Result<Form<CardEdit>, FormRejection>,
) -> Result<Json<Card>, ApiError> {
    let Path(id) = id?;
    let Form(edit) = form?;
    edit.validate().map_err(ApiError::bad_request)?;
    match state.db()?.update_card(id, state.owner, edit)? {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::NotFound),
    }
}

pub async fn review_handler(
    State(state): State<ServerState>,
    id: Result<Path<CardId>, PathRejection>,
    form: Result<Form<ReviewForm>, FormRejection>,
) -> Result<Json<Card>, ApiError> {
    let Path(id) = id?;
    let Form(form) = form?;
    let grade = form.grade()?;
    let reviewed = state
        .db()?
        .review_card(id, state.owner, grade, Timestamp::now())?;
    match reviewed {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::NotFound),
    }
}

pub async fn delete_handler(
    State(state): State<ServerState>,
    id: Result<Path<CardId>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    if state.db()?.delete_card(id, state.owner)? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ApiError::NotFound)
    }
}
