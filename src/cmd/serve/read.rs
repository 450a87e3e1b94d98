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

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::PathRejection;
use axum::extract::rejection::QueryRejection;
use serde::Deserialize;
use supercard_core::Card;
use supercard_core::CardId;
use supercard_core::Page;
use supercard_core::Timestamp;

use crate::cmd::serve::state::ApiError;
use crate::cmd::serve::state::ServerState;

#[derive(Deserialize)]
pub struct ListQuery {
    page: Option<usize>,
    limit: Option<usize>,
    /// Only return cards due today.
    #[serde(default)]
    today: bool,
}

pub async fn list_handler(
    State(state): State<ServerState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let Query(query) = query?;
    let page = Page::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(state.page_size),
    )
    .map_err(ApiError::bad_request)?;
    let db = state.db()?;
    let cards = if query.today {
        db.due_page(state.owner, Timestamp::now(), page)?
    } else {
        db.cards_page(state.owner, page)?
    };
    Ok(Json(cards))
}

pub async fn card_handler(
    State(state): State<ServerState>,
    id: Result<Path<CardId>, PathRejection>,
) -> Result<Json<Card>, ApiError> {
    let Path(id) = id?;
    let db = state.db()?;
    match db.get_card(id, state.owner)? {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::NotFound),
    }
}
