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

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::grade::Grade;
use crate::scheduler::compute_review_update;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

pub type CardId = i64;
pub type OwnerId = i64;

/// A study item together with its scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    pub answer: String,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub review: ReviewState,
}

impl Card {
    /// Returns this card with the review applied.
    pub fn reviewed(self, grade: Grade, now: Timestamp) -> Self {
        let review = compute_review_update(&self.review, grade, now);
        Self { review, ..self }
    }

    /// Returns this card with new text. The review state is kept as is.
    pub fn edited(self, edit: CardEdit) -> Self {
        Self {
            title: edit.title.unwrap_or(self.title),
            content: edit.content.unwrap_or(self.content),
            answer: edit.answer.unwrap_or(self.answer),
            ..self
        }
    }
}

/// New text for an existing card. Absent fields stay unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CardEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub answer: Option<String>,
}

impl CardEdit {
    pub fn validate(&self) -> Fallible<()> {
        if self.title.is_none() && self.content.is_none() && self.answer.is_none() {
            return fail("nothing to change: give a title, content or answer");
        }
        if self.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
            return fail("card title must not be empty");
        }
        if self
            .content
            .as_deref()
            .is_some_and(|content| content.trim().is_empty())
        {
            return fail("card content must not be empty");
        }
        Ok(())
    }
}

/// What an author supplies when creating a card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub answer: String,
}

impl NewCard {
    pub fn validate(&self) -> Fallible<()> {
        if self.title.trim().is_empty() {
            return fail("card title must not be empty");
        }
        if self.content.trim().is_empty() {
            return fail("card content must not be empty");
        }
        Ok(())
    }

    /// Assigns an id and the initial review state.
    pub fn into_card(self, id: CardId, created_at: Timestamp) -> Card {
        Card {
            id,
            owner_id: self.owner_id,
            title: self.title,
            content: self.content,
            answer: self.answer,
            created_at,
            review: ReviewState::new(created_at),
        }
    }
}
