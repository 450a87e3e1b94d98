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


//! WASM bindings for SuperCard: the scheduler and a card book kept in the
//! browser's localStorage.

use std::fmt::Display;

use wasm_bindgen::prelude::*;
use web_sys::console;

use supercard_core::Card;
use supercard_core::CardEdit;
use supercard_core::CardId;
use supercard_core::Grade;
use supercard_core::NewCard;
use supercard_core::Outcome;
use supercard_core::OwnerId;
use supercard_core::Page;
use supercard_core::ReviewState;
use supercard_core::Timestamp;

mod book;
mod storage;

use book::Book;
use storage::Storage;

const STORAGE_KEY: &str = "supercard_cards";

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    console::log_1(&"supercard WASM initialized".into());
}

fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_timestamp(s: &str) -> Result<Timestamp, JsValue> {
    Timestamp::try_from(s.to_string()).map_err(js_error)
}

fn parse_state(state_json: &str) -> Result<ReviewState, JsValue> {
    let state: ReviewState = serde_json::from_str(state_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse review state: {}", e)))?;
    state.validate().map_err(js_error)?;
    Ok(state)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

/// Apply a graded review to a serialized review state.
/// grade: "easy", "good", "hard", or "fail"
#[wasm_bindgen]
pub fn compute_review_update(
    state_json: &str,
    grade_str: &str,
    now_str: &str,
) -> Result<String, JsValue> {
    let state = parse_state(state_json)?;
    let grade = Grade::try_from(grade_str.to_string()).map_err(js_error)?;
    let now = parse_timestamp(now_str)?;
    to_json(&supercard_core::compute_review_update(&state, grade, now))
}

/// Apply a pass/fail review to a serialized review state.
#[wasm_bindgen]
pub fn compute_outcome_update(
    state_json: &str,
    success: bool,
    now_str: &str,
) -> Result<String, JsValue> {
    let state = parse_state(state_json)?;
    let now = parse_timestamp(now_str)?;
    let outcome = Outcome::from(success);
    to_json(&supercard_core::compute_outcome_update(&state, outcome, now))
}

#[wasm_bindgen]
pub fn is_due(next_review_at: &str, now_str: &str) -> Result<bool, JsValue> {
    let next = parse_timestamp(next_review_at)?;
    let now = parse_timestamp(now_str)?;
    Ok(supercard_core::is_due(next, now))
}

/// The review state of a card authored at `now`.
#[wasm_bindgen]
pub fn new_review_state(now_str: &str) -> Result<String, JsValue> {
    let now = parse_timestamp(now_str)?;
    to_json(&ReviewState::new(now))
}

/// Get the current local time in timestamp form.
#[wasm_bindgen]
pub fn now_timestamp() -> String {
    let date = js_sys::Date::new_0();
    let year = date.get_full_year();
    let month = date.get_month() + 1;
    let day = date.get_date();
    let hours = date.get_hours();
    let minutes = date.get_minutes();
    let seconds = date.get_seconds();
    let millis = date.get_milliseconds();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}",
        year, month, day, hours, minutes, seconds, millis
    )
}

/// One owner's cards, persisted to localStorage after every change.
#[wasm_bindgen]
pub struct CardBook {
    owner: OwnerId,
    book: Book,
    storage: Storage,
}

#[wasm_bindgen]
impl CardBook {
    #[wasm_bindgen(constructor)]
    pub fn new(owner: OwnerId) -> Result<CardBook, JsValue> {
        let storage = Storage::open(STORAGE_KEY);
        let book = match storage.load()? {
            Some(data) => Book::from_json(&data)
                .map_err(|e| JsValue::from_str(&format!("Failed to load cards: {}", e)))?,
            None => Book::default(),
        };
        Ok(Self {
            owner,
            book,
            storage,
        })
    }

    /// Create a card. Returns it as JSON.
    #[wasm_bindgen]
    pub fn add_card(
        &mut self,
        title: &str,
        content: &str,
        answer: &str,
        now_str: &str,
    ) -> Result<String, JsValue> {
        let now = parse_timestamp(now_str)?;
        let new_card = NewCard {
            owner_id: self.owner,
            title: title.to_string(),
            content: content.to_string(),
            answer: answer.to_string(),
        };
        let card = self.book.add(new_card, now).map_err(js_error)?;
        self.save()?;
        to_json(&card)
    }

    /// Grade a card. Returns the updated card as JSON.
    #[wasm_bindgen]
    pub fn review_card(
        &mut self,
        id: CardId,
        grade_str: &str,
        now_str: &str,
    ) -> Result<String, JsValue> {
        let grade = Grade::try_from(grade_str.to_string()).map_err(js_error)?;
        let now = parse_timestamp(now_str)?;
        let card = self
            .book
            .review(id, self.owner, grade, now)
            .map_err(js_error)?;
        self.save()?;
        to_json(&card)
    }

    /// Change a card's text; `undefined` fields are left as they are.
    /// Returns the updated card as JSON.
    #[wasm_bindgen]
    pub fn edit_card(
        &mut self,
        id: CardId,
        title: Option<String>,
        content: Option<String>,
        answer: Option<String>,
    ) -> Result<String, JsValue> {
        let edit = CardEdit {
            title,
            content,
            answer,
        };
        let card = self.book.edit(id, self.owner, edit).map_err(js_error)?;
        self.save()?;
        to_json(&card)
    }

    /// Returns whether the card existed.
    #[wasm_bindgen]
    pub fn delete_card(&mut self, id: CardId) -> Result<bool, JsValue> {
        let deleted = self.book.delete(id, self.owner);
        if deleted {
            self.save()?;
        }
        Ok(deleted)
    }

    /// A page of the cards due on `now`'s day, oldest first, as JSON.
    #[wasm_bindgen]
    pub fn due_cards(&self, now_str: &str, page: usize, limit: usize) -> Result<String, JsValue> {
        let now = parse_timestamp(now_str)?;
        let page = Page::new(page, limit).map_err(js_error)?;
        to_json(&self.book.due(self.owner, now, page))
    }

    /// A page of all cards, oldest first, as JSON.
    #[wasm_bindgen]
    pub fn all_cards(&self, page: usize, limit: usize) -> Result<String, JsValue> {
        let page = Page::new(page, limit).map_err(js_error)?;
        let cards: Vec<Card> = self.book.all(self.owner, page);
        to_json(&cards)
    }

    #[wasm_bindgen]
    pub fn card_count(&self) -> usize {
        self.book.count(self.owner)
    }

    fn save(&self) -> Result<(), JsValue> {
        let data = self
            .book
            .to_json()
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize cards: {}", e)))?;
        self.storage.save(&data)
    }
}
