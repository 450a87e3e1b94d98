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


//! The browser's card collection, independent of any JS types so it can be
//! tested natively.

use serde::Deserialize;
use serde::Serialize;
use supercard_core::Card;
use supercard_core::CardEdit;
use supercard_core::CardId;
use supercard_core::Fallible;
use supercard_core::Grade;
use supercard_core::NewCard;
use supercard_core::OwnerId;
use supercard_core::Page;
use supercard_core::Timestamp;
use supercard_core::fail;
use supercard_core::select_due;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Ids are never reused, even after the newest card is deleted.
    #[serde(default)]
    next_id: CardId,
    #[serde(default)]
    cards: Vec<Card>,
}

impl Book {
    pub fn from_json(json: &str) -> Fallible<Self> {
        let mut book: Book = serde_json::from_str(json)?;
        for card in &book.cards {
            card.review.validate()?;
        }
        let max_id = book.cards.iter().map(|card| card.id).max().unwrap_or(0);
        book.next_id = book.next_id.max(max_id.saturating_add(1));
        Ok(book)
    }

    pub fn to_json(&self) -> Fallible<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn add(&mut self, new_card: NewCard, now: Timestamp) -> Fallible<Card> {
        new_card.validate()?;
        let id = self.next_id.max(1);
        let taken = self.cards.iter().any(|card| card.id == id);
        let Some(next_id) = id.checked_add(1).filter(|_| !taken) else {
            return fail("no card ids left");
        };
        self.next_id = next_id;
        let card = new_card.into_card(id, now);
        self.cards.push(card.clone());
        Ok(card)
    }

    pub fn review(
        &mut self,
        id: CardId,
        owner: OwnerId,
        grade: Grade,
        now: Timestamp,
    ) -> Fallible<Card> {
        let Some(slot) = self
            .cards
            .iter_mut()
            .find(|card| card.id == id && card.owner_id == owner)
        else {
            return fail(format!("no card with id {id}"));
        };
        slot.review.validate()?;
        *slot = slot.clone().reviewed(grade, now);
        Ok(slot.clone())
    }

    pub fn edit(&mut self, id: CardId, owner: OwnerId, edit: CardEdit) -> Fallible<Card> {
        edit.validate()?;
        let Some(slot) = self
            .cards
            .iter_mut()
            .find(|card| card.id == id && card.owner_id == owner)
        else {
            return fail(format!("no card with id {id}"));
        };
        *slot = slot.clone().edited(edit);
        Ok(slot.clone())
    }

    /// Returns whether a card was removed.
    pub fn delete(&mut self, id: CardId, owner: OwnerId) -> bool {
        let before = self.cards.len();
        self.cards
            .retain(|card| !(card.id == id && card.owner_id == owner));
        self.cards.len() != before
    }

    /// The owner's cards, oldest first.
    fn owned(&self, owner: OwnerId) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self
            .cards
            .iter()
            .filter(|card| card.owner_id == owner)
            .collect();
        cards.sort_by_key(|card| (card.created_at, card.id));
        cards
    }

    pub fn due(&self, owner: OwnerId, now: Timestamp, page: Page) -> Vec<Card> {
        let due = select_due(self.owned(owner), now);
        page.slice(&due).iter().map(|card| (*card).clone()).collect()
    }

    pub fn all(&self, owner: OwnerId, page: Page) -> Vec<Card> {
        let cards = self.owned(owner);
        page.slice(&cards).iter().map(|card| (*card).clone()).collect()
    }

    pub fn count(&self, owner: OwnerId) -> usize {
        self.owned(owner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    fn new_card(owner_id: OwnerId, title: &str) -> NewCard {
        NewCard {
            owner_id,
            title: title.to_string(),
            content: format!("{title}?"),
            answer: String::new(),
        }
    }

    #[test]
    fn test_add_assigns_increasing_ids() -> Fallible<()> {
        let mut book = Book::default();
        let now = ts("2024-01-01T09:00:00.000");
        let a = book.add(new_card(1, "a"), now)?;
        let b = book.add(new_card(1, "b"), now)?;
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(book.delete(b.id, 1));
        let c = book.add(new_card(1, "c"), now)?;
        assert_eq!(c.id, 3);
        Ok(())
    }

    #[test]
    fn test_add_rejects_blank_card() {
        let mut book = Book::default();
        let now = ts("2024-01-01T09:00:00.000");
        assert!(book.add(new_card(1, " "), now).is_err());
        assert_eq!(book.count(1), 0);
    }

    #[test]
    fn test_review_and_due() -> Fallible<()> {
        let mut book = Book::default();
        let created = ts("2024-01-01T09:00:00.000");
        let a = book.add(new_card(1, "a"), created)?;
        book.add(new_card(1, "b"), ts("2024-01-01T10:00:00.000"))?;

        let today = ts("2024-01-01T20:00:00.000");
        assert_eq!(book.due(1, today, Page::default()).len(), 2);

        let reviewed = book.review(a.id, 1, Grade::Good, today)?;
        assert_eq!(reviewed.review.review_count, 1);
        assert_eq!(reviewed.review.next_review_at, ts("2024-01-02T20:00:00.000"));

        let due = book.due(1, today, Page::default());
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "b");

        // Due at any time of the next day.
        let tomorrow = ts("2024-01-02T00:00:01.000");
        assert_eq!(book.due(1, tomorrow, Page::default()).len(), 2);
        Ok(())
    }

    #[test]
    fn test_edit_keeps_schedule() -> Fallible<()> {
        let mut book = Book::default();
        let card = book.add(new_card(1, "a"), ts("2024-01-01T09:00:00.000"))?;
        let reviewed = book.review(card.id, 1, Grade::Easy, ts("2024-01-01T10:00:00.000"))?;
        let edit = CardEdit {
            title: Some("alpha".to_string()),
            ..CardEdit::default()
        };
        let edited = book.edit(card.id, 1, edit.clone())?;
        assert_eq!(edited.title, "alpha");
        assert_eq!(edited.review, reviewed.review);
        assert_eq!(book.all(1, Page::default()), vec![edited]);
        assert!(book.edit(card.id, 2, edit).is_err());
        assert!(book.edit(card.id, 1, CardEdit::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_exhausted_ids_fail_instead_of_overflowing() -> Fallible<()> {
        let json = format!(
            r#"{{"cards":[{{"id":{},"ownerId":1,"title":"a","content":"a","answer":"",
            "createdAt":"2024-01-01T00:00:00.000","reviewCount":0,"box":1,"intervalDays":1,
            "lastReviewAt":"2024-01-01T00:00:00.000",
            "nextReviewAt":"2024-01-01T00:00:00.000"}}]}}"#,
            CardId::MAX
        );
        let mut book = Book::from_json(&json)?;
        assert_eq!(book.count(1), 1);
        let result = book.add(new_card(1, "b"), ts("2024-01-02T00:00:00.000"));
        assert!(result.is_err());
        assert_eq!(book.count(1), 1);
        Ok(())
    }

    #[test]
    fn test_owner_scoping() -> Fallible<()> {
        let mut book = Book::default();
        let now = ts("2024-01-01T09:00:00.000");
        let mine = book.add(new_card(1, "mine"), now)?;
        book.add(new_card(2, "theirs"), now)?;
        assert_eq!(book.count(1), 1);
        assert!(book.review(mine.id, 2, Grade::Easy, now).is_err());
        assert!(!book.delete(mine.id, 2));
        assert_eq!(book.all(2, Page::default())[0].title, "theirs");
        Ok(())
    }

    #[test]
    fn test_pagination_is_oldest_first() -> Fallible<()> {
        let mut book = Book::default();
        for (i, title) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let created = ts(&format!("2024-01-01T0{i}:00:00.000"));
            book.add(new_card(1, title), created)?;
        }
        let page = book.all(1, Page::new(2, 2)?);
        let titles: Vec<&str> = page.iter().map(|card| card.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "d"]);
        assert!(book.all(1, Page::new(4, 2)?).is_empty());
        Ok(())
    }

    #[test]
    fn test_json_round_trip_keeps_next_id() -> Fallible<()> {
        let mut book = Book::default();
        let now = ts("2024-01-01T09:00:00.000");
        book.add(new_card(1, "a"), now)?;
        let b = book.add(new_card(1, "b"), now)?;
        book.delete(b.id, 1);
        let restored = Book::from_json(&book.to_json()?)?;
        assert_eq!(restored, book);
        Ok(())
    }

    #[test]
    fn test_from_json_rejects_corrupt_state() {
        let json = r#"{"cards":[{"id":1,"ownerId":1,"title":"a","content":"a","answer":"",
            "createdAt":"2024-01-01T00:00:00.000","reviewCount":0,"box":1,"intervalDays":1,
            "easeFactor":0.5,"lastReviewAt":"2024-01-01T00:00:00.000",
            "nextReviewAt":"2024-01-02T00:00:00.000"}]}"#;
        assert!(Book::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_without_next_id() -> Fallible<()> {
        let json = r#"{"cards":[{"id":4,"ownerId":1,"title":"a","content":"a","answer":"",
            "createdAt":"2024-01-01T00:00:00.000","reviewCount":0,"box":1,"intervalDays":1,
            "lastReviewAt":"2024-01-01T00:00:00.000",
            "nextReviewAt":"2024-01-01T00:00:00.000"}]}"#;
        let mut book = Book::from_json(json)?;
        assert_eq!(book.cards[0].review.ease_factor, 2.5);
        let card = book.add(new_card(1, "b"), Timestamp::try_from("2024-01-02".to_string())?)?;
        assert_eq!(card.id, 5);
        Ok(())
    }
}
