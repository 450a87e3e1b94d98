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

use supercard_core::Card;
use supercard_core::CardEdit;
use supercard_core::CardId;
use supercard_core::Grade;
use supercard_core::NewCard;
use supercard_core::Outcome;
use supercard_core::Page;
use supercard_core::Timestamp;
use supercard_core::is_due;

use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;
use crate::error::fail;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CardListing {
    /// Only cards due today.
    Due,
    All,
}

/// Turns the `review` arguments into a grade. Exactly one of the two must be
/// given; the pass/fail form maps success to good and failure to fail.
pub fn parse_answer(grade: Option<String>, outcome: Option<String>) -> Fallible<Grade> {
    match (grade, outcome) {
        (Some(grade), None) => Ok(Grade::try_from(grade)?),
        (None, Some(outcome)) => Ok(Outcome::try_from(outcome)?.into()),
        (Some(_), Some(_)) => fail("give either a grade or an outcome, not both"),
        (None, None) => fail("a grade (easy, good, hard, fail) or --outcome is required"),
    }
}

pub fn add_card(config: &Config, title: String, content: String, answer: String) -> Fallible<()> {
    let db = Database::open(&config.database)?;
    let new_card = NewCard {
        owner_id: config.owner,
        title,
        content,
        answer,
    };
    let card = db.insert_card(new_card, Timestamp::now())?;
    println!("Created card {}.", card.id);
    Ok(())
}

pub fn edit_card(config: &Config, id: CardId, edit: CardEdit) -> Fallible<()> {
    edit.validate()?;
    let mut db = Database::open(&config.database)?;
    match db.update_card(id, config.owner, edit)? {
        Some(card) => {
            println!("{}", describe(&card, Timestamp::now()));
            Ok(())
        }
        None => fail(format!("no card with id {id}")),
    }
}

pub fn review_card(config: &Config, id: CardId, grade: Grade) -> Fallible<()> {
    let mut db = Database::open(&config.database)?;
    match db.review_card(id, config.owner, grade, Timestamp::now())? {
        Some(card) => {
            println!("{}", describe(&card, Timestamp::now()));
            Ok(())
        }
        None => fail(format!("no card with id {id}")),
    }
}

pub fn list_cards(
    config: &Config,
    listing: CardListing,
    page: usize,
    limit: Option<usize>,
) -> Fallible<()> {
    let page = Page::new(page, limit.unwrap_or(config.page_size))?;
    let db = Database::open(&config.database)?;
    let now = Timestamp::now();
    let (cards, total) = match listing {
        CardListing::Due => (
            db.due_page(config.owner, now, page)?,
            db.count_due(config.owner, now)?,
        ),
        CardListing::All => (
            db.cards_page(config.owner, page)?,
            db.count_cards(config.owner)?,
        ),
    };
    if total == 0 {
        match listing {
            CardListing::Due => println!("No cards due today."),
            CardListing::All => println!("No cards."),
        }
        return Ok(());
    }
    for card in cards.iter() {
        println!("{}", describe(card, now));
    }
    println!(
        "Page {} ({} of {} cards).",
        page.number(),
        cards.len(),
        total
    );
    Ok(())
}

pub fn show_card(config: &Config, id: CardId) -> Fallible<()> {
    let db = Database::open(&config.database)?;
    match db.get_card(id, config.owner)? {
        Some(card) => {
            println!("{}", describe(&card, Timestamp::now()));
            println!();
            println!("{}", card.content);
            if !card.answer.is_empty() {
                println!("---");
                println!("{}", card.answer);
            }
            Ok(())
        }
        None => fail(format!("no card with id {id}")),
    }
}

pub fn delete_card(config: &Config, id: CardId) -> Fallible<()> {
    let db = Database::open(&config.database)?;
    if db.delete_card(id, config.owner)? {
        println!("Deleted card {id}.");
        Ok(())
    } else {
        fail(format!("no card with id {id}"))
    }
}

/// One line per card.
fn describe(card: &Card, now: Timestamp) -> String {
    let review = &card.review;
    let marker = if is_due(review.next_review_at, now) {
        "*"
    } else {
        " "
    };
    format!(
        "{marker} {:>4}  {}  [box {}, {} reviews, every {}d, ease {:.2}] next {}",
        card.id,
        card.title,
        review.leitner_box,
        review.review_count,
        review.interval_days,
        review.ease_factor,
        review.next_review_at.date()
    )
}
