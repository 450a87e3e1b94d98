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

//! SQLite card store.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::Params;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use supercard_core::Card;
use supercard_core::CardEdit;
use supercard_core::CardId;
use supercard_core::Grade;
use supercard_core::NewCard;
use supercard_core::OwnerId;
use supercard_core::Page;
use supercard_core::ReviewState;
use supercard_core::Timestamp;
use supercard_core::due_cutoff;
use supercard_core::types::review_state::DEFAULT_EASE_FACTOR;

use crate::error::ErrorReport;
use crate::error::Fallible;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    answer TEXT NOT NULL DEFAULT '',
    review_count INTEGER NOT NULL DEFAULT 0,
    box INTEGER NOT NULL DEFAULT 1,
    interval_days INTEGER NOT NULL DEFAULT 1,
    ease_factor REAL,
    last_review_at TEXT NOT NULL,
    next_review_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cards_owner_next_review ON cards(owner_id, next_review_at);
CREATE INDEX IF NOT EXISTS idx_cards_owner_created ON cards(owner_id, created_at);
"#;

const COLUMNS: &str = "id, owner_id, title, content, answer, review_count, box, interval_days, \
                       ease_factor, last_review_at, next_review_at, created_at";

const TIMESTAMP_COLUMNS: [&str; 3] = ["last_review_at", "next_review_at", "created_at"];

/// Matches the text written by `Timestamp`'s `Display`. In GLOB, `.` is literal.
const CANONICAL_TIMESTAMP: &str =
    "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]T[0-9][0-9]:[0-9][0-9]:[0-9][0-9].[0-9][0-9][0-9]";

/// How long a writer waits for another writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Fallible<Self> {
        log::debug!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Fallible<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        normalize_timestamps(&mut conn)?;
        Ok(Self { conn })
    }

    /// Stores a new card, due immediately.
    pub fn insert_card(&self, card: NewCard, now: Timestamp) -> Fallible<Card> {
        card.validate()?;
        let review = ReviewState::new(now);
        self.conn.execute(
            "INSERT INTO cards (owner_id, title, content, answer, review_count, box, interval_days, \
             ease_factor, last_review_at, next_review_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                card.owner_id,
                card.title,
                card.content,
                card.answer,
                review.review_count,
                review.leitner_box,
                review.interval_days,
                review.ease_factor,
                review.last_review_at.to_string(),
                review.next_review_at.to_string(),
                now.to_string(),
            ],
        )?;
        let id: CardId = self.conn.last_insert_rowid();
        log::debug!("Inserted card {id} for owner {}", card.owner_id);
        Ok(card.into_card(id, now))
    }

    pub fn get_card(&self, id: CardId, owner: OwnerId) -> Fallible<Option<Card>> {
        find_card(&self.conn, id, owner)
    }

    /// All of an owner's cards, oldest first.
    pub fn cards_page(&self, owner: OwnerId, page: Page) -> Fallible<Vec<Card>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM cards WHERE owner_id = ?1 \
             ORDER BY created_at ASC, id ASC LIMIT ?2 OFFSET ?3"
        );
        self.query_cards(&sql, params![owner, sql_int(page.limit()), sql_int(page.offset())])
    }

    /// An owner's due cards, oldest first.
    pub fn due_page(&self, owner: OwnerId, now: Timestamp, page: Page) -> Fallible<Vec<Card>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM cards WHERE owner_id = ?1 AND next_review_at < ?2 \
             ORDER BY created_at ASC, id ASC LIMIT ?3 OFFSET ?4"
        );
        let cutoff = due_cutoff(now).to_string();
        self.query_cards(
            &sql,
            params![owner, cutoff, sql_int(page.limit()), sql_int(page.offset())],
        )
    }

    pub fn count_cards(&self, owner: OwnerId) -> Fallible<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cards WHERE owner_id = ?1",
            params![owner],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_due(&self, owner: OwnerId, now: Timestamp) -> Fallible<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cards WHERE owner_id = ?1 AND next_review_at < ?2",
            params![owner, due_cutoff(now).to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Applies a review to a stored card and writes the result back.
    ///
    /// The read and the write happen in one immediate transaction, so
    /// concurrent reviews of the same card are applied one after the other
    /// rather than overwriting each other. Returns `None` if the owner has no
    /// card with this id.
    pub fn review_card(
        &mut self,
        id: CardId,
        owner: OwnerId,
        grade: Grade,
        now: Timestamp,
    ) -> Fallible<Option<Card>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(card) = find_card(&tx, id, owner)? else {
            return Ok(None);
        };
        card.review.validate()?;
        let card = card.reviewed(grade, now);
        let review = &card.review;
        tx.execute(
            "UPDATE cards SET review_count = ?1, box = ?2, interval_days = ?3, ease_factor = ?4, \
             last_review_at = ?5, next_review_at = ?6 WHERE id = ?7",
            params![
                review.review_count,
                review.leitner_box,
                review.interval_days,
                review.ease_factor,
                review.last_review_at.to_string(),
                review.next_review_at.to_string(),
                id,
            ],
        )?;
        tx.commit()?;
        log::debug!(
            "Reviewed card {id} as {}: next review at {} ({} days)",
            grade.as_str(),
            review.next_review_at,
            review.interval_days
        );
        Ok(Some(card))
    }

    /// Replaces a card's text, leaving its review state alone. Returns `None`
    /// if the owner has no card with this id.
    pub fn update_card(
        &mut self,
        id: CardId,
        owner: OwnerId,
        edit: CardEdit,
    ) -> Fallible<Option<Card>> {
        edit.validate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(card) = find_card(&tx, id, owner)? else {
            return Ok(None);
        };
        let card = card.edited(edit);
        tx.execute(
            "UPDATE cards SET title = ?1, content = ?2, answer = ?3 WHERE id = ?4",
            params![card.title, card.content, card.answer, id],
        )?;
        tx.commit()?;
        log::debug!("Edited card {id}");
        Ok(Some(card))
    }

    /// Returns whether a card was deleted.
    pub fn delete_card(&self, id: CardId, owner: OwnerId) -> Fallible<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM cards WHERE id = ?1 AND owner_id = ?2",
            params![id, owner],
        )?;
        Ok(deleted > 0)
    }

    fn query_cards(&self, sql: &str, params: impl Params) -> Fallible<Vec<Card>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(read_card(row)?);
        }
        Ok(cards)
    }
}

/// Rewrites timestamps stored in another accepted shape (date only, with a
/// `Z` or offset, without milliseconds) into the canonical text, so that the
/// text comparison in the due filter agrees with `is_due`.
fn normalize_timestamps(conn: &mut Connection) -> Fallible<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut rewritten = 0;
    for column in TIMESTAMP_COLUMNS {
        let stale: Vec<(CardId, String)> = {
            let sql = format!("SELECT id, {column} FROM cards WHERE {column} NOT GLOB ?1");
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(params![CANONICAL_TIMESTAMP], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        for (id, value) in stale {
            let canonical = match Timestamp::try_from(value) {
                Ok(timestamp) => timestamp.to_string(),
                Err(e) => {
                    log::warn!("Card {id} has an unreadable {column}: {e}");
                    continue;
                }
            };
            let sql = format!("UPDATE cards SET {column} = ?1 WHERE id = ?2");
            tx.execute(&sql, params![canonical, id])?;
            rewritten += 1;
        }
    }
    tx.commit()?;
    if rewritten > 0 {
        log::info!("Rewrote {rewritten} stored timestamps into canonical form");
    }
    Ok(())
}

fn find_card(conn: &Connection, id: CardId, owner: OwnerId) -> Fallible<Option<Card>> {
    let sql = format!("SELECT {COLUMNS} FROM cards WHERE id = ?1 AND owner_id = ?2");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id, owner])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_card(row)?)),
        None => Ok(None),
    }
}

fn read_card(row: &Row) -> Fallible<Card> {
    let id: CardId = row.get("id")?;
    let review = ReviewState {
        review_count: read_count(row, id, "review_count")?,
        leitner_box: read_count(row, id, "box")?,
        interval_days: read_count(row, id, "interval_days")?,
        ease_factor: row
            .get::<_, Option<f64>>("ease_factor")?
            .unwrap_or(DEFAULT_EASE_FACTOR),
        last_review_at: read_timestamp(row, "last_review_at")?,
        next_review_at: read_timestamp(row, "next_review_at")?,
    };
    Ok(Card {
        id,
        owner_id: row.get("owner_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        answer: row.get("answer")?,
        created_at: read_timestamp(row, "created_at")?,
        review,
    })
}

fn read_count(row: &Row, id: CardId, column: &str) -> Fallible<u32> {
    let value: i64 = row.get(column)?;
    u32::try_from(value)
        .map_err(|_| ErrorReport::new(format!("card {id} has an invalid {column}: {value}")))
}

fn read_timestamp(row: &Row, column: &str) -> Fallible<Timestamp> {
    let value: String = row.get(column)?;
    Ok(Timestamp::try_from(value)?)
}

fn sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::thread;

    use tempfile::tempdir;

    use super::*;

    const OWNER: OwnerId = 1;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    fn new_card(owner_id: OwnerId, title: &str) -> NewCard {
        NewCard {
            owner_id,
            title: title.to_string(),
            content: format!("What is {title}?"),
            answer: String::new(),
        }
    }

    #[test]
    fn test_insert_and_get() -> Fallible<()> {
        let db = Database::in_memory()?;
        let now = ts("2024-01-01T09:00:00.000");
        let card = db.insert_card(new_card(OWNER, "ownership"), now)?;
        let stored = db.get_card(card.id, OWNER)?.unwrap();
        assert_eq!(stored, card);
        assert_eq!(stored.review, ReviewState::new(now));
        Ok(())
    }

    #[test]
    fn test_insert_rejects_blank_title() -> Fallible<()> {
        let db = Database::in_memory()?;
        let result = db.insert_card(new_card(OWNER, ""), ts("2024-01-01"));
        assert!(result.is_err());
        assert_eq!(db.count_cards(OWNER)?, 0);
        Ok(())
    }

    #[test]
    fn test_cards_are_scoped_by_owner() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let now = ts("2024-01-01T09:00:00.000");
        let card = db.insert_card(new_card(OWNER, "lifetimes"), now)?;
        assert!(db.get_card(card.id, 2)?.is_none());
        assert!(db.review_card(card.id, 2, Grade::Good, now)?.is_none());
        assert!(!db.delete_card(card.id, 2)?);
        assert_eq!(db.count_cards(2)?, 0);
        assert_eq!(db.count_cards(OWNER)?, 1);
        Ok(())
    }

    #[test]
    fn test_review_persists_new_state() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let card = db.insert_card(new_card(OWNER, "traits"), ts("2024-01-01T09:00:00.000"))?;

        let first = db
            .review_card(card.id, OWNER, Grade::Good, ts("2024-01-01T10:00:00.000"))?
            .unwrap();
        assert_eq!(first.review.review_count, 1);
        assert_eq!(first.review.leitner_box, 2);
        assert_eq!(first.review.next_review_at, ts("2024-01-02T10:00:00.000"));

        let second = db
            .review_card(card.id, OWNER, Grade::Easy, ts("2024-01-02T10:00:00.000"))?
            .unwrap();
        assert_eq!(second.review.interval_days, 6);
        assert_eq!(second.review.leitner_box, 3);
        assert_eq!(db.get_card(card.id, OWNER)?.unwrap(), second);
        Ok(())
    }

    #[test]
    fn test_review_of_missing_card() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        assert!(db.review_card(99, OWNER, Grade::Fail, ts("2024-01-01"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_due_page_uses_day_granularity() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let created = ts("2024-01-01T09:00:00.000");
        let a = db.insert_card(new_card(OWNER, "a"), created)?;
        let b = db.insert_card(new_card(OWNER, "b"), created)?;
        let c = db.insert_card(new_card(OWNER, "c"), created)?;
        // a: due 2024-01-02 at 23:00, b: due 2024-01-03 at 00:00, c: stays due.
        db.review_card(a.id, OWNER, Grade::Good, ts("2024-01-01T23:00:00.000"))?;
        db.review_card(b.id, OWNER, Grade::Good, ts("2024-01-02T00:00:00.000"))?;

        let now = ts("2024-01-02T08:00:00.000");
        let due: Vec<CardId> = db
            .due_page(OWNER, now, Page::default())?
            .iter()
            .map(|card| card.id)
            .collect();
        assert_eq!(due, vec![a.id, c.id]);
        assert_eq!(db.count_due(OWNER, now)?, 2);

        // The in-memory selector agrees with the storage filter.
        let all = db.cards_page(OWNER, Page::all())?;
        let selected: Vec<CardId> = supercard_core::select_due(&all, now)
            .iter()
            .map(|card| card.id)
            .collect();
        assert_eq!(selected, due);
        Ok(())
    }

    #[test]
    fn test_pagination() -> Fallible<()> {
        let db = Database::in_memory()?;
        let mut at = ts("2024-01-01T09:00:00.000");
        for i in 0..5 {
            db.insert_card(new_card(OWNER, &format!("card {i}")), at)?;
            at = at.plus_days(1);
        }
        let titles = |page: Page| -> Fallible<Vec<String>> {
            Ok(db
                .cards_page(OWNER, page)?
                .into_iter()
                .map(|card| card.title)
                .collect())
        };
        assert_eq!(titles(Page::new(1, 2)?)?, vec!["card 0", "card 1"]);
        assert_eq!(titles(Page::new(3, 2)?)?, vec!["card 4"]);
        assert!(titles(Page::new(4, 2)?)?.is_empty());

        let due = db.due_page(OWNER, ts("2024-01-03T12:00:00.000"), Page::new(2, 2)?)?;
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].title, "card 2");
        Ok(())
    }

    #[test]
    fn test_update_keeps_review_state() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let card = db.insert_card(new_card(OWNER, "closures"), ts("2024-01-01T09:00:00.000"))?;
        let reviewed = db
            .review_card(card.id, OWNER, Grade::Hard, ts("2024-01-01T10:00:00.000"))?
            .unwrap();

        let edit = CardEdit {
            title: Some("closures and captures".to_string()),
            content: None,
            answer: Some("By reference, unless `move`.".to_string()),
        };
        let edited = db.update_card(card.id, OWNER, edit)?.unwrap();
        assert_eq!(edited.title, "closures and captures");
        assert_eq!(edited.content, card.content);
        assert_eq!(edited.answer, "By reference, unless `move`.");
        assert_eq!(edited.review, reviewed.review);
        assert_eq!(edited.created_at, card.created_at);
        assert_eq!(db.get_card(card.id, OWNER)?.unwrap(), edited);
        Ok(())
    }

    #[test]
    fn test_update_rejections() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let card = db.insert_card(new_card(OWNER, "macros"), ts("2024-01-01"))?;
        let rename = CardEdit {
            title: Some("hygiene".to_string()),
            ..CardEdit::default()
        };
        assert!(db.update_card(card.id, 2, rename.clone())?.is_none());
        assert!(db.update_card(99, OWNER, rename)?.is_none());
        assert!(db.update_card(card.id, OWNER, CardEdit::default()).is_err());
        let blank = CardEdit {
            content: Some("  ".to_string()),
            ..CardEdit::default()
        };
        assert!(db.update_card(card.id, OWNER, blank).is_err());
        assert_eq!(db.get_card(card.id, OWNER)?.unwrap(), card);
        Ok(())
    }

    #[test]
    fn test_other_timestamp_shapes_are_rewritten_on_open() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cards.db");
        let created = ts("2024-01-01T09:00:00.000");
        let (date_only, utc) = {
            let db = Database::open(&path)?;
            let a = db.insert_card(new_card(OWNER, "date only"), created)?;
            let b = db.insert_card(new_card(OWNER, "utc"), created)?;
            db.conn.execute(
                "UPDATE cards SET next_review_at = '2024-01-03' WHERE id = ?1",
                params![a.id],
            )?;
            db.conn.execute(
                "UPDATE cards SET next_review_at = '2024-01-02T10:00:00Z', \
                 created_at = '2024-01-01' WHERE id = ?1",
                params![b.id],
            )?;
            (a.id, b.id)
        };

        let db = Database::open(&path)?;
        let stored: String = db.conn.query_row(
            "SELECT next_review_at FROM cards WHERE id = ?1",
            params![date_only],
            |row| row.get(0),
        )?;
        assert_eq!(stored, "2024-01-03T00:00:00.000");
        let card = db.get_card(utc, OWNER)?.unwrap();
        assert_eq!(card.review.next_review_at, ts("2024-01-02T10:00:00Z"));
        assert_eq!(card.created_at, ts("2024-01-01T00:00:00.000"));

        // Midnight on the 3rd is not due on the 2nd, in SQL or in memory.
        let now = ts("2024-01-02T12:00:00.000");
        let due: Vec<CardId> = db
            .due_page(OWNER, now, Page::default())?
            .iter()
            .map(|card| card.id)
            .collect();
        let all = db.cards_page(OWNER, Page::all())?;
        let selected: Vec<CardId> = supercard_core::select_due(&all, now)
            .iter()
            .map(|card| card.id)
            .collect();
        assert_eq!(due, selected);
        assert!(!due.contains(&date_only));
        assert_eq!(db.count_due(OWNER, now)?, due.len());
        Ok(())
    }

    #[test]
    fn test_delete() -> Fallible<()> {
        let db = Database::in_memory()?;
        let card = db.insert_card(new_card(OWNER, "gone"), ts("2024-01-01"))?;
        assert!(db.delete_card(card.id, OWNER)?);
        assert!(!db.delete_card(card.id, OWNER)?);
        assert!(db.get_card(card.id, OWNER)?.is_none());
        Ok(())
    }

    #[test]
    fn test_null_ease_factor_reads_as_default() -> Fallible<()> {
        let db = Database::in_memory()?;
        let card = db.insert_card(new_card(OWNER, "legacy"), ts("2024-01-01"))?;
        db.conn.execute(
            "UPDATE cards SET ease_factor = NULL WHERE id = ?1",
            params![card.id],
        )?;
        let stored = db.get_card(card.id, OWNER)?.unwrap();
        assert_eq!(stored.review.ease_factor, DEFAULT_EASE_FACTOR);
        Ok(())
    }

    #[test]
    fn test_corrupt_rows_are_reported() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        let card = db.insert_card(new_card(OWNER, "broken"), ts("2024-01-01"))?;
        db.conn.execute(
            "UPDATE cards SET interval_days = -3 WHERE id = ?1",
            params![card.id],
        )?;
        let err = db.get_card(card.id, OWNER).unwrap_err();
        assert!(err.to_string().contains("invalid interval_days"));

        db.conn.execute(
            "UPDATE cards SET interval_days = 0 WHERE id = ?1",
            params![card.id],
        )?;
        assert!(db.review_card(card.id, OWNER, Grade::Good, ts("2024-01-02")).is_err());
        Ok(())
    }

    #[test]
    fn test_concurrent_reviews_are_serialized() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cards.db");
        let id = {
            let db = Database::open(&path)?;
            db.insert_card(new_card(OWNER, "race"), ts("2024-01-01"))?.id
        };
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                thread::spawn(move || -> Fallible<()> {
                    let mut db = Database::open(&path)?;
                    db.review_card(id, OWNER, Grade::Good, ts("2024-01-02"))?;
                    Ok(())
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap()?;
        }
        let db = Database::open(&path)?;
        let card = db.get_card(id, OWNER)?.unwrap();
        assert_eq!(card.review.review_count, 4);
        assert_eq!(card.review.leitner_box, 5);
        Ok(())
    }
}
