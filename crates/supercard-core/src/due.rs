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

//! Which cards are due.
//!
//! Due-ness has day granularity: a card is due if its next review falls
//! anywhere on today's calendar day or earlier. Storage backends filter with
//! `next_review_at < due_cutoff(now)` so that they agree with [`is_due`].

use crate::types::card::Card;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// Anything that carries a next review time.
pub trait Scheduled {
    fn next_review_at(&self) -> Timestamp;
}

impl Scheduled for ReviewState {
    fn next_review_at(&self) -> Timestamp {
        self.next_review_at
    }
}

impl Scheduled for Card {
    fn next_review_at(&self) -> Timestamp {
        self.review.next_review_at
    }
}

/// The exclusive upper bound on `next_review_at` for due cards: the midnight
/// that ends `now`'s calendar day.
pub fn due_cutoff(now: Timestamp) -> Timestamp {
    now.start_of_next_day()
}

pub fn is_due(next_review_at: Timestamp, now: Timestamp) -> bool {
    next_review_at < due_cutoff(now)
}

#[cfg(feature = "clock")]
pub fn is_due_now(next_review_at: Timestamp) -> bool {
    is_due(next_review_at, Timestamp::now())
}

/// The due items, in their original order.
pub fn select_due<'a, T, I>(items: I, now: Timestamp) -> Vec<&'a T>
where
    T: Scheduled + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let cutoff = due_cutoff(now);
    items
        .into_iter()
        .filter(|item| item.next_review_at() < cutoff)
        .collect()
}
