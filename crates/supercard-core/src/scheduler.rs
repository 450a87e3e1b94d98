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

//! A simplified SM-2 scheduler.
//!
//! - Each grade maps to a quality score (easy 5, good 4, hard 3, fail 2).
//! - The ease factor moves by `-0.8 + 0.28q - 0.02q²` and never drops
//!   below 1.3.
//! - A fail resets the interval to one day. Otherwise the first review
//!   schedules one day out, the second six days, and every later review
//!   multiplies the previous interval by the new ease factor.
//! - The Leitner box moves up on a pass and down on a fail, independently of
//!   the interval.

use crate::grade::Grade;
use crate::grade::Outcome;
use crate::types::review_state::MIN_EASE_FACTOR;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// Interval after the first successful review.
const FIRST_INTERVAL: u32 = 1;

/// Interval after the second successful review.
const SECOND_INTERVAL: u32 = 6;

/// Upper bound on any interval (about a century), so that the next review
/// date is always representable.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// The ease factor after a review with the given grade.
pub fn new_ease_factor(ease_factor: f64, grade: Grade) -> f64 {
    let q: f64 = grade.into();
    let ease = ease_factor - 0.8 + 0.28 * q - 0.02 * q * q;
    ease.max(MIN_EASE_FACTOR)
}

/// The interval in days after a review, given the ease factor that review
/// produced.
pub fn new_interval(state: &ReviewState, grade: Grade, new_ease: f64) -> u32 {
    if !grade.is_pass() {
        return 1;
    }
    match state.review_count {
        0 => FIRST_INTERVAL,
        1 => SECOND_INTERVAL,
        _ => {
            let raw = (f64::from(state.interval_days) * new_ease).round();
            raw.clamp(1.0, f64::from(MAX_INTERVAL_DAYS)) as u32
        }
    }
}

fn new_box(leitner_box: u32, grade: Grade) -> u32 {
    if grade.is_pass() {
        leitner_box.saturating_add(1)
    } else {
        leitner_box.saturating_sub(1).max(1)
    }
}

/// Computes the state of a card after it is reviewed at `now`.
pub fn compute_review_update(state: &ReviewState, grade: Grade, now: Timestamp) -> ReviewState {
    let ease_factor = new_ease_factor(state.ease_factor, grade);
    let interval_days = new_interval(state, grade, ease_factor);
    ReviewState {
        review_count: state.review_count.saturating_add(1),
        leitner_box: new_box(state.leitner_box, grade),
        interval_days,
        ease_factor,
        last_review_at: now,
        next_review_at: now.plus_days(interval_days),
    }
}

/// The pass/fail form of [`compute_review_update`].
pub fn compute_outcome_update(state: &ReviewState, outcome: Outcome, now: Timestamp) -> ReviewState {
    compute_review_update(state, outcome.into(), now)
}

/// Reviews at the current local time.
#[cfg(feature = "clock")]
pub fn compute_review_update_now(state: &ReviewState, grade: Grade) -> ReviewState {
    compute_review_update(state, grade, Timestamp::now())
}
