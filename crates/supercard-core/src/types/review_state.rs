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
use crate::types::timestamp::Timestamp;

/// The ease factor of a card that has never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// The ease factor never drops below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

fn default_ease_factor() -> f64 {
    DEFAULT_EASE_FACTOR
}

/// The scheduling-relevant part of a card.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    /// The number of completed reviews.
    pub review_count: u32,
    /// The Leitner box. Goes up on a pass and down on a lapse, but never
    /// takes part in computing the interval.
    #[serde(rename = "box")]
    pub leitner_box: u32,
    /// Days between the last review and the next one.
    pub interval_days: u32,
    /// Multiplier applied to the interval on each successful review.
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f64,
    pub last_review_at: Timestamp,
    /// The card is due on or after the calendar day of this timestamp.
    pub next_review_at: Timestamp,
}

/// Where a card sits in its scheduling lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Never reviewed.
    Fresh,
    /// Reviewed exactly once.
    Learning,
    /// Reviewed at least twice.
    Reviewing,
}

impl ReviewState {
    /// The state of a freshly authored card: due immediately.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            review_count: 0,
            leitner_box: 1,
            interval_days: 1,
            ease_factor: DEFAULT_EASE_FACTOR,
            last_review_at: created_at,
            next_review_at: created_at,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.review_count {
            0 => Phase::Fresh,
            1 => Phase::Learning,
            _ => Phase::Reviewing,
        }
    }

    /// Checks the numeric invariants. Call this on state that arrives from
    /// outside (storage, the network) before handing it to the scheduler.
    pub fn validate(&self) -> Fallible<()> {
        if !self.ease_factor.is_finite() {
            return fail(format!(
                "ease factor must be a finite number, got {}",
                self.ease_factor
            ));
        }
        if self.ease_factor < MIN_EASE_FACTOR {
            return fail(format!(
                "ease factor must be at least {MIN_EASE_FACTOR}, got {}",
                self.ease_factor
            ));
        }
        if self.interval_days == 0 {
            return fail("interval must be at least one day");
        }
        if self.leitner_box == 0 {
            return fail("box must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_timestamp(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn test_new_card_defaults() {
        let created_at = make_timestamp("2024-01-01T09:00:00.000");
        let state = ReviewState::new(created_at);
        assert_eq!(state.review_count, 0);
        assert_eq!(state.leitner_box, 1);
        assert_eq!(state.interval_days, 1);
        assert_eq!(state.ease_factor, 2.5);
        assert_eq!(state.last_review_at, created_at);
        assert_eq!(state.next_review_at, created_at);
        assert_eq!(state.phase(), Phase::Fresh);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_phase_follows_review_count() {
        let mut state = ReviewState::new(make_timestamp("2024-01-01T09:00:00.000"));
        state.review_count = 1;
        assert_eq!(state.phase(), Phase::Learning);
        state.review_count = 2;
        assert_eq!(state.phase(), Phase::Reviewing);
        state.review_count = 40;
        assert_eq!(state.phase(), Phase::Reviewing);
    }

    #[test]
    fn test_validate_rejects_broken_state() {
        let base = ReviewState::new(make_timestamp("2024-01-01T09:00:00.000"));
        let cases = [
            ReviewState {
                ease_factor: f64::NAN,
                ..base
            },
            ReviewState {
                ease_factor: f64::INFINITY,
                ..base
            },
            ReviewState {
                ease_factor: 1.2,
                ..base
            },
            ReviewState {
                interval_days: 0,
                ..base
            },
            ReviewState {
                leitner_box: 0,
                ..base
            },
        ];
        for state in cases {
            assert!(state.validate().is_err(), "{state:?}");
        }
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let state = ReviewState::new(make_timestamp("2024-01-01T09:00:00.000"));
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["reviewCount"], 0);
        assert_eq!(json["box"], 1);
        assert_eq!(json["intervalDays"], 1);
        assert_eq!(json["easeFactor"], 2.5);
        assert_eq!(json["lastReviewAt"], "2024-01-01T09:00:00.000");
        assert_eq!(json["nextReviewAt"], "2024-01-01T09:00:00.000");
    }

    #[test]
    fn test_missing_ease_factor_defaults() {
        let json = r#"{
            "reviewCount": 3,
            "box": 2,
            "intervalDays": 6,
            "lastReviewAt": "2024-01-02",
            "nextReviewAt": "2024-01-08"
        }"#;
        let state: ReviewState = serde_json::from_str(json).unwrap();
        assert_eq!(state.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(state.next_review_at, make_timestamp("2024-01-08T00:00:00.000"));
    }

    #[test]
    fn test_negative_counts_do_not_deserialize() {
        let json = r#"{
            "reviewCount": -1,
            "box": 1,
            "intervalDays": 1,
            "lastReviewAt": "2024-01-02",
            "nextReviewAt": "2024-01-02"
        }"#;
        assert!(serde_json::from_str::<ReviewState>(json).is_err());
    }
}
