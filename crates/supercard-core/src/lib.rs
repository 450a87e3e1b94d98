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


//! supercard-core: the scheduling engine behind SuperCard.
//!
//! This library is pure and WASM-compatible. It provides:
//! - The review scheduler, a simplified SM-2 with a Leitner box on the side
//! - The due-set selector used by every card listing
//! - Card, review state, date and pagination types

pub mod due;
pub mod error;
pub mod grade;
pub mod scheduler;
pub mod types;

// Re-exports for convenience
pub use due::{Scheduled, due_cutoff, is_due, select_due};
pub use error::{ErrorReport, Fallible, fail};
pub use grade::{Grade, Outcome};
pub use scheduler::{compute_outcome_update, compute_review_update};
pub use types::card::{Card, CardEdit, CardId, NewCard, OwnerId};
pub use types::date::Date;
pub use types::page::Page;
pub use types::review_state::{Phase, ReviewState};
pub use types::timestamp::Timestamp;
