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

use crate::error::ErrorReport;
use crate::error::fail;

/// The lowest quality score that counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;

/// The learner's self-reported recall quality for a review.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Easy,
    Good,
    Hard,
    Fail,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Easy, Grade::Good, Grade::Hard, Grade::Fail];

    /// The SM-2 quality score for this grade.
    pub fn quality(self) -> u8 {
        match self {
            Grade::Easy => 5,
            Grade::Good => 4,
            Grade::Hard => 3,
            Grade::Fail => 2,
        }
    }

    pub fn is_pass(self) -> bool {
        self.quality() >= PASSING_QUALITY
    }

    pub fn as_str(&self) -> &str {
        match self {
            Grade::Easy => "easy",
            Grade::Good => "good",
            Grade::Hard => "hard",
            Grade::Fail => "fail",
        }
    }
}

impl From<Grade> for f64 {
    fn from(g: Grade) -> f64 {
        f64::from(g.quality())
    }
}

impl TryFrom<String> for Grade {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "easy" => Ok(Grade::Easy),
            "good" => Ok(Grade::Good),
            "hard" => Ok(Grade::Hard),
            "fail" => Ok(Grade::Fail),
            _ => fail(format!(
                "invalid grade '{value}': expected one of easy, good, hard, fail"
            )),
        }
    }
}

/// The legacy two-button answer: the learner either remembered or not.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl From<bool> for Outcome {
    fn from(success: bool) -> Outcome {
        if success {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

impl From<Outcome> for Grade {
    fn from(outcome: Outcome) -> Grade {
        match outcome {
            Outcome::Success => Grade::Good,
            Outcome::Failure => Grade::Fail,
        }
    }
}

impl TryFrom<String> for Outcome {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "success" => Ok(Outcome::Success),
            "failure" => Ok(Outcome::Failure),
            _ => fail(format!(
                "invalid outcome '{value}': expected success or failure"
            )),
        }
    }
}
