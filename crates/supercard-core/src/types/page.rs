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

use crate::error::Fallible;
use crate::error::fail;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A 1-based page of results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    number: usize,
    limit: usize,
}

impl Page {
    pub fn new(number: usize, limit: usize) -> Fallible<Self> {
        if number == 0 {
            return fail("page numbers start at 1");
        }
        if limit == 0 {
            return fail("page limit must be at least 1");
        }
        Ok(Self { number, limit })
    }

    /// Every item in one page.
    pub fn all() -> Self {
        Self {
            number: 1,
            limit: usize::MAX,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        (self.number - 1).saturating_mul(self.limit)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.limit).min(items.len());
        &items[start..end]
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}
