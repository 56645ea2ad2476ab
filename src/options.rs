// Copyright 2021 Datafuse Labs
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

//! Options of a pager run.

use crate::errors::ConfigurationError;
use crate::OrderBy;
use crate::Value;

/// Number of rows fetched per query if not specified.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Field to order by if not specified.
pub const DEFAULT_ORDER_BY: &str = "id";

/// Options controlling how a source is paged through.
///
/// It can be embedded in an application config, missing fields take their defaults:
///
/// ```
/// use keyset_pager::BatchOptions;
///
/// let opts: BatchOptions = serde_json::from_str(r#"{"order_by": "-created", "limit": 10}"#).unwrap();
/// assert_eq!(opts.batch_size, 1000);
/// assert_eq!(opts.order_by.field(), "created");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Max number of rows per page.
    pub batch_size: usize,

    /// The field to order and seek by.
    pub order_by: OrderBy,

    /// Exclusive bound to start after.
    pub start_with: Option<Value>,

    /// Max number of rows across all pages. `None` means unbounded.
    pub limit: Option<u64>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            order_by: OrderBy::asc(DEFAULT_ORDER_BY),
            start_with: None,
            limit: None,
        }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the ordering field, e.g. `"created"` or `"-created"`.
    pub fn with_order_by(mut self, order_by: &str) -> Result<Self, ConfigurationError> {
        self.order_by = OrderBy::parse(order_by)?;
        Ok(self)
    }

    pub fn with_start_with(mut self, start_with: impl Into<Value>) -> Self {
        self.start_with = Some(start_with.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize(self.batch_size));
        }
        self.order_by.validate()
    }
}
