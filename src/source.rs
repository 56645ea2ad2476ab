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

//! Defines the query source the pager reads from.
//!
//! The [`OrderedSource`] trait is the only thing the pager requires from a backing store:
//! ordering, strict bound filters, a row count limit and eager execution.

use std::io;

use crate::Row;
use crate::Value;

/// A query handle over an ordered collection of rows.
///
/// Every builder method returns a new handle and leaves `self` unchanged,
/// so the pager can derive one query per page from the same ordered base.
///
/// Iteration is only well defined if the collection is monotonic under the ordering field
/// while a run is in progress.
///
/// # Examples
///
/// ```rust,no_run
/// use std::io;
///
/// use keyset_pager::impls::memory::Table;
/// use keyset_pager::OrderedSource;
/// use keyset_pager::Value;
///
/// #[tokio::main]
/// async fn main() -> io::Result<()> {
///     let mut table = Table::new(["id"]);
///     table.insert([Value::from(1)]);
///     table.insert([Value::from(2)]);
///
///     let rows = table
///         .all()
///         .order_by("id", true)
///         .filter_less_than("id", &Value::from(2))
///         .limit(10)
///         .execute()
///         .await?;
///
///     assert_eq!(rows.len(), 1);
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait OrderedSource: Clone + Send + Sync {
    /// Order rows by `field`, replacing any existing ordering.
    fn order_by(&self, field: &str, descending: bool) -> Self;

    /// Keep only rows whose `field` is strictly greater than `value`.
    fn filter_greater_than(&self, field: &str, value: &Value) -> Self;

    /// Keep only rows whose `field` is strictly less than `value`.
    fn filter_less_than(&self, field: &str, value: &Value) -> Self;

    /// Return at most `n` rows.
    fn limit(&self, n: usize) -> Self;

    /// Whether a row count restriction is already applied.
    ///
    /// A sliced source can not be paged because the pager applies its own limit.
    fn is_sliced(&self) -> bool;

    /// The declared column order of a positional projection.
    ///
    /// `None` if rows are not positional, i.e. records or mappings.
    fn field_order(&self) -> Option<Vec<String>>;

    /// Run the query and return all rows eagerly.
    async fn execute(&self) -> Result<Vec<Row>, io::Error>;
}
