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

//! # Keyset Pager
//!
//! Iterates a large ordered collection in bounded batches, using keyset (seek) pagination.
//!
//! Instead of `OFFSET`, every batch is fetched with a filter on the ordering key of the last
//! row of the previous batch. The cost of a batch does not depend on how far the iteration is,
//! and the first batch is available after a single bounded query.
//!
//! ## Core Components
//!
//! - [`OrderedSource`]: the query interface a backing store has to provide
//! - [`BatchCursor`]: the seek loop, pulling one page per query
//! - [`KeyExtractor`]: reads the ordering key from a [`Row`] of any supported shape
//! - [`pager::batches`] and [`pager::rows`]: lazy streams of pages or rows
//! - [`blocking`]: the same as synchronous iterators
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use futures_util::TryStreamExt;
//! use keyset_pager::impls::memory::Table;
//! use keyset_pager::pager;
//! use keyset_pager::BatchOptions;
//! use keyset_pager::Value;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut table = Table::new(["id", "created"]);
//!     table.insert([Value::from(1), Value::from(1700000000)]);
//!     table.insert([Value::from(2), Value::from(1600000000)]);
//!
//!     // Newest first, 1000 rows per query.
//!     let options = BatchOptions::new().with_order_by("-created")?;
//!     let mut rows = pager::rows(table.all(), options);
//!
//!     while let Some(row) = rows.try_next().await? {
//!         println!("{:?}", row);
//!     }
//!
//!     Ok(())
//! }
//! ```

use futures_util::stream::BoxStream;

pub mod blocking;
pub mod cursor;
pub mod errors;
pub mod impls;
pub mod key_extractor;
pub mod options;
pub mod order;
pub mod pager;
pub mod row;
pub mod source;
pub mod value;


pub use crate::cursor::BatchCursor;
pub use crate::cursor::CursorState;
pub use crate::errors::ConfigurationError;
pub use crate::errors::FieldResolutionError;
pub use crate::errors::PagerError;
pub use crate::key_extractor::KeyExtractor;
pub use crate::key_extractor::Shape;
pub use crate::options::BatchOptions;
pub use crate::order::Direction;
pub use crate::order::OrderBy;
pub use crate::pager::batches;
pub use crate::pager::rows;
pub use crate::row::Record;
pub use crate::row::Row;
pub use crate::source::OrderedSource;
pub use crate::value::Value;

/// A batch of rows returned by one query, at most `batch_size` long.
pub type Page = Vec<Row>;

/// A stream of pages returned by [`batches()`].
/// The stream is 'static so it can be moved into a spawned task.
pub type PageResultStream = BoxStream<'static, Result<Page, PagerError>>;

/// A stream of rows returned by [`rows()`].
pub type RowResultStream = BoxStream<'static, Result<Row, PagerError>>;
