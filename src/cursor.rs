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

//! The seek loop: one bounded, filtered, ordered query per page.
//!
//! Each page is filtered by the ordering key of the last row of the previous page,
//! instead of skipping rows by offset. The cost of fetching a page does not grow
//! with the position in the collection.

use log::debug;
use log::warn;

use crate::errors::ConfigurationError;
use crate::errors::PagerError;
use crate::key_extractor::KeyExtractor;
use crate::order::Direction;
use crate::BatchOptions;
use crate::OrderBy;
use crate::OrderedSource;
use crate::Page;
use crate::Row;
use crate::Value;

/// Mutable state of one pager run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    order_by: OrderBy,

    /// Exclusive bound of the next query, the key of the last row seen.
    seek: Option<Value>,

    /// Rows that may still be returned. `None` is unbounded.
    remaining: Option<u64>,

    batch_size: usize,
}

impl CursorState {
    pub fn new(options: &BatchOptions) -> Self {
        Self {
            order_by: options.order_by.clone(),
            seek: options.start_with.clone(),
            remaining: options.limit,
            batch_size: options.batch_size,
        }
    }

    pub fn order_by(&self) -> &OrderBy {
        &self.order_by
    }

    pub fn seek(&self) -> Option<&Value> {
        self.seek.as_ref()
    }

    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    /// Shrink the batch size to the remaining budget and return it.
    ///
    /// The batch size never grows back.
    pub fn clamp_batch_size(&mut self) -> usize {
        if let Some(rem) = self.remaining {
            if (self.batch_size as u64) > rem {
                self.batch_size = rem as usize;
            }
        }
        self.batch_size
    }

    /// Account for a returned page whose last row has key `last_key`.
    pub fn advance(&mut self, returned: usize, last_key: Value) {
        if let Some(rem) = self.remaining.as_mut() {
            *rem = rem.saturating_sub(returned as u64);
        }
        self.seek = Some(last_key);
    }

    /// Whether no further page should be requested after a page of `returned` rows
    /// was fetched with a batch size of `requested`.
    pub fn is_exhausted(&self, returned: usize, requested: usize) -> bool {
        returned < requested || self.remaining == Some(0)
    }
}

/// Pulls pages from an [`OrderedSource`] one query at a time.
///
/// A cursor is single pass: once it returns `Ok(None)` or an error, it is finished.
/// Options and source are checked when the first page is pulled, not at construction.
///
/// ```rust,no_run
/// use keyset_pager::impls::memory::Table;
/// use keyset_pager::BatchCursor;
/// use keyset_pager::BatchOptions;
/// use keyset_pager::Value;
///
/// #[tokio::main]
/// async fn main() -> Result<(), keyset_pager::PagerError> {
///     let mut table = Table::new(["id"]);
///     for i in 0..10 {
///         table.insert([Value::from(i)]);
///     }
///
///     let mut cursor = BatchCursor::new(table.all(), BatchOptions::new().with_batch_size(4));
///     while let Some(page) = cursor.next_batch().await? {
///         println!("page of {}", page.len());
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct BatchCursor<S> {
    source: S,

    /// `source` with ordering applied, set on the first pull.
    ordered: Option<S>,

    state: CursorState,

    extractor: Option<KeyExtractor>,

    finished: bool,

    queries: u64,
}

impl<S> BatchCursor<S>
where S: OrderedSource
{
    pub fn new(source: S, options: BatchOptions) -> Self {
        Self {
            source,
            ordered: None,
            state: CursorState::new(&options),
            extractor: None,
            finished: false,
            queries: 0,
        }
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    /// The key strategy, once resolved from the first non-empty page.
    pub fn extractor(&self) -> Option<&KeyExtractor> {
        self.extractor.as_ref()
    }

    /// Whether the cursor will not return any more pages.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of queries executed so far.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Fetch the next page.
    ///
    /// Returns `Ok(None)` when the source or the limit is exhausted.
    /// After an error the cursor is finished.
    pub async fn next_batch(&mut self) -> Result<Option<Page>, PagerError> {
        if self.finished {
            return Ok(None);
        }

        let res = self.step().await;
        if res.is_err() {
            self.finished = true;
        }
        res
    }

    async fn step(&mut self) -> Result<Option<Page>, PagerError> {
        let ordered = self.prepare()?;

        let batch_size = self.state.clamp_batch_size();
        if batch_size == 0 {
            debug!("BatchCursor: limit reached, no query issued");
            self.finished = true;
            return Ok(None);
        }

        let field = self.state.order_by.field();

        let query = match (&self.state.seek, self.state.order_by.direction()) {
            (None, _) => ordered,
            (Some(bound), Direction::Asc) => ordered.filter_greater_than(field, bound),
            (Some(bound), Direction::Desc) => ordered.filter_less_than(field, bound),
        };
        let query = query.limit(batch_size);

        let mut page = query.execute().await?;
        self.queries += 1;

        if page.len() > batch_size {
            warn!(
                "BatchCursor: source returned {} rows for a limit of {}, truncated",
                page.len(),
                batch_size
            );
            page.truncate(batch_size);
        }

        let returned = page.len();

        debug!(
            "BatchCursor: query {}: {} after {:?} limit {} returned {}",
            self.queries,
            self.state.order_by,
            self.state.seek,
            batch_size,
            returned
        );

        if let Some(last) = page.last() {
            let key = self.extract_key(last, &query)?;
            self.state.advance(returned, key);
        }

        if self.state.is_exhausted(returned, batch_size) {
            self.finished = true;
        }

        if page.is_empty() {
            return Ok(None);
        }

        Ok(Some(page))
    }

    /// Validate the setup and apply ordering to the source, once.
    fn prepare(&mut self) -> Result<S, PagerError> {
        if let Some(o) = &self.ordered {
            return Ok(o.clone());
        }

        if self.state.batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize(self.state.batch_size).into());
        }
        self.state.order_by.validate()?;

        if self.source.is_sliced() {
            return Err(ConfigurationError::SlicedSource.into());
        }

        let order_by = &self.state.order_by;
        let ordered = self
            .source
            .order_by(order_by.field(), order_by.direction().is_descending());

        self.ordered = Some(ordered.clone());
        Ok(ordered)
    }

    fn extract_key(&mut self, row: &Row, query: &S) -> Result<Value, PagerError> {
        let extractor = match self.extractor.take() {
            Some(e) => e,
            None => {
                let field_order = query.field_order();
                KeyExtractor::resolve(row, self.state.order_by.field(), field_order.as_deref())?
            }
        };

        let key = extractor.extract(row);
        self.extractor = Some(extractor);
        Ok(key?)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::FieldResolutionError;
    use crate::impls::memory::MemorySource;
    use crate::impls::memory::Table;
    use crate::key_extractor::Shape;

    const N: i64 = 7000;

    /// `id` is `1..=n`, `created` is a permutation of `0..n` unrelated to `id`.
    fn items(n: i64) -> Table {
        let mut table = Table::new(["id", "created"]);
        for i in 0..n {
            table.insert([Value::from(i + 1), Value::from((i * 7919) % n)]);
        }
        table
    }

    async fn page_sizes(
        source: MemorySource,
        options: BatchOptions,
    ) -> Result<Vec<usize>, PagerError> {
        let mut cursor = BatchCursor::new(source, options);
        let mut sizes = vec![];
        while let Some(page) = cursor.next_batch().await? {
            sizes.push(page.len());
        }
        Ok(sizes)
    }

    fn opts() -> BatchOptions {
        BatchOptions::default()
    }

    #[test]
    fn test_cursor_state_clamp() {
        let mut st = CursorState::new(&opts().with_limit(2333));

        assert_eq!(st.clamp_batch_size(), 1000);
        st.advance(1000, Value::from(1000));
        assert_eq!(st.clamp_batch_size(), 1000);
        st.advance(1000, Value::from(2000));
        assert_eq!(st.remaining(), Some(333));
        assert_eq!(st.clamp_batch_size(), 333);
        assert!(!st.is_exhausted(333, 333));
        st.advance(333, Value::from(2333));
        assert_eq!(st.remaining(), Some(0));
        assert_eq!(st.seek(), Some(&Value::from(2333)));
        assert!(st.is_exhausted(333, 333));
    }

    #[test]
    fn test_cursor_state_unbounded() {
        let mut st = CursorState::new(&opts().with_batch_size(10));

        assert_eq!(st.clamp_batch_size(), 10);
        st.advance(10, Value::from(10));
        assert_eq!(st.remaining(), None);
        assert!(!st.is_exhausted(10, 10));
        assert!(st.is_exhausted(9, 10));
    }

    #[tokio::test]
    async fn test_limit() -> anyhow::Result<()> {
        let table = items(N);

        // (limit, expected page sizes)
        let cases: Vec<(Option<u64>, Vec<usize>)> = vec![
            (None, vec![1000; 7]),
            (Some(2 * N as u64), vec![1000; 7]),
            (Some(N as u64), vec![1000; 7]),
            (Some(2000), vec![1000, 1000]),
            (Some(2333), vec![1000, 1000, 333]),
            (Some(333), vec![333]),
            (Some(0), vec![]),
        ];

        for (limit, want) in cases {
            let options = BatchOptions { limit, ..opts() };
            let got = page_sizes(table.all(), options).await?;
            assert_eq!(got, want, "limit: {:?}", limit);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_query_count() -> anyhow::Result<()> {
        let table = items(N);

        let before = table.query_count();
        let mut cursor = BatchCursor::new(table.all(), opts().with_batch_size(11).with_limit(33));
        while let Some(page) = cursor.next_batch().await? {
            assert_eq!(page.len(), 11);
        }
        assert_eq!(cursor.queries(), 3);
        assert_eq!(table.query_count() - before, 3);

        // The source runs out: the last page is short, no extra query is issued.
        let mut cursor = BatchCursor::new(table.all(), opts().with_batch_size(345));
        while let Some(page) = cursor.next_batch().await? {
            assert!(page.len() == 345 || page.len() == (N % 345) as usize);
        }
        assert_eq!(cursor.queries(), (N as u64).div_ceil(345));
        Ok(())
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_one_empty_query() -> anyhow::Result<()> {
        let table = items(20);

        let mut cursor = BatchCursor::new(table.all(), opts().with_batch_size(10));
        let mut sizes = vec![];
        while let Some(page) = cursor.next_batch().await? {
            sizes.push(page.len());
        }
        assert_eq!(sizes, vec![10, 10]);
        assert_eq!(cursor.queries(), 3);
        assert!(cursor.is_finished());
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_limit_issues_no_query() -> anyhow::Result<()> {
        let table = items(10);

        let mut cursor = BatchCursor::new(table.all(), opts().with_limit(0));
        assert_eq!(cursor.next_batch().await?, None);
        assert_eq!(cursor.queries(), 0);
        assert_eq!(table.query_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_source() -> anyhow::Result<()> {
        let table = items(0);

        let mut cursor = BatchCursor::new(table.all(), opts());
        assert_eq!(cursor.next_batch().await?, None);
        assert_eq!(cursor.queries(), 1);
        assert!(cursor.extractor().is_none());
        assert_eq!(cursor.next_batch().await?, None);
        assert_eq!(cursor.queries(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_descending_seeks_with_less_than() -> anyhow::Result<()> {
        let table = items(25);

        let mut cursor = BatchCursor::new(
            table.all(),
            opts().with_batch_size(10).with_order_by("-created")?,
        );

        let mut pages = vec![];
        while let Some(page) = cursor.next_batch().await? {
            pages.push(created(&page));
        }

        assert_eq!(pages, vec![
            (15..25).rev().collect::<Vec<_>>(),
            (5..15).rev().collect::<Vec<_>>(),
            (0..5).rev().collect::<Vec<_>>(),
        ]);
        assert_eq!(cursor.state().seek(), Some(&Value::from(0)));
        assert_eq!(cursor.extractor().map(|e| e.shape()), Some(Shape::Named));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_with() -> anyhow::Result<()> {
        let table = items(1000);

        let mut cursor = BatchCursor::new(
            table.all(),
            opts().with_batch_size(9).with_start_with(333).with_limit(20),
        );
        let first = cursor.next_batch().await?.unwrap_or_default();
        assert_eq!(ids(&first), (334..343).collect::<Vec<_>>());

        let mut cursor = BatchCursor::new(
            table.all(),
            opts()
                .with_batch_size(9)
                .with_order_by("-id")?
                .with_start_with(333)
                .with_limit(20),
        );
        let first = cursor.next_batch().await?.unwrap_or_default();
        assert_eq!(ids(&first), (324..333).rev().collect::<Vec<_>>());
        Ok(())
    }

    #[tokio::test]
    async fn test_tuple_projection() -> anyhow::Result<()> {
        let table = items(30);
        let source = table.all().values_list(["id", "created"]);

        let sizes = page_sizes(source.clone(), opts().with_batch_size(7)).await?;
        assert_eq!(sizes, vec![7, 7, 7, 7, 2]);

        let mut cursor =
            BatchCursor::new(source, opts().with_batch_size(7).with_order_by("created")?);
        let err = cursor.next_batch().await.unwrap_err();
        match err {
            PagerError::FieldResolution(FieldResolutionError::Unresolved { field, shape }) => {
                assert_eq!(field, "created");
                assert_eq!(shape, "tuple");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(cursor.is_finished());
        assert_eq!(cursor.next_batch().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_mapping_projection_missing_field() -> anyhow::Result<()> {
        let table = items(30);

        let mut cursor = BatchCursor::new(table.all().values(["created"]), opts());
        let err = cursor.next_batch().await.unwrap_err();
        assert!(err.is_field_resolution());
        assert!(err.to_string().contains("`id` field should be in returned mapping rows"));
        Ok(())
    }

    #[tokio::test]
    async fn test_sliced_source_rejected_before_query() -> anyhow::Result<()> {
        let table = items(30);

        let mut cursor = BatchCursor::new(table.all().limit(5), opts());
        let err = cursor.next_batch().await.unwrap_err();
        assert!(matches!(
            err,
            PagerError::Configuration(ConfigurationError::SlicedSource)
        ));
        assert_eq!(table.query_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() -> anyhow::Result<()> {
        let table = items(30);

        let mut cursor = BatchCursor::new(table.all(), opts().with_batch_size(0));
        let err = cursor.next_batch().await.unwrap_err();
        assert!(matches!(
            err,
            PagerError::Configuration(ConfigurationError::InvalidBatchSize(0))
        ));
        assert_eq!(table.query_count(), 0);
        Ok(())
    }

    /// A source that returns a scripted sequence of pages, ignoring the query.
    #[derive(Debug, Clone)]
    struct Scripted {
        pages: std::sync::Arc<std::sync::Mutex<Vec<io::Result<Vec<Row>>>>>,
    }

    impl Scripted {
        fn new(mut pages: Vec<io::Result<Vec<Row>>>) -> Self {
            pages.reverse();
            Self {
                pages: std::sync::Arc::new(std::sync::Mutex::new(pages)),
            }
        }
    }

    #[async_trait::async_trait]
    impl OrderedSource for Scripted {
        fn order_by(&self, _field: &str, _descending: bool) -> Self {
            self.clone()
        }

        fn filter_greater_than(&self, _field: &str, _value: &Value) -> Self {
            self.clone()
        }

        fn filter_less_than(&self, _field: &str, _value: &Value) -> Self {
            self.clone()
        }

        fn limit(&self, _n: usize) -> Self {
            self.clone()
        }

        fn is_sliced(&self) -> bool {
            false
        }

        fn field_order(&self) -> Option<Vec<String>> {
            Some(vec!["id".to_string()])
        }

        async fn execute(&self) -> Result<Vec<Row>, io::Error> {
            self.pages.lock().unwrap().pop().unwrap_or(Ok(vec![]))
        }
    }

    fn scalars(keys: impl IntoIterator<Item = i64>) -> Vec<Row> {
        keys.into_iter().map(|k| Row::Scalar(Value::from(k))).collect()
    }

    #[tokio::test]
    async fn test_shape_change_mid_run_is_fatal() -> anyhow::Result<()> {
        let source = Scripted::new(vec![
            Ok(scalars([1, 2])),
            Ok(vec![Row::Tuple(vec![]), Row::Mapping(Default::default())]),
        ]);

        let mut cursor = BatchCursor::new(source, opts().with_batch_size(2));
        assert_eq!(cursor.next_batch().await?, Some(scalars([1, 2])));
        assert_eq!(cursor.extractor().map(|e| e.shape()), Some(Shape::Identity));

        let err = cursor.next_batch().await.unwrap_err();
        assert!(matches!(
            err,
            PagerError::FieldResolution(FieldResolutionError::ShapeChanged { .. })
        ));
        assert!(cursor.is_finished());
        Ok(())
    }

    #[tokio::test]
    async fn test_source_error_is_fatal() -> anyhow::Result<()> {
        let source = Scripted::new(vec![
            Ok(scalars([1, 2])),
            Err(io::Error::new(io::ErrorKind::Other, "connection reset")),
            Ok(scalars([3, 4])),
        ]);

        let mut cursor = BatchCursor::new(source, opts().with_batch_size(2));
        assert!(cursor.next_batch().await?.is_some());

        let err = cursor.next_batch().await.unwrap_err();
        assert_eq!(err.to_string(), "source query failed: connection reset");
        assert_eq!(cursor.next_batch().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_page_is_truncated() -> anyhow::Result<()> {
        let source = Scripted::new(vec![Ok(scalars([1, 2, 3]))]);

        let mut cursor = BatchCursor::new(source, opts().with_batch_size(2));
        assert_eq!(cursor.next_batch().await?, Some(scalars([1, 2])));
        assert_eq!(cursor.state().seek(), Some(&Value::from(2)));
        Ok(())
    }

    fn ids(page: &[Row]) -> Vec<i64> {
        column(page, "id")
    }

    fn created(page: &[Row]) -> Vec<i64> {
        column(page, "created")
    }

    fn column(page: &[Row], name: &str) -> Vec<i64> {
        page.iter()
            .filter_map(|r| r.as_record()?.get(name)?.as_int())
            .collect()
    }
}
