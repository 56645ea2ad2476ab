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

//! Stream entry points: pages with [`batches`], single rows with [`rows`].

use futures_util::StreamExt;
use futures_util::TryStreamExt;

use crate::errors::PagerError;
use crate::BatchCursor;
use crate::BatchOptions;
use crate::OrderedSource;
use crate::PageResultStream;
use crate::Row;
use crate::RowResultStream;

/// Page through `source` in keyset order.
///
/// Nothing is queried until the stream is polled, and each poll issues at most one query.
/// The stream ends after the first error.
pub fn batches<S>(source: S, options: BatchOptions) -> PageResultStream
where S: OrderedSource + 'static {
    let cursor = BatchCursor::new(source, options);

    futures::stream::try_unfold(cursor, |mut cursor| async move {
        let page = cursor.next_batch().await?;
        Ok::<_, PagerError>(page.map(|p| (p, cursor)))
    })
    .boxed()
}

/// Like [`batches`] but yields rows one by one.
pub fn rows<S>(source: S, options: BatchOptions) -> RowResultStream
where S: OrderedSource + 'static {
    batches(source, options)
        .map_ok(|page| futures::stream::iter(page.into_iter().map(Ok::<Row, PagerError>)))
        .try_flatten()
        .boxed()
}
