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

//! Synchronous iterators over [`pager`](crate::pager) streams.
//!
//! Each `next()` drives the stream on the current thread until one item is ready.
//! Do not use these from within an async runtime with a source that relies on that runtime.

use futures::executor::block_on_stream;
use futures::executor::BlockingStream;

use crate::pager;
use crate::BatchOptions;
use crate::OrderedSource;
use crate::PageResultStream;
use crate::RowResultStream;

/// Blocking version of [`pager::batches`].
pub fn batches<S>(source: S, options: BatchOptions) -> BlockingStream<PageResultStream>
where S: OrderedSource + 'static {
    block_on_stream(pager::batches(source, options))
}

/// Blocking version of [`pager::rows`].
pub fn rows<S>(source: S, options: BatchOptions) -> BlockingStream<RowResultStream>
where S: OrderedSource + 'static {
    block_on_stream(pager::rows(source, options))
}
