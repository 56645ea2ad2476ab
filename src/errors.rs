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

use std::io;

/// The pager was set up with options or a source it can not work with.
///
/// Returned before any query is issued.
#[derive(Clone, PartialEq, Eq, thiserror::Error, Debug)]
pub enum ConfigurationError {
    /// The source already carries a row count restriction.
    ///
    /// The pager bounds every query itself and can not compose with an existing slice.
    #[error("SlicedSource: the source is already limited; pass an unsliced source and use `limit` instead")]
    SlicedSource,

    #[error("InvalidBatchSize: batch_size must be positive, got {0}")]
    InvalidBatchSize(usize),

    #[error("InvalidOrderBy: `{0}` does not name a field")]
    InvalidOrderBy(String),
}

/// The ordering field can not be read from a returned row.
#[derive(Clone, PartialEq, Eq, thiserror::Error, Debug)]
pub enum FieldResolutionError {
    /// No supported row shape exposes the field.
    #[error(
        "`{field}` field should be in returned {shape} rows. \
         Please include it in the projection or use a different field as `order_by`."
    )]
    Unresolved { field: String, shape: &'static str },

    /// A row no longer has the shape the key strategy was resolved for.
    #[error(
        "`{field}` field can not be read from a {actual} row, \
         the key strategy was resolved for {resolved} rows"
    )]
    ShapeChanged {
        field: String,
        resolved: &'static str,
        actual: &'static str,
    },
}

/// Any error a pager run may return.
#[derive(thiserror::Error, Debug)]
pub enum PagerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    FieldResolution(#[from] FieldResolutionError),

    #[error("source query failed: {0}")]
    Source(#[from] io::Error),
}

impl PagerError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, PagerError::Configuration(_))
    }

    pub fn is_field_resolution(&self) -> bool {
        matches!(self, PagerError::FieldResolution(_))
    }
}
