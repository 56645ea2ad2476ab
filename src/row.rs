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

//! Rows emitted by an [`OrderedSource`](crate::OrderedSource).
//!
//! A row comes in one of four shapes, see [`Row`].
//! The pager never looks into a row except to read the ordering key.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::Value;

/// A single row returned by a source query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// A structured record with named fields, e.g. a full model instance
    /// or a named tuple.
    Record(Record),

    /// An associative map from column name to value.
    Mapping(BTreeMap<String, Value>),

    /// A fixed-order tuple. Column names are only known from the source's
    /// declared field order.
    Tuple(Vec<Value>),

    /// A bare value, e.g. a flat single-column projection.
    Scalar(Value),
}

impl Row {
    /// Name of the shape, used in diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Row::Record(_) => "record",
            Row::Mapping(_) => "mapping",
            Row::Tuple(_) => "tuple",
            Row::Scalar(_) => "scalar",
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Row::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Record> for Row {
    fn from(r: Record) -> Self {
        Row::Record(r)
    }
}

impl From<BTreeMap<String, Value>> for Row {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Row::Mapping(m)
    }
}

impl From<Vec<Value>> for Row {
    fn from(t: Vec<Value>) -> Self {
        Row::Tuple(t)
    }
}

impl From<Value> for Row {
    fn from(v: Value) -> Self {
        Row::Scalar(v)
    }
}

/// A record with named fields.
///
/// The field names are shared by every record of the same table,
/// so cloning a record does not copy the schema.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    fields: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    /// Create a record.
    ///
    /// `values` is padded with [`Value::Null`] or truncated to the number of `fields`.
    pub fn new(fields: Arc<[String]>, mut values: Vec<Value>) -> Self {
        values.resize(fields.len(), Value::Null);
        Self { fields, values }
    }

    /// Read a field by name, `None` if the record has no such field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self.fields.iter().position(|f| f == name)?;
        self.values.get(idx)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().zip(self.values.iter()))
            .finish()
    }
}
