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

//! Provides a simple in-memory implementation of [`OrderedSource`].
//!
//! [`Table`] holds rows in memory, [`MemorySource`] is a query over it.
//! It's primarily intended for testing and demonstration purposes.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::warn;

use crate::OrderedSource;
use crate::Record;
use crate::Row;
use crate::Value;

/// An in-memory table: a fixed set of columns and rows of values.
///
/// Inserting into a table does not affect queries created before the insert:
/// rows are copied on write if a query still holds them.
///
/// # Examples
///
/// ```
/// use keyset_pager::impls::memory::Table;
/// use keyset_pager::Value;
///
/// let mut table = Table::new(["id", "name"]);
/// table.insert([Value::from(1), Value::from("foo")]);
///
/// let names = table.all().values_flat("name");
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    fields: Arc<[String]>,
    rows: Arc<Vec<Record>>,

    /// Number of queries executed against this table, shared by all its sources.
    queries: Arc<AtomicU64>,
}

impl Table {
    pub fn new<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: ToString,
    {
        let fields = fields.into_iter().map(|f| f.to_string()).collect::<Vec<_>>();
        Self {
            fields: Arc::from(fields),
            rows: Default::default(),
            queries: Default::default(),
        }
    }

    /// Append a row, values are in column order.
    pub fn insert(&mut self, values: impl IntoIterator<Item = Value>) {
        let record = Record::new(self.fields.clone(), values.into_iter().collect());
        Arc::make_mut(&mut self.rows).push(record);
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of queries executed so far by any source of this table.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// A query returning every row as a [`Row::Record`].
    pub fn all(&self) -> MemorySource {
        MemorySource {
            table: self.clone(),
            projection: Projection::All,
            ordering: None,
            filters: vec![],
            limit: None,
        }
    }
}

/// What each returned row looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Projection {
    /// Full records.
    All,
    /// Records with only the named fields.
    Named(Vec<String>),
    /// Mappings of the named fields.
    Values(Vec<String>),
    /// Tuples of the named fields, in order.
    ValuesList(Vec<String>),
    /// The bare value of one field.
    Flat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    Eq(String, Value),
    Gt(String, Value),
    Lt(String, Value),
}

impl Filter {
    fn field(&self) -> &str {
        match self {
            Filter::Eq(f, _) | Filter::Gt(f, _) | Filter::Lt(f, _) => f,
        }
    }

    /// `NULL` never matches, as in SQL.
    fn matches(&self, record: &Record) -> bool {
        let Some(v) = record.get(self.field()) else {
            return false;
        };
        if v.is_null() {
            return false;
        }
        match self {
            Filter::Eq(_, b) => v == b,
            Filter::Gt(_, b) => v > b,
            Filter::Lt(_, b) => v < b,
        }
    }
}

/// A lazily built query over a [`Table`].
///
/// Filters and ordering apply to the table columns, whatever the projection is.
#[derive(Debug, Clone)]
pub struct MemorySource {
    table: Table,
    projection: Projection,
    ordering: Option<(String, bool)>,
    filters: Vec<Filter>,
    limit: Option<usize>,
}

impl MemorySource {
    /// Keep only rows whose `field` equals `value`.
    pub fn filter_eq(&self, field: &str, value: impl Into<Value>) -> Self {
        self.with_filter(Filter::Eq(field.to_string(), value.into()))
    }

    /// Return records with only the given fields.
    pub fn values_named<I, F>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: ToString,
    {
        self.with_projection(Projection::Named(names(fields)))
    }

    /// Return mappings of the given fields, or of all fields if none is given.
    pub fn values<I, F>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: ToString,
    {
        self.with_projection(Projection::Values(names(fields)))
    }

    /// Return tuples of the given fields, or of all fields if none is given.
    pub fn values_list<I, F>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: ToString,
    {
        self.with_projection(Projection::ValuesList(names(fields)))
    }

    /// Return the bare value of one field.
    pub fn values_flat(&self, field: impl ToString) -> Self {
        self.with_projection(Projection::Flat(field.to_string()))
    }

    fn with_filter(&self, filter: Filter) -> Self {
        let mut s = self.clone();
        s.filters.push(filter);
        s
    }

    fn with_projection(&self, projection: Projection) -> Self {
        let mut s = self.clone();
        s.projection = projection;
        s
    }

    /// The projected column names, an empty list means all columns.
    fn projected_fields(&self) -> Vec<String> {
        let fields = match &self.projection {
            Projection::All => return self.table.fields.to_vec(),
            Projection::Flat(f) => return vec![f.clone()],
            Projection::Named(f) | Projection::Values(f) | Projection::ValuesList(f) => f,
        };

        if fields.is_empty() {
            self.table.fields.to_vec()
        } else {
            fields.clone()
        }
    }

    fn check_columns(&self) -> Result<(), io::Error> {
        let ordering = self.ordering.iter().map(|(f, _)| f.as_str());
        let filters = self.filters.iter().map(|f| f.field());
        let projected = self.projected_fields();

        for name in ordering.chain(filters).chain(projected.iter().map(|f| f.as_str())) {
            if !self.table.fields.iter().any(|f| f == name) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown column `{}`", name),
                ));
            }
        }
        Ok(())
    }

    fn project(&self, record: &Record, fields: &Arc<[String]>) -> Row {
        let pick = || {
            fields
                .iter()
                .map(|f| record.get(f).cloned().unwrap_or(Value::Null))
        };

        match &self.projection {
            Projection::All => Row::Record(record.clone()),
            Projection::Named(_) => Row::Record(Record::new(fields.clone(), pick().collect())),
            Projection::Values(_) => {
                let m = fields.iter().cloned().zip(pick()).collect::<BTreeMap<_, _>>();
                Row::Mapping(m)
            }
            Projection::ValuesList(_) => Row::Tuple(pick().collect()),
            Projection::Flat(_) => Row::Scalar(pick().next().unwrap_or(Value::Null)),
        }
    }
}

fn names<I, F>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = F>,
    F: ToString,
{
    fields.into_iter().map(|f| f.to_string()).collect()
}

#[async_trait::async_trait]
impl OrderedSource for MemorySource {
    fn order_by(&self, field: &str, descending: bool) -> Self {
        let mut s = self.clone();
        s.ordering = Some((field.to_string(), descending));
        s
    }

    fn filter_greater_than(&self, field: &str, value: &Value) -> Self {
        self.with_filter(Filter::Gt(field.to_string(), value.clone()))
    }

    fn filter_less_than(&self, field: &str, value: &Value) -> Self {
        self.with_filter(Filter::Lt(field.to_string(), value.clone()))
    }

    /// Slicing an already sliced query keeps the smaller limit.
    fn limit(&self, n: usize) -> Self {
        let mut s = self.clone();
        s.limit = Some(self.limit.map_or(n, |l| l.min(n)));
        s
    }

    fn is_sliced(&self) -> bool {
        self.limit.is_some()
    }

    fn field_order(&self) -> Option<Vec<String>> {
        match &self.projection {
            Projection::ValuesList(_) | Projection::Flat(_) => Some(self.projected_fields()),
            Projection::All | Projection::Named(_) | Projection::Values(_) => None,
        }
    }

    async fn execute(&self) -> Result<Vec<Row>, io::Error> {
        self.check_columns()?;
        self.table.queries.fetch_add(1, Ordering::Relaxed);

        let mut matched = self
            .table
            .rows
            .iter()
            .filter(|r| self.filters.iter().all(|f| f.matches(r)))
            .collect::<Vec<_>>();

        if let Some((field, descending)) = &self.ordering {
            matched.sort_by(|a, b| {
                let ord = a.get(field).cmp(&b.get(field));
                if *descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(n) = self.limit {
            matched.truncate(n);
        }

        if matched.len() > 1000 {
            warn!(
                "MemorySource::execute() returns big result of len={}, consider a limit",
                matched.len()
            );
        }

        let fields: Arc<[String]> = Arc::from(self.projected_fields());
        let rows = matched.into_iter().map(|r| self.project(r, &fields)).collect();
        Ok(rows)
    }
}
