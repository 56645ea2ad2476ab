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

//! Reads the ordering key out of a row.
//!
//! The strategy is detected once from a real row and reused for the rest of a run:
//! all rows of one run are expected to share the same shape.

use log::debug;

use crate::errors::FieldResolutionError;
use crate::Row;
use crate::Value;

/// How the ordering key is read from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Read a [`Row::Record`] field by name.
    Named,
    /// Read a [`Row::Mapping`] entry by key.
    Keyed,
    /// Read position 0 of a [`Row::Tuple`].
    Positional,
    /// A [`Row::Scalar`] is the key itself.
    Identity,
}

impl Shape {
    fn row_shape_name(&self) -> &'static str {
        match self {
            Shape::Named => "record",
            Shape::Keyed => "mapping",
            Shape::Positional => "tuple",
            Shape::Identity => "scalar",
        }
    }
}

/// A resolved key reader for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExtractor {
    field: String,
    shape: Shape,
}

impl KeyExtractor {
    /// Detect how to read `field` from `row`.
    ///
    /// `field_order` is the source's declared column order. Positional and scalar rows
    /// carry no names, so they are only accepted if `field` is the first declared column.
    ///
    /// The detected strategy is applied to `row` once before it is returned.
    pub fn resolve(
        row: &Row,
        field: &str,
        field_order: Option<&[String]>,
    ) -> Result<Self, FieldResolutionError> {
        let first_declared = field_order.and_then(|f| f.first()).map(|f| f.as_str()) == Some(field);

        let shape = match row {
            Row::Record(r) if r.get(field).is_some() => Some(Shape::Named),
            Row::Mapping(m) if m.contains_key(field) => Some(Shape::Keyed),
            Row::Tuple(_) if first_declared => Some(Shape::Positional),
            Row::Scalar(_) if first_declared => Some(Shape::Identity),
            _ => None,
        };

        let unresolved = || FieldResolutionError::Unresolved {
            field: field.to_string(),
            shape: row.shape_name(),
        };

        let extractor = Self {
            field: field.to_string(),
            shape: shape.ok_or_else(unresolved)?,
        };

        // An empty tuple matches structurally but has no position 0.
        extractor.read(row).ok_or_else(unresolved)?;

        debug!(
            "KeyExtractor: resolved `{}` as {:?} from a {} row",
            field,
            extractor.shape,
            row.shape_name()
        );

        Ok(extractor)
    }

    /// Read the key from a row of the resolved shape.
    pub fn extract(&self, row: &Row) -> Result<Value, FieldResolutionError> {
        self.read(row)
            .cloned()
            .ok_or_else(|| FieldResolutionError::ShapeChanged {
                field: self.field.clone(),
                resolved: self.shape.row_shape_name(),
                actual: row.shape_name(),
            })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    fn read<'a>(&self, row: &'a Row) -> Option<&'a Value> {
        match (self.shape, row) {
            (Shape::Named, Row::Record(r)) => r.get(&self.field),
            (Shape::Keyed, Row::Mapping(m)) => m.get(&self.field),
            (Shape::Positional, Row::Tuple(t)) => t.first(),
            (Shape::Identity, Row::Scalar(v)) => Some(v),
            _ => None,
        }
    }
}
