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

//! Ordering: a field name with an optional `-` prefix for descending order.

use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigurationError;

/// Prefix of an `order_by` string that selects descending order.
pub const DESCENDING_MARKER: char = '-';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn is_descending(&self) -> bool {
        matches!(self, Direction::Desc)
    }
}

/// The field to order and seek by, and the direction.
///
/// `"created"` orders ascending and seeks with `created > bound`,
/// `"-created"` orders descending and seeks with `created < bound`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderBy {
    field: String,
    direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Desc,
        }
    }

    /// Parse an `order_by` string, stripping the direction marker.
    pub fn parse(s: &str) -> Result<Self, ConfigurationError> {
        let (field, direction) = match s.strip_prefix(DESCENDING_MARKER) {
            Some(rest) => (rest, Direction::Desc),
            None => (s, Direction::Asc),
        };

        let order = Self {
            field: field.to_string(),
            direction,
        };
        order.validate()?;
        Ok(order)
    }

    /// Check the field name is usable.
    ///
    /// Constructors other than [`OrderBy::parse`] do not validate.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.field.is_empty() || self.field.starts_with(DESCENDING_MARKER) {
            return Err(ConfigurationError::InvalidOrderBy(self.to_string()));
        }
        Ok(())
    }

    /// The field name without direction marker.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction.is_descending() {
            write!(f, "{}", DESCENDING_MARKER)?;
        }
        write!(f, "{}", self.field)
    }
}

impl FromStr for OrderBy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrderBy {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<OrderBy> for String {
    fn from(o: OrderBy) -> Self {
        o.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ascending() {
        let o = OrderBy::parse("created").unwrap();
        assert_eq!(o.field(), "created");
        assert_eq!(o.direction(), Direction::Asc);
        assert_eq!(o, OrderBy::asc("created"));
    }

    #[test]
    fn test_parse_descending_strips_marker() {
        let o: OrderBy = "-created".parse().unwrap();
        assert_eq!(o.field(), "created");
        assert!(o.direction().is_descending());
        assert_eq!(o.to_string(), "-created");
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(
            OrderBy::parse(""),
            Err(ConfigurationError::InvalidOrderBy("".to_string()))
        );
        assert_eq!(
            OrderBy::parse("-"),
            Err(ConfigurationError::InvalidOrderBy("-".to_string()))
        );
        assert_eq!(
            OrderBy::parse("--id"),
            Err(ConfigurationError::InvalidOrderBy("--id".to_string()))
        );
    }

    #[test]
    fn test_serde_as_string() -> anyhow::Result<()> {
        let o: OrderBy = serde_json::from_str("\"-id\"")?;
        assert_eq!(o, OrderBy::desc("id"));
        assert_eq!(serde_json::to_string(&o)?, "\"-id\"");

        let res: Result<OrderBy, _> = serde_json::from_str("\"\"");
        assert!(res.is_err());
        Ok(())
    }
}
