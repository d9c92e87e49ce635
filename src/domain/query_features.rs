//! Query-string driven filtering, sorting, projection and pagination.
//!
//! [`QueryFeatures`] is built from the raw query pairs of a list request and
//! refined step by step:
//!
//! ```ignore
//! let features = QueryFeatures::new(pairs)
//!     .filter()
//!     .sort()
//!     .limit_fields()?
//!     .paginate();
//! ```
//!
//! The result is storage-agnostic: repositories translate the conditions into
//! their own query language and [`Projection::apply`] trims the serialized
//! documents.
//!
//! | Parameter | Example | Meaning |
//! |-----------|---------|---------|
//! | any field | `difficulty=easy` | equality |
//! | repeatable field | `duration=5&duration=9` | any of the values |
//! | `field[op]` | `price[lt]=1500` | `gt`, `gte`, `lt`, `lte` |
//! | `sort` | `sort=-price,name` | comma list, `-` for descending |
//! | `fields` | `fields=name,price` | inclusion or exclusion (`-name`) |
//! | `page`, `limit` | `page=2&limit=10` | pagination |

use serde_json::{Map, Value, json};

use crate::error::AppError;

/// Query keys that control the listing instead of filtering it.
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 100;

/// Fields whose repeated equality filters match any of the given values.
/// Every other repeated key keeps only its last value.
pub const MULTI_VALUE_FIELDS: [&str; 6] = [
    "duration",
    "ratingsQuantity",
    "ratingsAverage",
    "maxGroupSize",
    "difficulty",
    "price",
];

/// Fields never returned unless explicitly requested.
const HIDDEN_BY_DEFAULT: [&str; 1] = ["revision"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Equal to one of the values.
    In(Vec<String>),
    /// An operator that is not supported; rejected when the query executes.
    Unsupported(String),
}

impl Comparison {
    fn parse(op: &str) -> Self {
        match op {
            "gt" => Comparison::Gt,
            "gte" => Comparison::Gte,
            "lt" => Comparison::Lt,
            "lte" => Comparison::Lte,
            other => Comparison::Unsupported(other.to_string()),
        }
    }

    /// SQL operator, or `None` for unsupported comparisons.
    pub fn sql_operator(&self) -> Option<&'static str> {
        match self {
            Comparison::Eq => Some("="),
            Comparison::Gt => Some(">"),
            Comparison::Gte => Some(">="),
            Comparison::Lt => Some("<"),
            Comparison::Lte => Some("<="),
            Comparison::In(_) | Comparison::Unsupported(_) => None,
        }
    }
}

/// A single `field <op> value` condition. The value stays a string until the
/// repository casts it to the column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub op: Comparison,
    /// Raw query value. For [`Comparison::In`] the values joined with commas.
    pub value: String,
}

impl Condition {
    /// Turns an equality into a match against any of its values.
    fn widen(&mut self, value: &str) {
        let mut values = match std::mem::replace(&mut self.op, Comparison::Eq) {
            Comparison::In(values) => values,
            _ => vec![self.value.clone()],
        };
        values.push(value.to_string());
        self.value = values.join(",");
        self.op = Comparison::In(values);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest.trim(), true),
            None => (raw.trim_start_matches('+'), false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }
}

/// Field selection applied to serialized documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// Everything except internal bookkeeping fields.
    #[default]
    Default,
    /// Only the listed fields (plus `id`).
    Include(Vec<String>),
    /// Everything except the listed fields.
    Exclude(Vec<String>),
}

impl Projection {
    fn parse(raw: &str) -> Result<Self, AppError> {
        let items: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if items.is_empty() {
            return Ok(Projection::Default);
        }

        let excluded = items.iter().filter(|s| s.starts_with('-')).count();
        if excluded == items.len() {
            Ok(Projection::Exclude(
                items
                    .iter()
                    .map(|s| s.trim_start_matches('-').to_string())
                    .collect(),
            ))
        } else if excluded == 0 {
            Ok(Projection::Include(items.iter().map(|s| s.to_string()).collect()))
        } else {
            Err(AppError::bad_request(
                "Projection cannot have a mix of inclusion and exclusion.",
                json!({ "fields": raw }),
            ))
        }
    }

    /// Applies the projection to a serialized document. Non-object values are
    /// returned untouched.
    pub fn apply(&self, value: Value) -> Value {
        let Value::Object(map) = value else {
            return value;
        };

        let projected: Map<String, Value> = match self {
            Projection::Default => map
                .into_iter()
                .filter(|(key, _)| !HIDDEN_BY_DEFAULT.contains(&key.as_str()))
                .collect(),
            Projection::Include(fields) => map
                .into_iter()
                .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                .collect(),
            Projection::Exclude(fields) => map
                .into_iter()
                .filter(|(key, _)| !fields.iter().any(|f| f == key))
                .collect(),
        };

        Value::Object(projected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Listing options derived from a request's query string.
#[derive(Debug, Clone, Default)]
pub struct QueryFeatures {
    params: Vec<(String, String)>,
    conditions: Vec<Condition>,
    sort: Vec<SortKey>,
    projection: Projection,
    pagination: Option<Pagination>,
}

impl QueryFeatures {
    pub fn new(params: Vec<(String, String)>) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// The last value given for `key`.
    fn last(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Turns every non-reserved query key into a condition.
    ///
    /// `field=value` is equality and `field[op]=value` a comparison. A
    /// repeated [`MULTI_VALUE_FIELDS`] equality matches any of its values,
    /// otherwise the last value wins.
    pub fn filter(mut self) -> Self {
        let mut conditions: Vec<Condition> = Vec::new();

        for (key, value) in &self.params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }

            let (field, op) = match key.split_once('[') {
                Some((field, rest)) => (field, Comparison::parse(rest.trim_end_matches(']'))),
                None => (key.as_str(), Comparison::Eq),
            };

            if op == Comparison::Eq && MULTI_VALUE_FIELDS.contains(&field) {
                let existing = conditions.iter_mut().find(|c| {
                    c.field == field && matches!(c.op, Comparison::Eq | Comparison::In(_))
                });
                if let Some(existing) = existing {
                    existing.widen(value);
                    continue;
                }
            }

            conditions.retain(|c| !(c.field == field && c.op == op));
            conditions.push(Condition {
                field: field.to_string(),
                op,
                value: value.clone(),
            });
        }

        self.conditions.extend(conditions);
        self
    }

    /// Parses `sort`, defaulting to newest first.
    pub fn sort(mut self) -> Self {
        self.sort = match self.last("sort") {
            Some(raw) => raw.split(',').filter_map(SortKey::parse).collect(),
            None => vec![SortKey {
                field: "createdAt".to_string(),
                descending: true,
            }],
        };
        self
    }

    /// Parses `fields`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when inclusion and exclusion are mixed.
    pub fn limit_fields(mut self) -> Result<Self, AppError> {
        if let Some(raw) = self.last("fields") {
            self.projection = Projection::parse(raw)?;
        }
        Ok(self)
    }

    /// Parses `page` and `limit`. Missing, non-numeric or non-positive values
    /// fall back to the defaults.
    pub fn paginate(mut self) -> Self {
        let positive = |key: &str, default: i64| {
            self.last(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };

        let page = positive("page", DEFAULT_PAGE);
        let limit = positive("limit", DEFAULT_LIMIT);

        self.pagination = Some(Pagination { page, limit });
        self
    }

    /// Adds an equality condition that scopes the listing, e.g. to a parent
    /// document.
    pub fn with_condition(mut self, field: &str, value: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            op: Comparison::Eq,
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }
}
