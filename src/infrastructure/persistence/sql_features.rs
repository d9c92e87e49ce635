//! Translation of [`QueryFeatures`] into SQL.
//!
//! Each repository declares the document fields it exposes as a static
//! [`Column`] table. Filters and sort keys are resolved against that table
//! only, so query-string input never reaches the SQL text: column names come
//! from the table and values are always bound.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::query_features::{Comparison, Condition, QueryFeatures};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Uuid,
}

/// A filterable and sortable document field.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Field name as it appears in the API.
    pub field: &'static str,
    /// Qualified SQL column.
    pub column: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(field: &'static str, column: &'static str, kind: ColumnKind) -> Self {
        Self {
            field,
            column,
            kind,
        }
    }
}

fn lookup<'a>(columns: &'a [Column], field: &str) -> Option<&'a Column> {
    columns.iter().find(|c| c.field == field)
}

/// Appends ` AND <condition>` for every condition of `features`.
///
/// A field missing from `columns` matches nothing.
///
/// # Errors
///
/// Returns a cast error when a value does not parse as the column type or the
/// operator is unsupported.
pub fn push_conditions(
    qb: &mut QueryBuilder<'_, Postgres>,
    columns: &[Column],
    features: &QueryFeatures,
) -> Result<(), AppError> {
    for condition in features.conditions() {
        let Some(column) = lookup(columns, &condition.field) else {
            qb.push(" AND FALSE");
            continue;
        };

        if let Comparison::In(values) = &condition.op {
            qb.push(" AND ").push(column.column).push(" = ANY(");
            push_values(qb, column, &condition.field, values)?;
            qb.push(")");
            continue;
        }

        let Some(op) = condition.op.sql_operator() else {
            return Err(unsupported(condition));
        };

        qb.push(" AND ")
            .push(column.column)
            .push(" ")
            .push(op)
            .push(" ");
        push_value(qb, column, condition)?;
    }
    Ok(())
}

fn unsupported(condition: &Condition) -> AppError {
    let op = match &condition.op {
        Comparison::Unsupported(op) => op.as_str(),
        _ => "",
    };
    AppError::cast(&format!("{}[{op}]", condition.field), &condition.value)
}

fn push_value(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &Column,
    condition: &Condition,
) -> Result<(), AppError> {
    let raw = condition.value.trim();
    let cast_err = || AppError::cast(&condition.field, &condition.value);

    match column.kind {
        ColumnKind::Text => {
            qb.push_bind(condition.value.clone());
        }
        ColumnKind::Integer => {
            let v: i64 = raw.parse().map_err(|_| cast_err())?;
            qb.push_bind(v);
        }
        ColumnKind::Float => {
            let v: f64 = raw.parse().map_err(|_| cast_err())?;
            qb.push_bind(v);
        }
        ColumnKind::Boolean => {
            let v: bool = raw.parse().map_err(|_| cast_err())?;
            qb.push_bind(v);
        }
        ColumnKind::Timestamp => {
            let v = parse_timestamp(raw).ok_or_else(cast_err)?;
            qb.push_bind(v);
        }
        ColumnKind::Uuid => {
            let v = Uuid::parse_str(raw).map_err(|_| cast_err())?;
            qb.push_bind(v);
        }
    }
    Ok(())
}

/// Binds every value as one array of the column type.
fn push_values(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &Column,
    field: &str,
    values: &[String],
) -> Result<(), AppError> {
    fn cast_all<T>(
        field: &str,
        values: &[String],
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Vec<T>, AppError> {
        values
            .iter()
            .map(|raw| parse(raw.trim()).ok_or_else(|| AppError::cast(field, raw)))
            .collect()
    }

    match column.kind {
        ColumnKind::Text => {
            qb.push_bind(values.to_vec());
        }
        ColumnKind::Integer => {
            qb.push_bind(cast_all(field, values, |v| v.parse::<i64>().ok())?);
        }
        ColumnKind::Float => {
            qb.push_bind(cast_all(field, values, |v| v.parse::<f64>().ok())?);
        }
        ColumnKind::Boolean => {
            qb.push_bind(cast_all(field, values, |v| v.parse::<bool>().ok())?);
        }
        ColumnKind::Timestamp => {
            qb.push_bind(cast_all(field, values, parse_timestamp)?);
        }
        ColumnKind::Uuid => {
            qb.push_bind(cast_all(field, values, |v| Uuid::parse_str(v).ok())?);
        }
    }
    Ok(())
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Appends `ORDER BY` for known sort keys, always ending with `id_column` so
/// pages are stable.
pub fn push_order_by(
    qb: &mut QueryBuilder<'_, Postgres>,
    columns: &[Column],
    features: &QueryFeatures,
    id_column: &'static str,
) {
    qb.push(" ORDER BY ");
    for key in features.sort_keys() {
        if let Some(column) = lookup(columns, &key.field) {
            qb.push(column.column)
                .push(if key.descending { " DESC, " } else { " ASC, " });
        }
    }
    qb.push(id_column).push(" ASC");
}

/// Appends `LIMIT`/`OFFSET` when the listing is paginated.
pub fn push_pagination(qb: &mut QueryBuilder<'_, Postgres>, features: &QueryFeatures) {
    if let Some(pagination) = features.pagination() {
        qb.push(" LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[
        Column::new("name", "t.name", ColumnKind::Text),
        Column::new("price", "t.price", ColumnKind::Float),
        Column::new("duration", "t.duration", ColumnKind::Integer),
        Column::new("createdAt", "t.created_at", ColumnKind::Timestamp),
    ];

    fn features(pairs: &[(&str, &str)]) -> QueryFeatures {
        QueryFeatures::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .filter()
        .sort()
        .paginate()
    }

    fn build(f: &QueryFeatures) -> Result<String, AppError> {
        let mut qb = QueryBuilder::new("SELECT * FROM tours t WHERE TRUE");
        push_conditions(&mut qb, COLUMNS, f)?;
        push_order_by(&mut qb, COLUMNS, f, "t.id");
        push_pagination(&mut qb, f);
        Ok(qb.sql().to_string())
    }

    #[test]
    fn test_conditions_are_bound() {
        let sql = build(&features(&[("price[lt]", "1500"), ("duration", "5")])).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM tours t WHERE TRUE AND t.price < $1 AND t.duration = $2 \
             ORDER BY t.created_at DESC, t.id ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_repeated_values_match_any() {
        let sql = build(&features(&[("duration", "5"), ("duration", "9"), ("price[gte]", "500")]))
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM tours t WHERE TRUE AND t.duration = ANY($1) AND t.price >= $2 \
             ORDER BY t.created_at DESC, t.id ASC LIMIT $3 OFFSET $4"
        );

        let err = build(&features(&[("price", "397"), ("price", "cheap")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid price: cheap");
    }

    #[test]
    fn test_unknown_field_matches_nothing() {
        let sql = build(&features(&[("color", "red")])).unwrap();
        assert!(sql.contains("AND FALSE"));
    }

    #[test]
    fn test_cast_failures() {
        let err = build(&features(&[("price", "cheap")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid price: cheap");

        let err = build(&features(&[("price[near]", "5")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid price[near]: 5");
    }

    #[test]
    fn test_unknown_sort_keys_are_ignored() {
        let sql = build(&features(&[("sort", "-color,name")])).unwrap();
        assert!(sql.contains("ORDER BY t.name ASC, t.id ASC"));
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2021-06-19").is_some());
        assert!(parse_timestamp("2021-06-19T09:00:00Z").is_some());
        assert!(parse_timestamp("next week").is_none());
    }
}
