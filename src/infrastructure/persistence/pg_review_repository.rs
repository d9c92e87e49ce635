//! PostgreSQL implementation of the review repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

use super::sql_features::{Column, ColumnKind, push_conditions, push_order_by, push_pagination};
use crate::domain::entities::{NewReview, RatingsSummary, Review, ReviewAuthor, ReviewPatch};
use crate::domain::query_features::QueryFeatures;
use crate::domain::repositories::{CrudRepository, ReviewRepository};
use crate::error::AppError;

/// Review columns joined with the author's public fields. Expects the review
/// relation as `r` and the users table as `u`.
pub(super) const REVIEW_FIELDS: &str = "r.id, r.review, r.rating, r.created_at, r.tour_id, \
     r.revision, u.id AS user_id, u.name AS user_name, u.photo AS user_photo";

const REVIEW_COLUMNS: &[Column] = &[
    Column::new("id", "r.id", ColumnKind::Uuid),
    Column::new("review", "r.review", ColumnKind::Text),
    Column::new("rating", "r.rating", ColumnKind::Float),
    Column::new("createdAt", "r.created_at", ColumnKind::Timestamp),
    Column::new("tour", "r.tour_id", ColumnKind::Uuid),
    Column::new("user", "r.user_id", ColumnKind::Uuid),
];

#[derive(Debug, FromRow)]
pub(super) struct ReviewRow {
    id: Uuid,
    review: String,
    rating: f64,
    created_at: DateTime<Utc>,
    tour_id: Uuid,
    revision: i32,
    user_id: Uuid,
    user_name: String,
    user_photo: Option<String>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            review: row.review,
            rating: row.rating,
            created_at: row.created_at,
            tour: row.tour_id,
            user: ReviewAuthor {
                id: row.user_id,
                name: row.user_name,
                photo: row.user_photo,
            },
            revision: row.revision,
        }
    }
}

#[derive(Debug, FromRow)]
struct RatingsRow {
    ratings_quantity: i32,
    ratings_average: f64,
}

/// PostgreSQL repository for reviews.
///
/// Every write recomputes the rating aggregate of the reviewed tour through
/// [`CrudRepository::after_write`].
pub struct PgReviewRepository {
    pool: Arc<PgPool>,
}

impl PgReviewRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// All reviews of one tour, newest first.
    pub(super) async fn for_tour(pool: &PgPool, tour_id: Uuid) -> Result<Vec<Review>, AppError> {
        let sql = format!(
            "SELECT {REVIEW_FIELDS} FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.tour_id = $1 ORDER BY r.created_at DESC, r.id ASC"
        );
        let rows: Vec<ReviewRow> = sqlx::query_as(&sql).bind(tour_id).fetch_all(pool).await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }
}

#[async_trait]
impl CrudRepository<Review> for PgReviewRepository {
    async fn find_all(&self, features: &QueryFeatures) -> Result<Vec<Review>, AppError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {REVIEW_FIELDS} FROM reviews r JOIN users u ON u.id = r.user_id WHERE TRUE"
        ));
        push_conditions(&mut qb, REVIEW_COLUMNS, features)?;
        push_order_by(&mut qb, REVIEW_COLUMNS, features, "r.id");
        push_pagination(&mut qb, features);

        let rows: Vec<ReviewRow> = qb.build_query_as().fetch_all(self.pool.as_ref()).await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn count(&self, features: &QueryFeatures) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM reviews r WHERE TRUE");
        push_conditions(&mut qb, REVIEW_COLUMNS, features)?;

        Ok(qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        let sql = format!(
            "SELECT {REVIEW_FIELDS} FROM reviews r JOIN users u ON u.id = r.user_id WHERE r.id = $1"
        );
        let row: Option<ReviewRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Review::from))
    }

    async fn insert(&self, new: NewReview) -> Result<Review, AppError> {
        let sql = format!(
            r#"
            WITH r AS (
                INSERT INTO reviews (review, rating, tour_id, user_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {REVIEW_FIELDS}
            FROM r
            JOIN users u ON u.id = r.user_id
            "#
        );
        let row: ReviewRow = sqlx::query_as(&sql)
            .bind(new.review)
            .bind(new.rating)
            .bind(new.tour)
            .bind(new.user)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn update(&self, id: Uuid, patch: ReviewPatch) -> Result<Option<Review>, AppError> {
        let mut qb = QueryBuilder::new("WITH r AS (UPDATE reviews SET revision = revision + 1");
        if let Some(review) = patch.review {
            qb.push(", review = ").push_bind(review);
        }
        if let Some(rating) = patch.rating {
            qb.push(", rating = ").push_bind(rating);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING *) SELECT ")
            .push(REVIEW_FIELDS)
            .push(" FROM r JOIN users u ON u.id = r.user_id");

        let row: Option<ReviewRow> = qb
            .build_query_as()
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.map(Review::from))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        let sql = format!(
            "WITH r AS (DELETE FROM reviews WHERE id = $1 RETURNING *) \
             SELECT {REVIEW_FIELDS} FROM r JOIN users u ON u.id = r.user_id"
        );
        let row: Option<ReviewRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Review::from))
    }

    async fn after_write(&self, doc: &Review) -> Result<(), AppError> {
        let summary = self.calc_average_ratings(doc.tour).await?;
        tracing::debug!(
            tour_id = %doc.tour,
            quantity = summary.ratings_quantity,
            average = summary.ratings_average,
            "tour ratings recomputed"
        );
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn calc_average_ratings(&self, tour_id: Uuid) -> Result<RatingsSummary, AppError> {
        let row: Option<RatingsRow> = sqlx::query_as(
            r#"
            WITH stats AS (
                SELECT COUNT(*)::int4 AS n, AVG(rating) AS avg
                FROM reviews
                WHERE tour_id = $1
            )
            UPDATE tours AS t
            SET ratings_quantity = stats.n,
                ratings_average = CASE
                    WHEN stats.n = 0 THEN 4.5
                    ELSE ROUND(stats.avg::numeric, 1)::float8
                END
            FROM stats
            WHERE t.id = $1
            RETURNING t.ratings_quantity, t.ratings_average
            "#,
        )
        .bind(tour_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(match row {
            Some(r) => RatingsSummary {
                ratings_quantity: r.ratings_quantity,
                ratings_average: r.ratings_average,
            },
            None => RatingsSummary {
                ratings_quantity: 0,
                ratings_average: 4.5,
            },
        })
    }
}
