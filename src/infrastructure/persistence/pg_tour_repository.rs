//! PostgreSQL implementation of the tour repository.
//!
//! Tours live in `tours`, guides in the ordered `tour_guides` join table.
//! Secret tours are excluded from every read, update and delete.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool, QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::pg_review_repository::PgReviewRepository;
use super::sql_features::{Column, ColumnKind, push_conditions, push_order_by, push_pagination};
use crate::domain::entities::{
    Difficulty, GeoPoint, Guide, Location, MonthlyPlan, NewTour, Role, Tour,
    TourDistance, TourPatch, TourStats,
};
use crate::domain::geo::{EARTH_RADIUS_METRES, LatLng};
use crate::domain::query_features::QueryFeatures;
use crate::domain::repositories::{CrudRepository, TourRepository};
use crate::error::AppError;

const TOUR_FIELDS: &str = "t.id, t.name, t.slug, t.duration, t.max_group_size, t.difficulty, \
     t.ratings_average, t.ratings_quantity, t.price, t.price_discount, t.summary, \
     t.description, t.image_cover, t.images, t.created_at, t.start_dates, t.secret_tour, \
     t.start_lng, t.start_lat, t.start_address, t.start_description, t.locations, t.revision";

const TOUR_COLUMNS: &[Column] = &[
    Column::new("id", "t.id", ColumnKind::Uuid),
    Column::new("name", "t.name", ColumnKind::Text),
    Column::new("slug", "t.slug", ColumnKind::Text),
    Column::new("duration", "t.duration", ColumnKind::Integer),
    Column::new("maxGroupSize", "t.max_group_size", ColumnKind::Integer),
    Column::new("difficulty", "t.difficulty", ColumnKind::Text),
    Column::new("ratingsAverage", "t.ratings_average", ColumnKind::Float),
    Column::new("ratingsQuantity", "t.ratings_quantity", ColumnKind::Integer),
    Column::new("price", "t.price", ColumnKind::Float),
    Column::new("priceDiscount", "t.price_discount", ColumnKind::Float),
    Column::new("summary", "t.summary", ColumnKind::Text),
    Column::new("imageCover", "t.image_cover", ColumnKind::Text),
    Column::new("createdAt", "t.created_at", ColumnKind::Timestamp),
    Column::new("secretTour", "t.secret_tour", ColumnKind::Boolean),
];

/// Central angle between the start location of `t` and (`$1` lat, `$2` lng).
const CENTRAL_ANGLE: &str = "2 * ASIN(LEAST(1.0, SQRT(\
     POWER(SIN(RADIANS(t.start_lat - $1) / 2), 2) + \
     COS(RADIANS($1)) * COS(RADIANS(t.start_lat)) * \
     POWER(SIN(RADIANS(t.start_lng - $2) / 2), 2))))";

#[derive(Debug, FromRow)]
struct TourRow {
    id: Uuid,
    name: String,
    slug: String,
    duration: i32,
    max_group_size: i32,
    difficulty: String,
    ratings_average: f64,
    ratings_quantity: i32,
    price: f64,
    price_discount: Option<f64>,
    summary: String,
    description: Option<String>,
    image_cover: String,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    start_dates: Vec<DateTime<Utc>>,
    secret_tour: bool,
    start_lng: Option<f64>,
    start_lat: Option<f64>,
    start_address: Option<String>,
    start_description: Option<String>,
    locations: Json<Vec<Location>>,
    revision: i32,
}

impl TourRow {
    fn into_tour(self, guides: Vec<Guide>) -> Result<Tour, AppError> {
        let start_location = match (self.start_lng, self.start_lat) {
            (Some(lng), Some(lat)) => Some(GeoPoint {
                address: self.start_address,
                description: self.start_description,
                ..GeoPoint::new(lng, lat)
            }),
            _ => None,
        };

        Ok(Tour {
            id: self.id,
            name: self.name,
            slug: self.slug,
            duration: self.duration,
            max_group_size: self.max_group_size,
            difficulty: self.difficulty.parse::<Difficulty>()?,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary,
            description: self.description,
            image_cover: self.image_cover,
            images: self.images,
            created_at: self.created_at,
            start_dates: self.start_dates,
            secret_tour: self.secret_tour,
            start_location,
            locations: self.locations.0,
            guides,
            duration_weeks: Tour::weeks(self.duration),
            reviews: None,
            revision: self.revision,
        })
    }
}

#[derive(Debug, FromRow)]
struct GuideRow {
    tour_id: Uuid,
    id: Uuid,
    name: String,
    email: String,
    photo: Option<String>,
    role: String,
}

#[derive(Debug, FromRow)]
struct StatsRow {
    difficulty: String,
    num_tours: i64,
    num_ratings: i64,
    avg_rating: f64,
    avg_price: f64,
    min_price: f64,
    max_price: f64,
}

#[derive(Debug, FromRow)]
struct MonthRow {
    month: i32,
    num_tour_starts: i64,
    tours: Vec<String>,
}

#[derive(Debug, FromRow)]
struct DistanceRow {
    id: Uuid,
    name: String,
    distance: f64,
}

/// PostgreSQL repository for tours.
pub struct PgTourRepository {
    pool: Arc<PgPool>,
}

impl PgTourRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Loads active guides of the given tours, in their stored order.
    async fn load_guides(&self, tour_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Guide>>, AppError> {
        let rows: Vec<GuideRow> = sqlx::query_as(
            r#"
            SELECT tg.tour_id, u.id, u.name, u.email, u.photo, u.role
            FROM tour_guides tg
            JOIN users u ON u.id = tg.user_id
            WHERE tg.tour_id = ANY($1) AND u.active
            ORDER BY tg.tour_id, tg.position
            "#,
        )
        .bind(tour_ids)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut guides: HashMap<Uuid, Vec<Guide>> = HashMap::new();
        for row in rows {
            guides.entry(row.tour_id).or_default().push(Guide {
                id: row.id,
                name: row.name,
                email: row.email,
                photo: row.photo,
                role: row.role.parse::<Role>()?,
            });
        }
        Ok(guides)
    }

    /// Attaches guides to every row.
    async fn assemble(&self, rows: Vec<TourRow>) -> Result<Vec<Tour>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut guides = self.load_guides(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let tour_guides = guides.remove(&row.id).unwrap_or_default();
                row.into_tour(tour_guides)
            })
            .collect()
    }

    async fn assemble_one(&self, row: TourRow) -> Result<Tour, AppError> {
        let guides = self
            .load_guides(&[row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();
        row.into_tour(guides)
    }

    /// Rewrites the guide list of a tour, keeping the given order.
    async fn replace_guides(
        conn: &mut PgConnection,
        tour_id: Uuid,
        guides: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tour_guides WHERE tour_id = $1")
            .bind(tour_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO tour_guides (tour_id, user_id, position)
            SELECT $1, g.user_id, g.ord::int4
            FROM unnest($2::uuid[]) WITH ORDINALITY AS g(user_id, ord)
            "#,
        )
        .bind(tour_id)
        .bind(guides)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CrudRepository<Tour> for PgTourRepository {
    async fn find_all(&self, features: &QueryFeatures) -> Result<Vec<Tour>, AppError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {TOUR_FIELDS} FROM tours t WHERE t.secret_tour = FALSE"
        ));
        push_conditions(&mut qb, TOUR_COLUMNS, features)?;
        push_order_by(&mut qb, TOUR_COLUMNS, features, "t.id");
        push_pagination(&mut qb, features);

        let rows: Vec<TourRow> = qb.build_query_as().fetch_all(self.pool.as_ref()).await?;
        self.assemble(rows).await
    }

    async fn count(&self, features: &QueryFeatures) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tours t WHERE t.secret_tour = FALSE");
        push_conditions(&mut qb, TOUR_COLUMNS, features)?;

        Ok(qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.as_ref())
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tour>, AppError> {
        let sql =
            format!("SELECT {TOUR_FIELDS} FROM tours t WHERE t.id = $1 AND t.secret_tour = FALSE");
        let row: Option<TourRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row {
            Some(row) => Ok(Some(self.assemble_one(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_id_populated(&self, id: Uuid) -> Result<Option<Tour>, AppError> {
        let Some(mut tour) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        tour.reviews = Some(PgReviewRepository::for_tour(self.pool.as_ref(), id).await?);
        Ok(Some(tour))
    }

    async fn insert(&self, new: NewTour) -> Result<Tour, AppError> {
        let NewTour {
            name,
            slug,
            duration,
            max_group_size,
            difficulty,
            ratings_average,
            ratings_quantity,
            price,
            price_discount,
            summary,
            description,
            image_cover,
            images,
            start_dates,
            secret_tour,
            start_location,
            locations,
            guides,
        } = new;

        let sql = format!(
            r#"
            INSERT INTO tours AS t (
                name, slug, duration, max_group_size, difficulty, ratings_average,
                ratings_quantity, price, price_discount, summary, description, image_cover,
                images, start_dates, secret_tour, start_lng, start_lat, start_address,
                start_description, locations
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING {TOUR_FIELDS}
            "#
        );

        let mut tx = self.pool.begin().await?;

        let row: TourRow = sqlx::query_as(&sql)
            .bind(name)
            .bind(slug)
            .bind(duration)
            .bind(max_group_size)
            .bind(difficulty.as_str())
            .bind(ratings_average)
            .bind(ratings_quantity)
            .bind(price)
            .bind(price_discount)
            .bind(summary)
            .bind(description)
            .bind(image_cover)
            .bind(images)
            .bind(start_dates)
            .bind(secret_tour)
            .bind(start_location.as_ref().map(GeoPoint::lng))
            .bind(start_location.as_ref().map(GeoPoint::lat))
            .bind(start_location.as_ref().and_then(|p| p.address.clone()))
            .bind(start_location.as_ref().and_then(|p| p.description.clone()))
            .bind(Json(locations))
            .fetch_one(&mut *tx)
            .await?;

        Self::replace_guides(&mut tx, row.id, &guides).await?;
        tx.commit().await?;

        self.assemble_one(row).await
    }

    async fn update(&self, id: Uuid, patch: TourPatch) -> Result<Option<Tour>, AppError> {
        let mut qb = QueryBuilder::new("UPDATE tours AS t SET revision = t.revision + 1");
        if let Some(v) = patch.name {
            qb.push(", name = ").push_bind(v);
        }
        if let Some(v) = patch.slug {
            qb.push(", slug = ").push_bind(v);
        }
        if let Some(v) = patch.duration {
            qb.push(", duration = ").push_bind(v);
        }
        if let Some(v) = patch.max_group_size {
            qb.push(", max_group_size = ").push_bind(v);
        }
        if let Some(v) = patch.difficulty {
            qb.push(", difficulty = ").push_bind(v.as_str());
        }
        if let Some(v) = patch.ratings_average {
            qb.push(", ratings_average = ").push_bind(v);
        }
        if let Some(v) = patch.ratings_quantity {
            qb.push(", ratings_quantity = ").push_bind(v);
        }
        if let Some(v) = patch.price {
            qb.push(", price = ").push_bind(v);
        }
        if let Some(v) = patch.price_discount {
            qb.push(", price_discount = ").push_bind(v);
        }
        if let Some(v) = patch.summary {
            qb.push(", summary = ").push_bind(v);
        }
        if let Some(v) = patch.description {
            qb.push(", description = ").push_bind(v);
        }
        if let Some(v) = patch.image_cover {
            qb.push(", image_cover = ").push_bind(v);
        }
        if let Some(v) = patch.images {
            qb.push(", images = ").push_bind(v);
        }
        if let Some(v) = patch.start_dates {
            qb.push(", start_dates = ").push_bind(v);
        }
        if let Some(v) = patch.secret_tour {
            qb.push(", secret_tour = ").push_bind(v);
        }
        if let Some(point) = patch.start_location {
            qb.push(", start_lng = ")
                .push_bind(point.lng())
                .push(", start_lat = ")
                .push_bind(point.lat())
                .push(", start_address = ")
                .push_bind(point.address)
                .push(", start_description = ")
                .push_bind(point.description);
        }
        if let Some(v) = patch.locations {
            qb.push(", locations = ").push_bind(Json(v));
        }
        qb.push(" WHERE t.id = ")
            .push_bind(id)
            .push(" AND t.secret_tour = FALSE RETURNING ")
            .push(TOUR_FIELDS);

        let mut tx = self.pool.begin().await?;

        let row: Option<TourRow> = qb.build_query_as().fetch_optional(&mut *tx).await?;
        let Some(row) = row else {
            return Ok(None);
        };

        if let Some(guides) = patch.guides {
            Self::replace_guides(&mut tx, row.id, &guides).await?;
        }
        tx.commit().await?;

        Ok(Some(self.assemble_one(row).await?))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Tour>, AppError> {
        let sql = format!(
            "DELETE FROM tours AS t WHERE t.id = $1 AND t.secret_tour = FALSE RETURNING {TOUR_FIELDS}"
        );
        let row: Option<TourRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(|r| r.into_tour(Vec::new())).transpose()
    }
}

#[async_trait]
impl TourRepository for PgTourRepository {
    async fn stats(&self) -> Result<Vec<TourStats>, AppError> {
        let rows: Vec<StatsRow> = sqlx::query_as(
            r#"
            SELECT
                UPPER(difficulty) AS difficulty,
                COUNT(*) AS num_tours,
                COALESCE(SUM(ratings_quantity), 0)::int8 AS num_ratings,
                AVG(ratings_average) AS avg_rating,
                AVG(price) AS avg_price,
                MIN(price) AS min_price,
                MAX(price) AS max_price
            FROM tours
            WHERE ratings_average >= 4.5 AND secret_tour = FALSE
            GROUP BY UPPER(difficulty)
            ORDER BY avg_price ASC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TourStats {
                difficulty: r.difficulty,
                num_tours: r.num_tours,
                num_ratings: r.num_ratings,
                avg_rating: r.avg_rating,
                avg_price: r.avg_price,
                min_price: r.min_price,
                max_price: r.max_price,
            })
            .collect())
    }

    async fn monthly_plan(&self, year: i32) -> Result<Vec<MonthlyPlan>, AppError> {
        let start_of = |y: i32| {
            NaiveDate::from_ymd_opt(y, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .ok_or_else(|| AppError::cast("year", &y.to_string()))
        };
        let from = start_of(year)?;
        let to = start_of(year + 1)?;

        let rows: Vec<MonthRow> = sqlx::query_as(
            r#"
            SELECT
                EXTRACT(MONTH FROM d.start_date)::int4 AS month,
                COUNT(*) AS num_tour_starts,
                array_agg(t.name ORDER BY t.name) AS tours
            FROM tours t
            CROSS JOIN LATERAL unnest(t.start_dates) AS d(start_date)
            WHERE t.secret_tour = FALSE
              AND d.start_date >= $1
              AND d.start_date < $2
            GROUP BY month
            ORDER BY num_tour_starts DESC, month ASC
            LIMIT 12
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MonthlyPlan {
                month: r.month,
                num_tour_starts: r.num_tour_starts,
                tours: r.tours,
            })
            .collect())
    }

    async fn within(&self, center: LatLng, radians: f64) -> Result<Vec<Tour>, AppError> {
        let sql = format!(
            r#"
            SELECT {TOUR_FIELDS}
            FROM tours t
            WHERE t.secret_tour = FALSE
              AND t.start_lat IS NOT NULL
              AND {CENTRAL_ANGLE} <= $3
            ORDER BY t.created_at DESC, t.id ASC
            "#
        );
        let rows: Vec<TourRow> = sqlx::query_as(&sql)
            .bind(center.lat)
            .bind(center.lng)
            .bind(radians)
            .fetch_all(self.pool.as_ref())
            .await?;

        self.assemble(rows).await
    }

    async fn distances(
        &self,
        center: LatLng,
        multiplier: f64,
    ) -> Result<Vec<TourDistance>, AppError> {
        let sql = format!(
            r#"
            SELECT t.id, t.name, {CENTRAL_ANGLE} * $3 * $4 AS distance
            FROM tours t
            WHERE t.secret_tour = FALSE AND t.start_lat IS NOT NULL
            ORDER BY distance ASC, t.id ASC
            "#
        );
        let rows: Vec<DistanceRow> = sqlx::query_as(&sql)
            .bind(center.lat)
            .bind(center.lng)
            .bind(EARTH_RADIUS_METRES)
            .bind(multiplier)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| TourDistance {
                id: r.id,
                name: r.name,
                distance: r.distance,
            })
            .collect())
    }
}
