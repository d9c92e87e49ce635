mod common;

use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use common::{create_located_tour, create_tour, create_user, insert_tour, new_tour, start_date};
use tour_booking::domain::entities::{Difficulty, Location, GeoPoint, Role, TourPatch};
use tour_booking::domain::geo::{DistanceUnit, LatLng};
use tour_booking::domain::query_features::QueryFeatures;
use tour_booking::domain::repositories::{CrudRepository, TourRepository};
use tour_booking::infrastructure::persistence::PgTourRepository;

fn repo(pool: &PgPool) -> PgTourRepository {
    PgTourRepository::new(Arc::new(pool.clone()))
}

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

#[sqlx::test]
async fn test_insert_keeps_guide_order_and_locations(pool: PgPool) {
    let lead = create_user(&pool, "Miyah Myles", "miyah@example.io", Role::LeadGuide).await;
    let guide = create_user(&pool, "Jennifer Hardy", "jennifer@example.io", Role::Guide).await;
    let mut tour = new_tour("The Sea Explorer", 497.0, Difficulty::Medium);
    tour.guides = vec![guide.id, lead.id];
    tour.start_location = Some(GeoPoint::new(-80.185942, 25.774772));
    tour.locations = vec![Location {
        point: GeoPoint::new(-80.128473, 25.781842),
        day: Some(1),
    }];

    let created = insert_tour(&pool, tour).await;

    assert_eq!(created.guides.len(), 2);
    assert_eq!(created.guides[0].id, guide.id);
    assert_eq!(created.guides[1].role, Role::LeadGuide);
    assert_eq!(created.start_location.as_ref().unwrap().lat(), 25.774772);
    assert_eq!(created.locations[0].day, Some(1));
    assert_eq!(created.duration_weeks, 5.0 / 7.0);
}

#[sqlx::test]
async fn test_update_replaces_guides(pool: PgPool) {
    let first = create_user(&pool, "Miyah Myles", "miyah@example.io", Role::LeadGuide).await;
    let second = create_user(&pool, "Jennifer Hardy", "jennifer@example.io", Role::Guide).await;
    let mut tour = new_tour("The Sea Explorer", 497.0, Difficulty::Medium);
    tour.guides = vec![first.id];
    let tour = insert_tour(&pool, tour).await;

    let updated = repo(&pool)
        .update(
            tour.id,
            TourPatch {
                guides: Some(vec![second.id]),
                price: Some(550.0),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.price, 550.0);
    assert_eq!(updated.guides.len(), 1);
    assert_eq!(updated.guides[0].id, second.id);
    assert_eq!(updated.revision, tour.revision + 1);
}

#[sqlx::test]
async fn test_unknown_guide_is_rejected(pool: PgPool) {
    let mut tour = new_tour("The Sea Explorer", 497.0, Difficulty::Medium);
    tour.guides = vec![Uuid::new_v4()];

    let err = repo(&pool).insert(tour).await.unwrap_err();

    assert!(err.to_string().starts_with("Invalid input data"));
}

#[sqlx::test]
async fn test_sizes_and_price_are_checked(pool: PgPool) {
    let mut tour = new_tour("The Sea Explorer", 497.0, Difficulty::Medium);
    tour.duration = 0;
    let err = repo(&pool).insert(tour).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid input data. A tour must last at least one day"
    );

    let mut tour = new_tour("The Sea Explorer", 497.0, Difficulty::Medium);
    tour.max_group_size = -2;
    let err = repo(&pool).insert(tour).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid input data. A tour group must have at least one person"
    );

    let err = repo(&pool)
        .insert(new_tour("The Sea Explorer", -1.0, Difficulty::Medium))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid input data. A tour price cannot be negative"
    );
}

#[sqlx::test]
async fn test_deactivated_guides_are_hidden(pool: PgPool) {
    let guide = create_user(&pool, "Jennifer Hardy", "jennifer@example.io", Role::Guide).await;
    let mut tour = new_tour("The Sea Explorer", 497.0, Difficulty::Medium);
    tour.guides = vec![guide.id];
    let tour = insert_tour(&pool, tour).await;
    sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
        .bind(guide.id)
        .execute(&pool)
        .await
        .unwrap();

    let found = repo(&pool).find_by_id(tour.id).await.unwrap().unwrap();

    assert!(found.guides.is_empty());
}

#[sqlx::test]
async fn test_count_matches_filter(pool: PgPool) {
    create_tour(&pool, "The Forest Hiker", 397.0, Difficulty::Easy).await;
    create_tour(&pool, "The Sea Explorer", 497.0, Difficulty::Medium).await;
    create_tour(&pool, "The Snow Adventurer", 997.0, Difficulty::Difficult).await;
    let repo = repo(&pool);

    let f = features(&[("price[gte]", "497"), ("limit", "1")]);

    assert_eq!(repo.count(&f).await.unwrap(), 2);
    assert_eq!(repo.find_all(&f).await.unwrap().len(), 1);
}

#[sqlx::test]
async fn test_repeated_filter_matches_any_value(pool: PgPool) {
    create_tour(&pool, "The Forest Hiker", 397.0, Difficulty::Easy).await;
    create_tour(&pool, "The Sea Explorer", 497.0, Difficulty::Medium).await;
    create_tour(&pool, "The Snow Adventurer", 997.0, Difficulty::Difficult).await;
    let repo = repo(&pool);

    let f = features(&[("price", "397"), ("price", "997")]);

    assert_eq!(repo.count(&f).await.unwrap(), 2);
    let mut prices: Vec<f64> = repo
        .find_all(&f)
        .await
        .unwrap()
        .iter()
        .map(|t| t.price)
        .collect();
    prices.sort_by(f64::total_cmp);
    assert_eq!(prices, vec![397.0, 997.0]);
}

#[sqlx::test]
async fn test_populated_lookup_includes_reviews(pool: PgPool) {
    let tour = create_tour(&pool, "The Forest Hiker", 397.0, Difficulty::Easy).await;
    let user = create_user(&pool, "Lourdes Browning", "lourdes@example.io", Role::User).await;
    common::create_review(&pool, tour.id, user.id, 5.0).await;
    let repo = repo(&pool);

    let plain = repo.find_by_id(tour.id).await.unwrap().unwrap();
    let populated = repo.find_by_id_populated(tour.id).await.unwrap().unwrap();

    assert!(plain.reviews.is_none());
    let reviews = populated.reviews.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].user.name, "Lourdes Browning");
}

#[sqlx::test]
async fn test_stats_skip_secret_and_low_rated(pool: PgPool) {
    create_tour(&pool, "The Forest Hiker", 397.0, Difficulty::Easy).await;
    let mut low = new_tour("The Wine Taster", 1997.0, Difficulty::Easy);
    low.ratings_average = 3.5;
    insert_tour(&pool, low).await;
    let mut secret = new_tour("The Northern Lights", 2997.0, Difficulty::Easy);
    secret.secret_tour = true;
    insert_tour(&pool, secret).await;

    let stats = repo(&pool).stats().await.unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].difficulty, "EASY");
    assert_eq!(stats[0].num_tours, 1);
    assert_eq!(stats[0].max_price, 397.0);
}

#[sqlx::test]
async fn test_monthly_plan_limits_to_year(pool: PgPool) {
    let mut tour = new_tour("The Forest Hiker", 397.0, Difficulty::Easy);
    tour.start_dates = vec![
        start_date(2026, 12, 31),
        start_date(2027, 1, 1),
        start_date(2027, 3, 5),
        start_date(2027, 3, 20),
    ];
    insert_tour(&pool, tour).await;

    let plan = repo(&pool).monthly_plan(2027).await.unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].month, 3);
    assert_eq!(plan[0].num_tour_starts, 2);
    assert_eq!(plan[1].month, 1);
}

#[sqlx::test]
async fn test_geo_queries(pool: PgPool) {
    create_located_tour(&pool, "The Sea Explorer", -80.185942, 25.774772).await;
    create_located_tour(&pool, "The Star Gazer", -118.2437, 34.0522).await;
    let repo = repo(&pool);
    let center = LatLng {
        lat: 25.7617,
        lng: -80.1918,
    };

    let unit = DistanceUnit::Miles;
    let near = repo.within(center, unit.to_radians(50.0)).await.unwrap();
    assert_eq!(near.len(), 1);
    assert_eq!(near[0].name, "The Sea Explorer");

    let all = repo.within(center, unit.to_radians(5000.0)).await.unwrap();
    assert_eq!(all.len(), 2);

    let distances = repo.distances(center, unit.multiplier()).await.unwrap();
    assert_eq!(distances[0].name, "The Sea Explorer");
    assert!(distances[0].distance < 5.0);
    assert!(distances[1].distance > 2000.0);
}
