//! End-to-end properties of the booking engine against a real Postgres.
//!
//! These tests need a running database (`DATABASE_URL`), so they are
//! `#[ignore]`d by default; run them with `cargo test -- --ignored`.

use secrecy::{SecretBox, SecretString};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use booking_backend::config::{
    self, AppConfig, AuthConfig, Config, DatabaseConfig, Environment, ServerConfig,
};
use booking_backend::db::{
    AppointmentRepository, AppointmentStatus, AvailabilityDayInput, BreakInput, NewUser, User,
    UserRepository, UserRole, WeeklyScheduleInput,
};
use booking_backend::error::AppError;
use booking_backend::modules::appointments::service as appointments;
use booking_backend::modules::availability::service as availability;

fn install_test_config() {
    config::init_with(Config {
        server: ServerConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: None,
            min_connections: None,
        },
        auth: AuthConfig {
            jwt_secret: SecretString::from(String::from("test-secret")),
            token_ttl_hours: 168,
        },
        app: AppConfig {
            name: String::from("booking-backend-tests"),
            environment: Environment::Development,
            strict_availability: false,
        },
    });
}

async fn create_user(pool: &PgPool, role: UserRole, email: &str) -> User {
    let new_user = NewUser {
        name: email.to_string(),
        email: email.to_string(),
        password: SecretBox::new(Box::new(String::from("Password123!"))),
        role,
        tz_offset_min: Some(0),
    };
    UserRepository::create(pool, &new_user, "not-a-real-hash")
        .await
        .expect("failed to seed user")
}

fn next_week() -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::days(7)
}

fn open_week_input() -> WeeklyScheduleInput {
    WeeklyScheduleInput {
        slot_step_min: 15,
        days: (0..7)
            .map(|dow| AvailabilityDayInput {
                day_of_week: dow,
                enabled: true,
                start: Some("00:00".to_string()),
                end: Some("23:59".to_string()),
                breaks: vec![],
            })
            .collect(),
    }
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn concurrent_creates_for_same_slot_book_exactly_once(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;
    let client_a = create_user(&pool, UserRole::Client, "a@example.com").await;
    let client_b = create_user(&pool, UserRole::Client, "b@example.com").await;

    let start_at = next_week();
    let (a, b) = tokio::join!(
        appointments::create_appointment(&pool, client_a.id, business.id, start_at, 60),
        appointments::create_appointment(&pool, client_b.id, business.id, start_at, 60),
    );

    let (won, lost) = match (a, b) {
        (Ok(appt), Err(err)) | (Err(err), Ok(appt)) => (appt, err),
        (Ok(_), Ok(_)) => panic!("both concurrent bookings succeeded"),
        (Err(a), Err(b)) => panic!("both concurrent bookings failed: {a}, {b}"),
    };
    assert_eq!(won.status, AppointmentStatus::Booked);
    assert!(matches!(lost, AppError::Conflict(_)), "loser got: {lost}");
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn back_to_back_bookings_do_not_conflict(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;
    let client = create_user(&pool, UserRole::Client, "client@example.com").await;

    let start_at = next_week();
    appointments::create_appointment(&pool, client.id, business.id, start_at, 60)
        .await
        .expect("first booking");

    // Touching endpoint: starts exactly where the first ends.
    appointments::create_appointment(
        &pool,
        client.id,
        business.id,
        start_at + Duration::minutes(60),
        60,
    )
    .await
    .expect("adjacent booking must not conflict");

    // One shared minute does conflict.
    let err = appointments::create_appointment(
        &pool,
        client.id,
        business.id,
        start_at + Duration::minutes(119),
        30,
    )
    .await
    .expect_err("overlapping booking must conflict");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn cancel_is_idempotent(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;
    let client = create_user(&pool, UserRole::Client, "client@example.com").await;

    let appt = appointments::create_appointment(&pool, client.id, business.id, next_week(), 30)
        .await
        .unwrap();

    let first = appointments::cancel_appointment(&pool, appt.id, client.id, UserRole::Client)
        .await
        .unwrap();
    assert_eq!(first.status, AppointmentStatus::Canceled);

    let second = appointments::cancel_appointment(&pool, appt.id, client.id, UserRole::Client)
        .await
        .expect("second cancel must not error");
    assert_eq!(second.status, AppointmentStatus::Canceled);
    assert_eq!(second.updated_at, first.updated_at, "no re-stamp on repeat");

    // The freed slot is bookable again.
    appointments::create_appointment(&pool, client.id, business.id, appt.start_at, 30)
        .await
        .expect("canceled slot must be free");
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn cancel_enforces_ownership_per_role(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;
    let other_business = create_user(&pool, UserRole::Business, "biz2@example.com").await;
    let client = create_user(&pool, UserRole::Client, "client@example.com").await;
    let other_client = create_user(&pool, UserRole::Client, "client2@example.com").await;

    let appt = appointments::create_appointment(&pool, client.id, business.id, next_week(), 30)
        .await
        .unwrap();

    for (user_id, role) in [
        (other_client.id, UserRole::Client),
        (other_business.id, UserRole::Business),
    ] {
        let err = appointments::cancel_appointment(&pool, appt.id, user_id, role)
            .await
            .expect_err("non-owner cancel must fail");
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    // The owning business can cancel bookings made with it.
    let canceled =
        appointments::cancel_appointment(&pool, appt.id, business.id, UserRole::Business)
            .await
            .unwrap();
    assert_eq!(canceled.status, AppointmentStatus::Canceled);
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn foreign_reschedule_is_forbidden_and_leaves_row_unchanged(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;
    let client = create_user(&pool, UserRole::Client, "client@example.com").await;
    let intruder = create_user(&pool, UserRole::Client, "intruder@example.com").await;

    let appt = appointments::create_appointment(&pool, client.id, business.id, next_week(), 30)
        .await
        .unwrap();

    let err = appointments::reschedule_appointment(
        &pool,
        appt.id,
        intruder.id,
        UserRole::Client,
        appt.start_at + Duration::hours(1),
        60,
    )
    .await
    .expect_err("foreign reschedule must fail");
    assert!(matches!(err, AppError::Forbidden(_)));

    let stored = AppointmentRepository::get_by_id(&pool, appt.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.start_at, appt.start_at);
    assert_eq!(stored.duration_min, appt.duration_min);
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn reschedule_moves_booking_and_respects_conflicts(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;
    let client = create_user(&pool, UserRole::Client, "client@example.com").await;

    let start_at = next_week();
    let appt = appointments::create_appointment(&pool, client.id, business.id, start_at, 60)
        .await
        .unwrap();
    let blocker = appointments::create_appointment(
        &pool,
        client.id,
        business.id,
        start_at + Duration::hours(3),
        60,
    )
    .await
    .unwrap();

    // Overlapping itself is fine: the scan excludes the appointment's own row.
    let moved = appointments::reschedule_appointment(
        &pool,
        appt.id,
        client.id,
        UserRole::Client,
        start_at + Duration::minutes(30),
        60,
    )
    .await
    .expect("shifting within own slot must work");
    assert_eq!(moved.start_at, start_at + Duration::minutes(30));

    // Moving onto another booking conflicts.
    let err = appointments::reschedule_appointment(
        &pool,
        appt.id,
        client.id,
        UserRole::Client,
        blocker.start_at + Duration::minutes(15),
        30,
    )
    .await
    .expect_err("moving onto a blocker must conflict");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn generated_slot_round_trips_into_a_booking(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;
    let client = create_user(&pool, UserRole::Client, "client@example.com").await;

    availability::replace_schedule(&pool, business.id, &open_week_input())
        .await
        .unwrap();

    let from = OffsetDateTime::now_utc() + Duration::days(1);
    let slots = availability::free_slots_for_business(&pool, business.id, from, from + Duration::days(1), 60, 15)
        .await
        .unwrap();
    assert!(!slots.is_empty());

    let slot = slots[0];
    let appt = appointments::create_appointment(&pool, client.id, business.id, slot, 60)
        .await
        .expect("a generated slot must be bookable");
    assert_eq!(appt.start_at, slot);

    // The booked slot disappears from the next generation.
    let regenerated =
        availability::free_slots_for_business(&pool, business.id, from, from + Duration::days(1), 60, 15)
            .await
            .unwrap();
    assert!(!regenerated.contains(&slot));
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn replace_schedule_drops_breaks_outside_the_window(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;

    let input = WeeklyScheduleInput {
        slot_step_min: 15,
        days: vec![AvailabilityDayInput {
            day_of_week: 1,
            enabled: true,
            start: Some("09:00".to_string()),
            end: Some("17:00".to_string()),
            breaks: vec![
                BreakInput {
                    start: "07:00".to_string(),
                    end: "08:00".to_string(),
                },
                BreakInput {
                    start: "13:00".to_string(),
                    end: "14:00".to_string(),
                },
            ],
        }],
    };

    let view = availability::replace_schedule(&pool, business.id, &input)
        .await
        .unwrap();
    assert_eq!(view.days.len(), 1);
    assert_eq!(view.days[0].breaks.len(), 1, "out-of-window break must vanish");
    assert_eq!(view.days[0].breaks[0].start_min, 13 * 60);

    // Re-submitting with day 1 disabled removes the window and its breaks.
    let cleared = availability::replace_schedule(
        &pool,
        business.id,
        &WeeklyScheduleInput {
            slot_step_min: 15,
            days: vec![AvailabilityDayInput {
                day_of_week: 1,
                enabled: false,
                start: None,
                end: None,
                breaks: vec![],
            }],
        },
    )
    .await
    .unwrap();
    assert!(cleared.days.is_empty());
}

#[sqlx::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn unconfigured_business_follows_default_open_policy(pool: PgPool) {
    install_test_config();
    let business = create_user(&pool, UserRole::Business, "biz@example.com").await;
    let client = create_user(&pool, UserRole::Client, "client@example.com").await;

    // No schedule rows at all: booking is allowed (legacy default-open) ...
    appointments::create_appointment(&pool, client.id, business.id, next_week(), 30)
        .await
        .expect("default-open business must accept bookings");

    // ... but no slots are advertised.
    let from = OffsetDateTime::now_utc() + Duration::days(1);
    let slots =
        availability::free_slots_for_business(&pool, business.id, from, from + Duration::days(1), 30, 15)
            .await
            .unwrap();
    assert!(slots.is_empty());
}
