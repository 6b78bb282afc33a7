use sqlx::{Error, PgPool};
use uuid::Uuid;

use crate::db::models::{BreakRow, WorkingHourRow};
use crate::scheduling::schedule::{NormalizedDay, WeeklySchedule};

pub struct AvailabilityRepository;

impl AvailabilityRepository {
    pub async fn working_hours(
        pool: &PgPool,
        business_id: Uuid,
    ) -> Result<Vec<WorkingHourRow>, Error> {
        sqlx::query_as::<_, WorkingHourRow>(
            r#"
            SELECT id, business_id, day_of_week, start_min, end_min
            FROM business_working_hours
            WHERE business_id = $1
            ORDER BY day_of_week ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(pool)
        .await
    }

    pub async fn breaks(pool: &PgPool, business_id: Uuid) -> Result<Vec<BreakRow>, Error> {
        sqlx::query_as::<_, BreakRow>(
            r#"
            SELECT id, business_id, day_of_week, start_min, end_min
            FROM business_breaks
            WHERE business_id = $1
            ORDER BY day_of_week ASC, start_min ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(pool)
        .await
    }

    pub async fn weekly_schedule(
        pool: &PgPool,
        business_id: Uuid,
    ) -> Result<WeeklySchedule, Error> {
        let windows = Self::working_hours(pool, business_id).await?;
        let breaks = Self::breaks(pool, business_id).await?;
        Ok(WeeklySchedule::from_rows(&windows, &breaks))
    }

    /// Replace a business's whole weekly schedule in one transaction:
    /// windows for weekdays absent from the new input are deleted, present
    /// weekdays are upserted, and breaks are deleted and re-inserted. A
    /// failure anywhere rolls the whole write back, so windows and breaks
    /// can never go out of step.
    pub async fn replace_schedule(
        pool: &PgPool,
        business_id: Uuid,
        days: &[NormalizedDay],
    ) -> Result<(), Error> {
        let enabled_days: Vec<i32> = days.iter().map(|d| d.day_of_week as i32).collect();

        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM business_working_hours WHERE business_id = $1 AND day_of_week <> ALL($2)",
        )
        .bind(business_id)
        .bind(&enabled_days)
        .execute(&mut *tx)
        .await?;

        for day in days {
            sqlx::query(
                r#"
                INSERT INTO business_working_hours (id, business_id, day_of_week, start_min, end_min)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (business_id, day_of_week)
                DO UPDATE SET start_min = EXCLUDED.start_min, end_min = EXCLUDED.end_min
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(business_id)
            .bind(day.day_of_week as i32)
            .bind(day.start_min)
            .bind(day.end_min)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM business_breaks WHERE business_id = $1")
            .bind(business_id)
            .execute(&mut *tx)
            .await?;

        for day in days {
            for b in &day.breaks {
                sqlx::query(
                    r#"
                    INSERT INTO business_breaks (id, business_id, day_of_week, start_min, end_min)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(business_id)
                .bind(day.day_of_week as i32)
                .bind(b.start_min)
                .bind(b.end_min)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await
    }
}
