use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{HealthScoreResult, LeadRecord, LifeEventRecord, TouchpointRecord};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let leads = vec![
        (
            Uuid::parse_str("7b1e2c62-5d4a-4a6e-9a57-1f2f3f6f8a01")?,
            "Jordan Reyes",
            "jordan.reyes@solisa-demo.com",
            "+15550101",
            "auto",
            Some("Geico"),
        ),
        (
            Uuid::parse_str("e3a9c9d4-8f3b-4f27-b1de-6c0b5a2f8a02")?,
            "Maya Chen",
            "maya.chen@solisa-demo.com",
            "+15550102",
            "home",
            None,
        ),
        (
            Uuid::parse_str("4f6d8b1a-2c7e-4d39-a8c4-9d1e7b3f8a03")?,
            "Omar Haddad",
            "omar.haddad@solisa-demo.com",
            "+15550103",
            "life",
            Some("StateFarm"),
        ),
    ];

    for (id, full_name, email, phone, insurance_type, current_provider) in leads {
        sqlx::query(
            r#"
            INSERT INTO retention.leads (id, full_name, email, phone, insurance_type, current_provider)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                insurance_type = EXCLUDED.insurance_type,
                current_provider = EXCLUDED.current_provider
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(insurance_type)
        .bind(current_provider)
        .execute(pool)
        .await?;
    }

    let touchpoints = vec![
        (
            "seed-tp-001",
            "jordan.reyes@solisa-demo.com",
            "call",
            Some("inbound"),
            "Asked about accident forgiveness after the quote",
            Some("neutral"),
            Some("interested_but_objecting"),
            timestamp(2026, 7, 20, 15, 30)?,
        ),
        (
            "seed-tp-002",
            "jordan.reyes@solisa-demo.com",
            "sms",
            Some("inbound"),
            "The price difference still bugs me",
            Some("negative"),
            Some("objecting"),
            timestamp(2026, 7, 24, 10, 5)?,
        ),
        (
            "seed-tp-003",
            "maya.chen@solisa-demo.com",
            "email",
            Some("inbound"),
            "Loved the walkthrough, send the paperwork over",
            Some("positive"),
            Some("ready"),
            timestamp(2026, 7, 28, 9, 15)?,
        ),
        (
            "seed-tp-004",
            "omar.haddad@solisa-demo.com",
            "sms",
            Some("outbound"),
            "Checking in ahead of your renewal window",
            None,
            None,
            timestamp(2026, 7, 30, 12, 0)?,
        ),
    ];

    for (source_key, email, channel, direction, content, sentiment, intent, occurred_at) in
        touchpoints
    {
        let lead_id: Uuid = sqlx::query("SELECT id FROM retention.leads WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO retention.touchpoints
            (id, lead_id, channel, direction, content, sentiment, intent, occurred_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lead_id)
        .bind(channel)
        .bind(direction)
        .bind(content)
        .bind(sentiment)
        .bind(intent)
        .bind(occurred_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let life_events = vec![
        (
            "seed-ev-001",
            "jordan.reyes@solisa-demo.com",
            "teen_driver",
            Some("Daughter just got her learner's permit"),
            None::<&str>,
            timestamp(2026, 7, 18, 8, 0)?,
        ),
        (
            "seed-ev-002",
            "maya.chen@solisa-demo.com",
            "home_reno",
            Some("Finishing the basement this fall"),
            Some("pending"),
            timestamp(2026, 7, 25, 17, 45)?,
        ),
    ];

    for (source_key, email, event_type, description, outcome, occurred_at) in life_events {
        let lead_id: Uuid = sqlx::query("SELECT id FROM retention.leads WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO retention.life_events
            (id, lead_id, event_type, description, outcome, occurred_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lead_id)
        .bind(event_type)
        .bind(description)
        .bind(outcome)
        .bind(occurred_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

fn timestamp(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> anyhow::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .context("invalid seed timestamp")
}

pub async fn fetch_lead(pool: &PgPool, email: &str) -> anyhow::Result<LeadRecord> {
    let row = sqlx::query(
        "SELECT id, full_name, email, phone, insurance_type, current_provider \
         FROM retention.leads WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no lead found for {email}"))?;

    Ok(LeadRecord {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        insurance_type: row.get("insurance_type"),
        current_provider: row.get("current_provider"),
    })
}

/// Oldest first; the scoring window and shift detector both rely on order.
pub async fn fetch_touchpoints(
    pool: &PgPool,
    lead_id: Uuid,
) -> anyhow::Result<Vec<TouchpointRecord>> {
    let rows = sqlx::query(
        "SELECT channel, direction, content, sentiment, intent, occurred_at \
         FROM retention.touchpoints WHERE lead_id = $1 ORDER BY occurred_at",
    )
    .bind(lead_id)
    .fetch_all(pool)
    .await?;

    let mut touchpoints = Vec::with_capacity(rows.len());
    for row in rows {
        touchpoints.push(TouchpointRecord {
            channel: row.get("channel"),
            direction: row.get("direction"),
            content: row.get("content"),
            sentiment: row.get("sentiment"),
            intent: row.get("intent"),
            occurred_at: row.get("occurred_at"),
        });
    }

    Ok(touchpoints)
}

pub async fn fetch_life_events(
    pool: &PgPool,
    lead_id: Uuid,
) -> anyhow::Result<Vec<LifeEventRecord>> {
    let rows = sqlx::query(
        "SELECT event_type, description, outcome, occurred_at \
         FROM retention.life_events WHERE lead_id = $1 ORDER BY occurred_at",
    )
    .bind(lead_id)
    .fetch_all(pool)
    .await?;

    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        events.push(LifeEventRecord {
            event_type: row.get("event_type"),
            description: row.get("description"),
            outcome: row.get("outcome"),
            occurred_at: row.get("occurred_at"),
        });
    }

    Ok(events)
}

/// Persists one scoring snapshot; history is append-only.
pub async fn save_health_snapshot(
    pool: &PgPool,
    lead_id: Uuid,
    result: &HealthScoreResult,
    scored_by: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO retention.policy_health
        (id, lead_id, health_score, churn_risk, churn_probability, days_to_predicted_churn,
         engagement_score, satisfaction_score, usage_score, payment_score,
         reasoning, retention_actions, priority, scored_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(lead_id)
    .bind(result.health_score)
    .bind(result.churn_risk.as_str())
    .bind(result.churn_probability)
    .bind(result.days_to_predicted_churn)
    .bind(result.engagement_score)
    .bind(result.satisfaction_score)
    .bind(result.usage_score)
    .bind(result.payment_score)
    .bind(&result.reasoning)
    .bind(serde_json::to_value(&result.retention_actions)?)
    .bind(result.priority.as_str())
    .bind(scored_by)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        phone: String,
        insurance_type: String,
        channel: String,
        direction: Option<String>,
        content: String,
        sentiment: Option<String>,
        intent: Option<String>,
        occurred_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let lead_id: Uuid = sqlx::query(
            r#"
            INSERT INTO retention.leads (id, full_name, email, phone, insurance_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                insurance_type = EXCLUDED.insurance_type
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.insurance_type)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO retention.touchpoints
            (id, lead_id, channel, direction, content, sentiment, intent, occurred_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lead_id)
        .bind(&row.channel)
        .bind(&row.direction)
        .bind(&row.content)
        .bind(&row.sentiment)
        .bind(&row.intent)
        .bind(row.occurred_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
