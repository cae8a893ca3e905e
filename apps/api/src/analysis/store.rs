use anyhow::Result;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analysis::segments::{CampaignIdea, GeneratedSegment};
use crate::models::campaign::CampaignRow;
use crate::models::segment::SegmentRow;
use crate::models::story::StoryRow;

/// Replaces all segments and campaign stubs in one transaction.
/// `segments` must already be sorted by rank.
pub async fn replace_segments_and_campaigns(
    pool: &PgPool,
    segments: &[GeneratedSegment],
    ideas: &[CampaignIdea],
) -> Result<Vec<SegmentRow>> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM campaigns").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM segments").execute(&mut *tx).await?;

    let mut rows = Vec::with_capacity(segments.len());
    for s in segments {
        let row = sqlx::query_as::<_, SegmentRow>(
            r#"
            INSERT INTO segments
                (id, name, size, value_tier, characteristics, recommended_channels,
                 messaging, business_opportunity_rank, bias_warning)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&s.name)
        .bind(s.size)
        .bind(s.value_tier.as_str())
        .bind(&s.characteristics)
        .bind(&s.recommended_channels)
        .bind(&s.messaging)
        .bind(s.business_opportunity_rank)
        .bind(&s.bias_warning)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    for idea in ideas {
        sqlx::query(
            r#"
            INSERT INTO campaigns (id, segment_name, title, description, channel)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&idea.segment_name)
        .bind(&idea.title)
        .bind(&idea.description)
        .bind(&idea.channel)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(
        "Stored {} segments and {} campaign ideas",
        rows.len(),
        ideas.len()
    );
    Ok(rows)
}

/// Segments in ascending rank order.
pub async fn list_segments(pool: &PgPool) -> Result<Vec<SegmentRow>> {
    Ok(sqlx::query_as::<_, SegmentRow>(
        "SELECT * FROM segments ORDER BY business_opportunity_rank",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn list_campaigns(pool: &PgPool) -> Result<Vec<CampaignRow>> {
    Ok(sqlx::query_as::<_, CampaignRow>(
        "SELECT * FROM campaigns ORDER BY created_at, segment_name",
    )
    .fetch_all(pool)
    .await?)
}

/// Case-insensitive lookup by segment name.
pub async fn find_segment_by_name(pool: &PgPool, name: &str) -> Result<Option<SegmentRow>> {
    Ok(sqlx::query_as::<_, SegmentRow>(
        "SELECT * FROM segments WHERE lower(name) = lower($1) ORDER BY business_opportunity_rank LIMIT 1",
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?)
}

/// Records the measured ROI for a segment. Returns `None` if no such segment.
pub async fn set_actual_roi(pool: &PgPool, id: Uuid, roi: f64) -> Result<Option<SegmentRow>> {
    Ok(sqlx::query_as::<_, SegmentRow>(
        "UPDATE segments SET actual_roi = $1 WHERE id = $2 RETURNING *",
    )
    .bind(roi)
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

pub async fn insert_story(
    pool: &PgPool,
    title: &str,
    narrative: &str,
    report: &Value,
) -> Result<StoryRow> {
    Ok(sqlx::query_as::<_, StoryRow>(
        r#"
        INSERT INTO stories (id, title, narrative, report)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(narrative)
    .bind(report)
    .fetch_one(pool)
    .await?)
}

/// Stories, newest first.
pub async fn list_stories(pool: &PgPool) -> Result<Vec<StoryRow>> {
    Ok(
        sqlx::query_as::<_, StoryRow>("SELECT * FROM stories ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?,
    )
}
