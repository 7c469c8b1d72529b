// src/handlers/mission.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::mission::{Choice, Mission, MissionDetail, PublicChoice, PublicQuestion, Question},
    utils::retry::retry_read,
};

/// Retrieves a mission by ID with its questions and, per question, their
/// choices. Correct-answer flags are never exposed.
///
/// Direct lookup intentionally returns soft-deleted missions: deletion only
/// removes a mission from catalog lists, mid-camp submissions stay possible.
pub async fn get_mission(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mission = retry_read(|| {
        sqlx::query_as::<_, Mission>(
            r#"
            SELECT id, station_id, title, kind, created_at, deleted_at
            FROM missions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
    })
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch mission {}: {:?}", id, e);
        AppError::from(e)
    })?
    .ok_or_else(|| AppError::NotFound("Mission not found".to_string()))?;

    let questions = retry_read(|| {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, mission_id, content, kind, position
            FROM questions
            WHERE mission_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(id)
        .fetch_all(&pool)
    })
    .await?;

    let choices = retry_read(|| {
        sqlx::query_as::<_, Choice>(
            r#"
            SELECT c.id, c.question_id, c.content, c.is_correct, c.position
            FROM choices c
            JOIN questions q ON c.question_id = q.id
            WHERE q.mission_id = $1
            ORDER BY c.position, c.id
            "#,
        )
        .bind(id)
        .fetch_all(&pool)
    })
    .await?;

    let mut by_question: HashMap<i64, Vec<PublicChoice>> = HashMap::new();
    for choice in choices {
        by_question
            .entry(choice.question_id)
            .or_default()
            .push(PublicChoice {
                id: choice.id,
                content: choice.content,
            });
    }

    let questions = questions
        .into_iter()
        .map(|q| {
            let choices = by_question.remove(&q.id).unwrap_or_default();
            PublicQuestion {
                id: q.id,
                kind: q.kind,
                content: q.content,
                choices,
            }
        })
        .collect();

    Ok(Json(MissionDetail {
        id: mission.id,
        station_id: mission.station_id,
        title: mission.title,
        kind: mission.kind,
        questions,
    }))
}

/// Lists the active missions of a station. Soft-deleted missions are
/// excluded here, unlike in direct lookup.
pub async fn list_station_missions(
    State(pool): State<SqlitePool>,
    Path(station_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let missions = retry_read(|| {
        sqlx::query_as::<_, Mission>(
            r#"
            SELECT id, station_id, title, kind, created_at, deleted_at
            FROM missions
            WHERE station_id = $1 AND deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(station_id)
        .fetch_all(&pool)
    })
    .await
    .map_err(|e| {
        tracing::error!("Failed to list missions for station {}: {:?}", station_id, e);
        AppError::from(e)
    })?;

    Ok(Json(missions))
}
