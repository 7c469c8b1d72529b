// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        camp::CreateCampRequest,
        mission::{
            CreateMissionRequest, MISSION_KIND_FREE_TEXT, MISSION_KIND_MULTIPLE_CHOICE,
            QUESTION_KIND_MCQ, QUESTION_KIND_TEXT,
        },
        station::CreateStationRequest,
    },
};

/// Creates a new camp.
/// Admin only.
pub async fn create_camp(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCampRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::InvalidInput(validation_errors.to_string()));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO camps (name, created_at) VALUES ($1, $2) RETURNING id",
    )
    .bind(&payload.name)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create camp: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Creates a new station inside a camp.
/// Admin only.
pub async fn create_station(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateStationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::InvalidInput(validation_errors.to_string()));
    }
    let camp_id = payload
        .camp_id
        .ok_or_else(|| AppError::InvalidInput("campId is required".to_string()))?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO stations (camp_id, name, created_at) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(camp_id)
    .bind(&payload.name)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .is_some_and(|db| db.is_foreign_key_violation())
        {
            AppError::NotFound("Camp not found".to_string())
        } else {
            tracing::error!("Failed to create station: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Creates a mission together with its questions and choices.
/// Admin only. The nested insert runs in one transaction.
pub async fn create_mission(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateMissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::InvalidInput(validation_errors.to_string()));
    }
    let station_id = payload
        .station_id
        .ok_or_else(|| AppError::InvalidInput("stationId is required".to_string()))?;
    if payload.kind != MISSION_KIND_FREE_TEXT && payload.kind != MISSION_KIND_MULTIPLE_CHOICE {
        return Err(AppError::InvalidInput(format!(
            "Unknown mission kind '{}'",
            payload.kind
        )));
    }
    for question in &payload.questions {
        if let Err(validation_errors) = question.validate() {
            return Err(AppError::InvalidInput(validation_errors.to_string()));
        }
        match question.kind.as_str() {
            k if k == QUESTION_KIND_TEXT => {}
            k if k == QUESTION_KIND_MCQ => {
                if question.choices.is_empty() {
                    return Err(AppError::InvalidInput(
                        "MCQ questions need at least one choice".to_string(),
                    ));
                }
            }
            other => {
                return Err(AppError::InvalidInput(format!(
                    "Unknown question kind '{}'",
                    other
                )));
            }
        }
    }

    let mut tx = pool.begin().await?;

    let mission_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO missions (station_id, title, kind, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(station_id)
    .bind(&payload.title)
    .bind(&payload.kind)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .is_some_and(|db| db.is_foreign_key_violation())
        {
            AppError::NotFound("Station not found".to_string())
        } else {
            tracing::error!("Failed to create mission: {:?}", e);
            AppError::from(e)
        }
    })?;

    for (qi, question) in payload.questions.iter().enumerate() {
        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (mission_id, content, kind, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(mission_id)
        .bind(question.content.as_str())
        .bind(question.kind.as_str())
        .bind(qi as i64)
        .fetch_one(&mut *tx)
        .await?;

        for (ci, choice) in question.choices.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO choices (question_id, content, is_correct, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(question_id)
            .bind(choice.content.as_str())
            .bind(choice.is_correct)
            .bind(ci as i64)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": mission_id })),
    ))
}

/// Soft-deletes a mission: it disappears from catalog lists but stays
/// reachable by direct lookup and keeps accepting submissions.
/// Admin only.
pub async fn delete_mission(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE missions SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete mission {}: {:?}", id, e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Mission not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
