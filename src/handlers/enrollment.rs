// src/handlers/enrollment.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::enrollment::{DEFAULT_SHIRT_SIZE, EnrollRequest, Enrollment, UpdateShirtSizeRequest},
    utils::jwt::Claims,
};

/// Fetches the enrollment binding a student to a camp, if any.
/// Also used by the submission engine as its precondition check.
pub async fn lookup_enrollment(
    pool: &SqlitePool,
    student_id: i64,
    camp_id: i64,
) -> Result<Option<Enrollment>, AppError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, student_id, camp_id, shirt_size, enrolled_at
        FROM enrollments
        WHERE student_id = $1 AND camp_id = $2
        "#,
    )
    .bind(student_id)
    .bind(camp_id)
    .fetch_optional(pool)
    .await?;

    Ok(enrollment)
}

/// Enrolls the current student into a camp.
///
/// Idempotent: enrolling twice returns the existing record with an
/// "Already enrolled" message instead of an error. A lost insert race
/// falls back to returning the winner's row.
pub async fn enroll(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EnrollRequest>,
) -> Result<Response, AppError> {
    let camp_id = payload
        .camp_id
        .ok_or_else(|| AppError::InvalidInput("campId is required".to_string()))?;
    let student_id = claims.sub.parse::<i64>().unwrap_or(0);

    if let Some(existing) = lookup_enrollment(&pool, student_id, camp_id).await? {
        return Ok((
            StatusCode::OK,
            Json(json!({ "message": "Already enrolled", "enrollment": existing })),
        )
            .into_response());
    }

    let created = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollments (student_id, camp_id, shirt_size, enrolled_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT(student_id, camp_id) DO NOTHING
        RETURNING id, student_id, camp_id, shirt_size, enrolled_at
        "#,
    )
    .bind(student_id)
    .bind(camp_id)
    .bind(DEFAULT_SHIRT_SIZE)
    .bind(Utc::now())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .is_some_and(|db| db.is_foreign_key_violation())
        {
            AppError::NotFound("Camp not found".to_string())
        } else {
            tracing::error!("Failed to enroll student {}: {:?}", student_id, e);
            AppError::from(e)
        }
    })?;

    match created {
        Some(enrollment) => Ok((StatusCode::CREATED, Json(enrollment)).into_response()),
        None => {
            // Another request inserted concurrently; return its row.
            let existing = lookup_enrollment(&pool, student_id, camp_id)
                .await?
                .ok_or_else(|| {
                    AppError::StorageError("Enrollment vanished after conflict".to_string())
                })?;
            Ok((
                StatusCode::OK,
                Json(json!({ "message": "Already enrolled", "enrollment": existing })),
            )
                .into_response())
        }
    }
}

/// Updates the shirt size on an existing enrollment.
///
/// 404 if the student is not enrolled in the camp; 400 if the size is
/// missing or empty.
pub async fn update_shirt_size(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateShirtSizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let camp_id = payload
        .camp_id
        .ok_or_else(|| AppError::InvalidInput("campId is required".to_string()))?;
    let shirt_size = payload
        .shirt_size
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if shirt_size.is_empty() {
        return Err(AppError::InvalidInput(
            "shirtSize must not be empty".to_string(),
        ));
    }
    let student_id = claims.sub.parse::<i64>().unwrap_or(0);

    let updated = sqlx::query_as::<_, Enrollment>(
        r#"
        UPDATE enrollments
        SET shirt_size = $1
        WHERE student_id = $2 AND camp_id = $3
        RETURNING id, student_id, camp_id, shirt_size, enrolled_at
        "#,
    )
    .bind(shirt_size)
    .bind(student_id)
    .bind(camp_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update shirt size: {:?}", e);
        AppError::from(e)
    })?
    .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    Ok(Json(updated))
}
