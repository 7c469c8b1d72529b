// src/handlers/submission.rs

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::enrollment::lookup_enrollment,
    models::{
        mission::{QUESTION_KIND_MCQ, QUESTION_KIND_TEXT},
        result::{
            AnswerValue, MissionResult, ResultResponse, SubmissionOutcome, SubmitMissionRequest,
            SubmittedAnswer,
        },
    },
    utils::{jwt::Claims, retry::retry_read},
};

/// Submits a batch of answers against a mission.
///
/// Preconditions: campId present, answers non-empty, student enrolled in the
/// camp (403 otherwise), mission row present (soft-deleted is fine).
///
/// The whole write runs in one transaction: the mission result is upserted
/// on (enrollment_id, mission_id) so concurrent first submissions settle on
/// a single row, the previous answer set is dropped, and the new one is
/// written question by question. Answers naming a foreign question or an
/// unrecognized kind are counted in `rejected` without aborting the batch.
pub async fn submit_mission(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(mission_id): Path<i64>,
    Json(payload): Json<SubmitMissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let camp_id = payload
        .camp_id
        .ok_or_else(|| AppError::InvalidInput("campId is required".to_string()))?;
    if payload.answers.is_empty() {
        return Err(AppError::InvalidInput(
            "answers must not be empty".to_string(),
        ));
    }
    let student_id = claims.sub.parse::<i64>().unwrap_or(0);

    let enrollment = lookup_enrollment(&pool, student_id, camp_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Not enrolled in this camp".to_string()))?;

    let mission = sqlx::query_scalar::<_, i64>("SELECT id FROM missions WHERE id = $1")
        .bind(mission_id)
        .fetch_optional(&pool)
        .await?;
    if mission.is_none() {
        return Err(AppError::NotFound("Mission not found".to_string()));
    }

    let question_ids: HashSet<i64> =
        sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE mission_id = $1")
            .bind(mission_id)
            .fetch_all(&pool)
            .await?
            .into_iter()
            .collect();

    let mut tx = pool.begin().await?;

    let result_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO mission_results (enrollment_id, mission_id, status, submitted_at)
        VALUES ($1, $2, 'completed', $3)
        ON CONFLICT(enrollment_id, mission_id)
        DO UPDATE SET status = 'completed', submitted_at = excluded.submitted_at
        RETURNING id
        "#,
    )
    .bind(enrollment.id)
    .bind(mission_id)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    // Resubmission replaces the prior answer set, it does not accumulate.
    sqlx::query(
        "DELETE FROM text_answers WHERE answer_id IN (SELECT id FROM answers WHERE result_id = $1)",
    )
    .bind(result_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "DELETE FROM choice_answers WHERE answer_id IN (SELECT id FROM answers WHERE result_id = $1)",
    )
    .bind(result_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM answers WHERE result_id = $1")
        .bind(result_id)
        .execute(&mut *tx)
        .await?;

    let mut accepted = 0usize;
    let mut rejected = 0usize;

    for answer in &payload.answers {
        if !question_ids.contains(&answer.question_id) {
            tracing::warn!(
                "Rejecting answer for question {} not in mission {}",
                answer.question_id,
                mission_id
            );
            rejected += 1;
            continue;
        }

        let table = match answer.kind.as_str() {
            k if k == QUESTION_KIND_TEXT => "INSERT INTO text_answers (answer_id, content) VALUES ($1, $2)",
            k if k == QUESTION_KIND_MCQ => "INSERT INTO choice_answers (answer_id, selected) VALUES ($1, $2)",
            other => {
                tracing::warn!(
                    "Rejecting answer with unrecognized kind '{}' for question {}",
                    other,
                    answer.question_id
                );
                rejected += 1;
                continue;
            }
        };

        let answer_id: i64 = sqlx::query_scalar(
            "INSERT INTO answers (result_id, question_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(result_id)
        .bind(answer.question_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(table)
            .bind(answer_id)
            .bind(answer.value.as_str())
            .execute(&mut *tx)
            .await?;

        accepted += 1;
    }

    tx.commit().await?;

    Ok(Json(SubmissionOutcome {
        success: true,
        result_id,
        accepted,
        rejected,
    }))
}

/// Query parameters for the result projection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultQuery {
    pub camp_id: Option<i64>,
}

/// Helper struct for the answer join below.
#[derive(sqlx::FromRow)]
struct AnswerRow {
    question_id: i64,
    question: String,
    text_value: Option<String>,
    choice_value: Option<String>,
}

/// Reconstructs the current student's submission for a mission: the result
/// row plus each answer resolved to its question and stored value.
/// Pure read, no side effects.
pub async fn get_result(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(mission_id): Path<i64>,
    Query(params): Query<ResultQuery>,
) -> Result<impl IntoResponse, AppError> {
    let camp_id = params
        .camp_id
        .ok_or_else(|| AppError::InvalidInput("campId is required".to_string()))?;
    let student_id = claims.sub.parse::<i64>().unwrap_or(0);

    let enrollment = lookup_enrollment(&pool, student_id, camp_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Not enrolled in this camp".to_string()))?;

    let result = retry_read(|| {
        sqlx::query_as::<_, MissionResult>(
            r#"
            SELECT id, enrollment_id, mission_id, status, submitted_at
            FROM mission_results
            WHERE enrollment_id = $1 AND mission_id = $2
            "#,
        )
        .bind(enrollment.id)
        .bind(mission_id)
        .fetch_optional(&pool)
    })
    .await?
    .ok_or_else(|| AppError::NotFound("No submission for this mission".to_string()))?;

    let rows = retry_read(|| {
        sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT
                a.question_id,
                q.content AS question,
                ta.content AS text_value,
                ca.selected AS choice_value
            FROM answers a
            JOIN questions q ON a.question_id = q.id
            LEFT JOIN text_answers ta ON ta.answer_id = a.id
            LEFT JOIN choice_answers ca ON ca.answer_id = a.id
            WHERE a.result_id = $1
            ORDER BY q.position, a.id
            "#,
        )
        .bind(result.id)
        .fetch_all(&pool)
    })
    .await
    .map_err(|e| {
        tracing::error!("Failed to project answers for result {}: {:?}", result.id, e);
        AppError::from(e)
    })?;

    let answers = rows
        .into_iter()
        .map(|row| SubmittedAnswer {
            question_id: row.question_id,
            question: row.question,
            value: match (row.text_value, row.choice_value) {
                (Some(text), _) => AnswerValue::Text(text),
                (None, Some(selected)) => AnswerValue::Choice(selected),
                // Link row without a subtype row; surfaced as empty text.
                (None, None) => AnswerValue::Text(String::new()),
            },
        })
        .collect();

    Ok(Json(ResultResponse {
        result_id: result.id,
        mission_id: result.mission_id,
        status: result.status,
        submitted_at: result.submitted_at,
        answers,
    }))
}
