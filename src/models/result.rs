// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'mission_results' table: a student's completion state for
/// one mission. Unique on (enrollment_id, mission_id); resubmission updates
/// the row in place instead of creating a second one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionResult {
    pub id: i64,
    pub enrollment_id: i64,
    pub mission_id: i64,

    /// 'pending' or 'completed'.
    pub status: String,

    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// One answer of a submission batch.
/// `kind` is kept as a raw string so a single unrecognized entry rejects
/// that answer, not the whole request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// DTO for submitting a batch of answers against a mission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMissionRequest {
    pub camp_id: Option<i64>,
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

/// Typed outcome of a submission (replaces a legacy bare success flag).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
    pub result_id: i64,
    pub accepted: usize,
    pub rejected: usize,
}

/// Tagged union over the two answer subtype tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum AnswerValue {
    #[serde(rename = "TEXT")]
    Text(String),
    #[serde(rename = "MCQ")]
    Choice(String),
}

/// One projected answer: the question it belongs to plus its stored value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub question: String,
    #[serde(flatten)]
    pub value: AnswerValue,
}

/// Full projection of a student's submission for one mission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub result_id: i64,
    pub mission_id: i64,
    pub status: String,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub answers: Vec<SubmittedAnswer>,
}
