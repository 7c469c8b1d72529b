// tests/submission_tests.rs

use camp_backend::{config::Config, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

async fn spawn_app() -> (String, SqlitePool) {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "submission_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn register_and_login(client: &reqwest::Client, address: &str) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"username": username, "password": "password123"}))
        .send()
        .await
        .expect("Register failed");

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": username, "password": "password123"}))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

struct Fixture {
    camp_id: i64,
    mission_id: i64,
    text_q1: i64,
    text_q2: i64,
    mcq_q: i64,
}

/// Seeds one camp, one station and one mission with two TEXT questions and
/// one MCQ question ("Red" / "Blue").
async fn seed_mission(pool: &SqlitePool) -> Fixture {
    let now = chrono::Utc::now();

    let camp_id: i64 =
        sqlx::query_scalar("INSERT INTO camps (name, created_at) VALUES ($1, $2) RETURNING id")
            .bind("Summer Camp")
            .bind(now)
            .fetch_one(pool)
            .await
            .unwrap();

    let station_id: i64 = sqlx::query_scalar(
        "INSERT INTO stations (camp_id, name, created_at) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(camp_id)
    .bind("Crafts")
    .bind(now)
    .fetch_one(pool)
    .await
    .unwrap();

    let mission_id: i64 = sqlx::query_scalar(
        "INSERT INTO missions (station_id, title, kind, created_at) VALUES ($1, $2, 'FREE_TEXT', $3) RETURNING id",
    )
    .bind(station_id)
    .bind("Knot basics")
    .bind(now)
    .fetch_one(pool)
    .await
    .unwrap();

    let mut question_ids = Vec::new();
    for (position, (content, kind)) in [
        ("Name a basic knot", "TEXT"),
        ("Where would you use it?", "TEXT"),
        ("Pick the rope color", "MCQ"),
    ]
    .into_iter()
    .enumerate()
    {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO questions (mission_id, content, kind, position) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(mission_id)
        .bind(content)
        .bind(kind)
        .bind(position as i64)
        .fetch_one(pool)
        .await
        .unwrap();
        question_ids.push(id);
    }

    for (position, (content, is_correct)) in [("Red", true), ("Blue", false)].into_iter().enumerate()
    {
        sqlx::query(
            "INSERT INTO choices (question_id, content, is_correct, position) VALUES ($1, $2, $3, $4)",
        )
        .bind(question_ids[2])
        .bind(content)
        .bind(is_correct)
        .bind(position as i64)
        .execute(pool)
        .await
        .unwrap();
    }

    Fixture {
        camp_id,
        mission_id,
        text_q1: question_ids[0],
        text_q2: question_ids[1],
        mcq_q: question_ids[2],
    }
}

async fn enroll(client: &reqwest::Client, address: &str, token: &str, camp_id: i64) {
    let resp = client
        .post(format!("{}/api/enrollments", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"campId": camp_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn submitting_without_enrollment_is_forbidden() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let fx = seed_mission(&pool).await;

    let resp = client
        .post(format!("{}/api/missions/{}/submissions", address, fx.mission_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "campId": fx.camp_id,
            "answers": [{"questionId": fx.text_q1, "type": "TEXT", "value": "hello"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "forbidden");
}

#[tokio::test]
async fn submission_validates_request_shape() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let fx = seed_mission(&pool).await;
    enroll(&client, &address, &token, fx.camp_id).await;

    // Missing campId
    let resp = client
        .post(format!("{}/api/missions/{}/submissions", address, fx.mission_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "answers": [{"questionId": fx.text_q1, "type": "TEXT", "value": "hello"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Empty answers
    let resp = client
        .post(format!("{}/api/missions/{}/submissions", address, fx.mission_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"campId": fx.camp_id, "answers": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Unknown mission
    let resp = client
        .post(format!("{}/api/missions/99999/submissions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "campId": fx.camp_id,
            "answers": [{"questionId": fx.text_q1, "type": "TEXT", "value": "hello"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn submit_then_project_roundtrip() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let fx = seed_mission(&pool).await;
    enroll(&client, &address, &token, fx.camp_id).await;

    let resp = client
        .post(format!("{}/api/missions/{}/submissions", address, fx.mission_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "campId": fx.camp_id,
            "answers": [{"questionId": fx.text_q1, "type": "TEXT", "value": "hello"}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let outcome: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(outcome["success"], true);
    assert_eq!(outcome["accepted"], 1);
    assert_eq!(outcome["rejected"], 0);
    let result_id = outcome["resultId"].as_i64().unwrap();

    let resp = client
        .get(format!(
            "{}/api/missions/{}/result?campId={}",
            address, fx.mission_id, fx.camp_id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let projected: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(projected["resultId"].as_i64().unwrap(), result_id);
    assert_eq!(projected["status"], "completed");

    let answers = projected["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0]["questionId"].as_i64().unwrap(), fx.text_q1);
    assert_eq!(answers[0]["kind"], "TEXT");
    assert_eq!(answers[0]["value"], "hello");
}

#[tokio::test]
async fn mixed_batch_writes_one_subtype_row_per_answer() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let fx = seed_mission(&pool).await;
    enroll(&client, &address, &token, fx.camp_id).await;

    let resp = client
        .post(format!("{}/api/missions/{}/submissions", address, fx.mission_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "campId": fx.camp_id,
            "answers": [
                {"questionId": fx.text_q1, "type": "TEXT", "value": "bowline"},
                {"questionId": fx.text_q2, "type": "TEXT", "value": "sailing"},
                {"questionId": fx.mcq_q, "type": "MCQ", "value": "Red"}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let outcome: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(outcome["accepted"], 3);
    assert_eq!(outcome["rejected"], 0);
    let result_id = outcome["resultId"].as_i64().unwrap();

    let text_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM text_answers ta JOIN answers a ON ta.answer_id = a.id WHERE a.result_id = $1",
    )
    .bind(result_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(text_count, 2);

    let choice_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM choice_answers ca JOIN answers a ON ca.answer_id = a.id WHERE a.result_id = $1",
    )
    .bind(result_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(choice_count, 1);

    let mcq_link: i64 = sqlx::query_scalar(
        "SELECT a.question_id FROM choice_answers ca JOIN answers a ON ca.answer_id = a.id WHERE a.result_id = $1",
    )
    .bind(result_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(mcq_link, fx.mcq_q);
}

#[tokio::test]
async fn resubmission_updates_result_in_place_and_replaces_answers() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let fx = seed_mission(&pool).await;
    enroll(&client, &address, &token, fx.camp_id).await;

    let first: serde_json::Value = client
        .post(format!("{}/api/missions/{}/submissions", address, fx.mission_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "campId": fx.camp_id,
            "answers": [
                {"questionId": fx.text_q1, "type": "TEXT", "value": "bowline"},
                {"questionId": fx.text_q2, "type": "TEXT", "value": "sailing"},
                {"questionId": fx.mcq_q, "type": "MCQ", "value": "Blue"}
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let first_result_id = first["resultId"].as_i64().unwrap();

    let second: serde_json::Value = client
        .post(format!("{}/api/missions/{}/submissions", address, fx.mission_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "campId": fx.camp_id,
            "answers": [{"questionId": fx.text_q1, "type": "TEXT", "value": "clove hitch"}]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["resultId"].as_i64().unwrap(), first_result_id);

    let result_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM mission_results WHERE mission_id = $1",
    )
    .bind(fx.mission_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(result_count, 1);

    // Prior answers are replaced, not accumulated.
    let answer_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE result_id = $1")
        .bind(first_result_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(answer_count, 1);

    let content: String = sqlx::query_scalar(
        "SELECT ta.content FROM text_answers ta JOIN answers a ON ta.answer_id = a.id WHERE a.result_id = $1",
    )
    .bind(first_result_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(content, "clove hitch");
}

#[tokio::test]
async fn unrecognized_kind_and_foreign_questions_are_rejected() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let fx = seed_mission(&pool).await;
    enroll(&client, &address, &token, fx.camp_id).await;

    // A second mission whose question must not be answerable here.
    let other = seed_mission(&pool).await;

    let resp = client
        .post(format!("{}/api/missions/{}/submissions", address, fx.mission_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "campId": fx.camp_id,
            "answers": [
                {"questionId": fx.text_q1, "type": "TEXT", "value": "bowline"},
                {"questionId": fx.text_q2, "type": "DRAWING", "value": "scribble"},
                {"questionId": other.text_q1, "type": "TEXT", "value": "smuggled"}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let outcome: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(outcome["accepted"], 1);
    assert_eq!(outcome["rejected"], 2);

    let answer_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE result_id = $1")
        .bind(outcome["resultId"].as_i64().unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(answer_count, 1);
}

#[tokio::test]
async fn concurrent_first_submissions_settle_on_one_result() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let fx = seed_mission(&pool).await;
    enroll(&client, &address, &token, fx.camp_id).await;

    let payload = serde_json::json!({
        "campId": fx.camp_id,
        "answers": [{"questionId": fx.text_q1, "type": "TEXT", "value": "bowline"}]
    });

    let send = |p: serde_json::Value| {
        let client = client.clone();
        let url = format!("{}/api/missions/{}/submissions", address, fx.mission_id);
        let token = token.clone();
        async move {
            client
                .post(url)
                .header("Authorization", format!("Bearer {}", token))
                .json(&p)
                .send()
                .await
                .unwrap()
        }
    };

    let (a, b) = tokio::join!(send(payload.clone()), send(payload));
    assert_eq!(a.status().as_u16(), 200);
    assert_eq!(b.status().as_u16(), 200);

    let result_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM mission_results WHERE mission_id = $1",
    )
    .bind(fx.mission_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(result_count, 1);
}

#[tokio::test]
async fn result_projection_requires_a_submission() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let fx = seed_mission(&pool).await;
    enroll(&client, &address, &token, fx.camp_id).await;

    let resp = client
        .get(format!(
            "{}/api/missions/{}/result?campId={}",
            address, fx.mission_id, fx.camp_id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
