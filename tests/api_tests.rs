// tests/api_tests.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use quizlink_backend::config::Config;
use quizlink_backend::email::RecordingMailer;
use quizlink_backend::otp::InMemoryOtpStore;
use quizlink_backend::routes;
use quizlink_backend::state::AppState;
use sqlx::postgres::PgPoolOptions;

/// Helper to spawn the app on a random port for testing.
///
/// Returns the base URL plus the recording mailer so tests can read OTP
/// codes back. Skips (None) when DATABASE_URL is not set, so the suite
/// stays runnable without a Postgres instance.
async fn spawn_app() -> Option<(String, Arc<RecordingMailer>)> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        app_url: "http://localhost:3000".to_string(),
        otp_ttl_seconds: 600,
        port: 0,
        rust_log: "error".to_string(),
    };

    let mailer = Arc::new(RecordingMailer::new());
    let state = AppState {
        pool,
        config,
        otp_store: Arc::new(InMemoryOtpStore::new(Duration::from_secs(600))),
        mailer: mailer.clone(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some((address, mailer))
}

fn unique_email() -> String {
    format!("it_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

/// Drives OTP request + verify + signup + login; returns a bearer token.
async fn register_and_login(
    client: &reqwest::Client,
    address: &str,
    mailer: &RecordingMailer,
    email: &str,
) -> String {
    let resp = client
        .post(format!("{}/api/auth/request-otp", address))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .expect("request-otp failed");
    assert_eq!(resp.status().as_u16(), 200);

    let code = mailer
        .last_code_for(email)
        .await
        .expect("no OTP was recorded");

    let resp = client
        .post(format!("{}/api/auth/verify-otp", address))
        .json(&serde_json::json!({ "email": email, "otp": code }))
        .send()
        .await
        .expect("verify-otp failed");
    assert_eq!(resp.status().as_u16(), 200);

    let resp = client
        .post(format!("{}/api/auth/signup", address))
        .json(&serde_json::json!({
            "first_name": "Integration",
            "last_name": "Test",
            "email": email,
            "phone": "0000000000",
            "password": "password123",
            "confirm_password": "password123",
            "terms_accepted": true
        }))
        .send()
        .await
        .expect("signup failed");
    assert_eq!(resp.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("login failed")
        .json()
        .await
        .expect("login response was not json");

    login["token"].as_str().expect("token missing").to_string()
}

#[tokio::test]
async fn unknown_route_is_404() {
    let Some((address, _mailer)) = spawn_app().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn request_otp_rejects_invalid_email() {
    let Some((address, _mailer)) = spawn_app().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/request-otp", address))
        .json(&serde_json::json!({ "email": "not-an-email" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn signup_without_verified_otp_is_rejected() {
    let Some((address, _mailer)) = spawn_app().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/signup", address))
        .json(&serde_json::json!({
            "first_name": "No",
            "last_name": "Otp",
            "email": unique_email(),
            "phone": "0000000000",
            "password": "password123",
            "confirm_password": "password123",
            "terms_accepted": true
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn submitting_to_missing_quiz_is_404() {
    let Some((address, _mailer)) = spawn_app().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/responses", address))
        .json(&serde_json::json!({
            "quiz_id": uuid::Uuid::new_v4(),
            "name": "Nobody",
            "answers": [{ "question_id": uuid::Uuid::new_v4(), "text_answer": "x" }]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn leaderboard_requires_a_token() {
    let Some((address, _mailer)) = spawn_app().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/responses/{}", address, uuid::Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn full_quiz_flow() {
    let Some((address, mailer)) = spawn_app().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let client = reqwest::Client::new();
    let email = unique_email();

    // 1. Creator signs up and logs in.
    let token = register_and_login(&client, &address, &mailer, &email).await;

    // 2. Create a quiz: one single-choice, one keyword-graded short-text.
    let create_resp = client
        .post(format!("{}/api/quizzes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "Colors and capitals",
            "questions": [
                {
                    "type": "single-choice",
                    "question_text": "Capital of France?",
                    "options": [
                        { "text": "Paris", "is_correct": true },
                        { "text": "Berlin", "is_correct": false }
                    ]
                },
                {
                    "type": "short-text",
                    "question_text": "Favorite color?",
                    "correct_answer": "blue,green"
                }
            ]
        }))
        .send()
        .await
        .expect("create quiz failed");
    assert_eq!(create_resp.status().as_u16(), 201);

    let created: serde_json::Value = create_resp.json().await.unwrap();
    let quiz_id = created["id"].as_str().expect("quiz id missing").to_string();
    assert!(created["public_url"].as_str().unwrap().contains(&quiz_id));

    // 3. The public quiz page sees both questions.
    let quiz: serde_json::Value = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .expect("get quiz failed")
        .json()
        .await
        .unwrap();

    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);

    let single = questions
        .iter()
        .find(|q| q["type"] == "single-choice")
        .unwrap();
    let short = questions.iter().find(|q| q["type"] == "short-text").unwrap();
    let correct_option = single["question_options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["is_correct"] == true)
        .unwrap()["id"]
        .as_str()
        .unwrap();
    let wrong_option = single["question_options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["is_correct"] == false)
        .unwrap()["id"]
        .as_str()
        .unwrap();

    // 4. First respondent gets both right.
    let submit: serde_json::Value = client
        .post(format!("{}/api/responses", address))
        .json(&serde_json::json!({
            "quiz_id": quiz_id,
            "name": "Sam",
            "answers": [
                { "question_id": single["id"], "answer": correct_option },
                { "question_id": short["id"], "text_answer": "my favorite is Green" }
            ]
        }))
        .send()
        .await
        .expect("submit failed")
        .json()
        .await
        .unwrap();

    let winner_token = submit["userid"].as_str().unwrap().to_string();
    assert!(winner_token.starts_with("Sam:"));

    // 5. Second respondent (same display name) gets both wrong.
    let submit2: serde_json::Value = client
        .post(format!("{}/api/responses", address))
        .json(&serde_json::json!({
            "quiz_id": quiz_id,
            "name": "Sam",
            "answers": [
                { "question_id": single["id"], "answer": wrong_option },
                { "question_id": short["id"], "text_answer": "red" }
            ]
        }))
        .send()
        .await
        .expect("second submit failed")
        .json()
        .await
        .unwrap();
    let loser_token = submit2["userid"].as_str().unwrap().to_string();
    assert_ne!(winner_token, loser_token);

    // 6. Creator leaderboard: two distinct entries, scores 2 and 0.
    let leaderboard: serde_json::Value = client
        .get(format!("{}/api/responses/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("leaderboard failed")
        .json()
        .await
        .unwrap();

    let entries = leaderboard.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], winner_token.as_str());
    assert_eq!(entries[0]["total_correct_answers"], 2);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[1]["name"], loser_token.as_str());
    assert_eq!(entries[1]["total_correct_answers"], 0);
    assert_eq!(entries[1]["rank"], 2);

    // 7. Public results for the winner show per-question verdicts.
    let results: serde_json::Value = client
        .get(format!(
            "{}/api/responses/public/{}/{}",
            address, quiz_id, winner_token
        ))
        .send()
        .await
        .expect("public results failed")
        .json()
        .await
        .unwrap();

    assert_eq!(results["quiz_title"], "Colors and capitals");
    for question in results["questions"].as_array().unwrap() {
        assert_eq!(question["user_response"]["is_correct"], true);
    }
}
