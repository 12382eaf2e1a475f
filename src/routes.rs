use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers;
use crate::AppState;

fn cors_layer(state: &AppState) -> anyhow::Result<CorsLayer> {
    let mut origins = vec![state
        .config
        .frontend_url
        .parse::<HeaderValue>()
        .map_err(|e| anyhow::anyhow!("Invalid FRONTEND_URL: {}", e))?];
    // Extra origins are best effort, e.g. LAN access during development.
    for origin in &state.config.cors_extra_origins {
        match origin.parse::<HeaderValue>() {
            Ok(hv) => origins.push(hv),
            Err(_) => tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"),
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true))
}

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/moods", get(handlers::moods::list_moods))
        // Entries
        .route(
            "/api/entries",
            post(handlers::entries::create_entry)
                .get(handlers::entries::list_entries)
                .delete(handlers::entries::clear_entries),
        )
        .route("/api/entries/count", get(handlers::entries::count_entries))
        // Analytics
        .route("/api/analytics", get(handlers::analytics::get_report))
        .route(
            "/api/analytics/navigate",
            get(handlers::analytics::navigate),
        )
        .route(
            "/api/analytics/calendar",
            get(handlers::analytics::get_calendar),
        )
        .route("/api/export", get(handlers::export::export_csv))
        // Settings
        .route("/api/settings", get(handlers::settings::get_settings))
        .route(
            "/api/settings/:key",
            get(handlers::settings::get_setting).put(handlers::settings::put_setting),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state)?;

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db::memory::MemoryStore;

    fn app_with(store: Arc<MemoryStore>) -> Router {
        build_router(AppState::for_tests(store))
            .unwrap()
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    fn app() -> Router {
        app_with(Arc::new(MemoryStore::new()))
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn call_json(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, text) = call(app, method, uri, token, body).await;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap()
        };
        (status, value)
    }

    async fn register(app: &Router, email: &str) -> Value {
        let (status, body) = call_json(
            app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    async fn access_token(app: &Router, email: &str) -> String {
        register(app, email).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call_json(&app(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        let app = app();
        let (status, body) = call_json(&app, "GET", "/api/entries", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], 401);

        let (status, _) = call_json(&app, "GET", "/api/entries", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_be_used_as_access_token() {
        let app = app();
        let tokens = register(&app, "r@example.com").await;
        let refresh = tokens["refresh_token"].as_str().unwrap();
        let (status, _) = call_json(&app, "GET", "/api/me", Some(refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = app();
        register(&app, "Me@Example.com").await;

        let (status, _) = call_json(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "me@example.com", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call_json(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "me@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, tokens) = call_json(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "me@example.com", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let token = tokens["access_token"].as_str().unwrap();
        let (status, me) = call_json(&app, "GET", "/api/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "me@example.com");
        assert_eq!(me["total_entries"], 0);
        assert!(me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (status, body) = call_json(
            &app(),
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], 422);
    }

    #[tokio::test]
    async fn test_refresh_rotation_and_reuse_detection() {
        let app = app();
        let tokens = register(&app, "rot@example.com").await;
        let first = tokens["refresh_token"].as_str().unwrap().to_string();

        let (status, rotated) = call_json(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": first })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let second = rotated["refresh_token"].as_str().unwrap().to_string();

        // Replaying the rotated-out token revokes the whole family.
        let (status, _) = call_json(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": first })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call_json(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": second })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_rate_limit() {
        let app = app();
        let body = json!({ "email": "x@example.com", "password": "password123" });
        for _ in 0..5 {
            let (status, _) =
                call_json(&app, "POST", "/api/auth/login", None, Some(body.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, body) = call_json(&app, "POST", "/api/auth/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], 429);
    }

    #[tokio::test]
    async fn test_entry_lifecycle() {
        let app = app();
        let token = access_token(&app, "life@example.com").await;
        let token = Some(token.as_str());

        let (status, created) = call_json(
            &app,
            "POST",
            "/api/entries",
            token,
            Some(json!({
                "main_mood": "Happy",
                "sub_mood": "Grateful",
                "notes": "",
                "date": "2024-02-15",
                "time": "09:30:00",
                "timezone": "Europe/Berlin",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["timestamp"], "2024-02-15T08:30:00Z");
        assert_eq!(created["notes"], Value::Null);

        let (status, body) = call_json(
            &app,
            "POST",
            "/api/entries",
            token,
            Some(json!({ "main_mood": "Elated" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

        let (_, count) = call_json(&app, "GET", "/api/entries/count", token, None).await;
        assert_eq!(count["count"], 1);

        let (_, list) = call_json(&app, "GET", "/api/entries", token, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, cleared) = call_json(&app, "DELETE", "/api/entries", token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["deleted"], 1);

        let (_, count) = call_json(&app, "GET", "/api/entries/count", token, None).await;
        assert_eq!(count["count"], 0);
    }

    #[tokio::test]
    async fn test_entries_are_scoped_to_user() {
        let app = app();
        let alice = access_token(&app, "alice@example.com").await;
        let bob = access_token(&app, "bob@example.com").await;

        call_json(
            &app,
            "POST",
            "/api/entries",
            Some(&alice),
            Some(json!({ "main_mood": "Calm" })),
        )
        .await;

        let (_, count) = call_json(&app, "GET", "/api/entries/count", Some(&bob), None).await;
        assert_eq!(count["count"], 0);
    }

    async fn seed(app: &Router, token: &str, entries: &[(&str, &str)]) {
        for (mood, date) in entries {
            let (status, _) = call_json(
                app,
                "POST",
                "/api/entries",
                Some(token),
                Some(json!({ "main_mood": mood, "date": date, "time": "09:00:00" })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }

    #[tokio::test]
    async fn test_analytics_report() {
        let app = app();
        let token = access_token(&app, "stats@example.com").await;
        seed(
            &app,
            &token,
            &[
                ("Happy", "2024-01-01"),
                ("Happy", "2024-01-02"),
                ("Sad", "2024-01-03"),
                ("Angry", "2024-02-01"),
            ],
        )
        .await;

        let (status, report) = call_json(
            &app,
            "GET",
            "/api/analytics?granularity=month&date=2024-01-15&style=smooth&width=200&height=100",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{report}");
        assert_eq!(report["title"], "January 2024");
        assert_eq!(report["frequencies"][0], json!({ "mood": "Happy", "count": 2 }));
        assert_eq!(report["frequencies"][1], json!({ "mood": "Sad", "count": 1 }));
        assert_eq!(report["summary"]["total_entries"], 3);
        let scores: Vec<f64> = report["trend"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["score"].as_f64().unwrap())
            .collect();
        assert_eq!(scores, vec![5.0, 5.0, 1.5]);
        assert_eq!(report["plot"]["path"][1]["op"], "curve_to");
        assert!(report["svg_path"].as_str().unwrap().starts_with("M 0.00 0.00"));
    }

    #[tokio::test]
    async fn test_analytics_rejects_unknown_zone() {
        let app = app();
        let token = access_token(&app, "zone@example.com").await;
        let (status, _) = call_json(
            &app,
            "GET",
            "/api/analytics?tz=Atlantis/Capital",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_navigate_and_calendar() {
        let app = app();
        let token = access_token(&app, "cal@example.com").await;
        seed(
            &app,
            &token,
            &[("Happy", "2024-03-10"), ("Stressed", "2024-03-10")],
        )
        .await;

        let (_, nav) = call_json(
            &app,
            "GET",
            "/api/analytics/navigate?granularity=week&date=2024-02-15&step=-1&week_start=mon",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(nav["date"], "2024-02-08");
        assert_eq!(nav["title"], "Feb 5 - 11, 2024");

        let (status, cal) = call_json(
            &app,
            "GET",
            "/api/analytics/calendar?month=2024-03-20",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cal["title"], "March 2024");
        let days = cal["days"].as_array().unwrap();
        assert_eq!(days.len(), 42);
        let tenth = days.iter().find(|d| d["date"] == "2024-03-10").unwrap();
        assert_eq!(tenth["moods"], json!(["Happy", "Stressed"]));
        assert_eq!(cal["legend"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_store_outage_degrades_analytics_only() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(store.clone());
        let token = access_token(&app, "down@example.com").await;
        store.set_offline(true);

        let (status, report) =
            call_json(&app, "GET", "/api/analytics", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["summary"]["total_entries"], 0);

        let (status, _) = call_json(&app, "GET", "/api/entries", Some(&token), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, ready) = call_json(&app, "GET", "/readyz", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ready["checks"]["store"], "failed");
    }

    #[tokio::test]
    async fn test_export_csv() {
        let app = app();
        let token = access_token(&app, "csv@example.com").await;
        call_json(
            &app,
            "POST",
            "/api/entries",
            Some(&token),
            Some(json!({
                "main_mood": "Calm",
                "notes": "tea, \"green\"",
                "date": "2024-02-15",
                "time": "15:04:00",
            })),
        )
        .await;

        let req = Request::builder()
            .uri("/api/export")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert!(resp.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"mood-journal-"));

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(
            csv,
            "Date,Main Mood,Sub Mood,Notes\n\"Feb 15, 2024 at 3:04 PM\",\"Calm\",\"\",\"tea, \"\"green\"\"\"\n"
        );
    }

    #[tokio::test]
    async fn test_settings() {
        let app = app();
        let token = access_token(&app, "prefs@example.com").await;
        let token = Some(token.as_str());

        let (_, all) = call_json(&app, "GET", "/api/settings", token, None).await;
        assert_eq!(
            all,
            json!({
                "daily_reminder_enabled": false,
                "reminder_time": null,
                "selected_theme": "Green",
            })
        );

        let (status, _) = call_json(
            &app,
            "PUT",
            "/api/settings/selected_theme",
            token,
            Some(json!({ "value": "Neon" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call_json(
            &app,
            "PUT",
            "/api/settings/reminder_time",
            token,
            Some(json!({ "value": "21:30" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, one) = call_json(&app, "GET", "/api/settings/reminder_time", token, None).await;
        assert_eq!(one, json!({ "key": "reminder_time", "value": "21:30" }));

        let (status, _) = call_json(&app, "GET", "/api/settings/volume", token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_moods_catalog() {
        let app = app();
        let token = access_token(&app, "cat@example.com").await;
        let (status, moods) = call_json(&app, "GET", "/api/moods", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moods.as_array().unwrap().len(), 9);
        assert_eq!(moods[0]["emoji"], "😊");
    }
}
