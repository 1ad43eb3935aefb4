//! API routes

use crate::api::handlers::{
    // Directory
    create_publication, create_trial, get_publication, get_trial, list_experts,
    list_publications, list_trials,
    // Profiles
    get_patient_profile, get_researcher_profile, list_researchers, upsert_patient_profile,
    upsert_researcher_profile,
    // Favorites
    add_favorite, list_favorites, remove_favorite,
    // Forums
    create_forum, create_post, create_reply, list_forums, list_posts, list_replies,
    // Meeting requests
    create_meeting_request, list_meeting_requests,
    // System
    health_check, root,
    AppState,
};
use crate::auth::handlers::{get_me, login, register, update_me};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/researchers", get(list_researchers))
        .route("/api/trials", get(list_trials))
        .route("/api/trials/:id", get(get_trial))
        .route("/api/publications", get(list_publications))
        .route("/api/publications/:id", get(get_publication))
        .route("/api/experts", get(list_experts))
        .route("/api/forums", get(list_forums))
        .route("/api/forums/:id/posts", get(list_posts))
        .route("/api/forums/posts/:id/replies", get(list_replies));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(get_me).patch(update_me))
        .route(
            "/api/patients/profile",
            get(get_patient_profile).post(upsert_patient_profile),
        )
        .route(
            "/api/researchers/profile",
            get(get_researcher_profile).post(upsert_researcher_profile),
        )
        .route("/api/trials", post(create_trial))
        .route("/api/publications", post(create_publication))
        .route("/api/favorites", get(list_favorites).post(add_favorite))
        .route("/api/favorites/:id", delete(remove_favorite))
        .route("/api/forums", post(create_forum))
        .route("/api/forums/posts", post(create_post))
        .route("/api/forums/replies", post(create_reply))
        .route(
            "/api/meeting-requests",
            get(list_meeting_requests).post(create_meeting_request),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    public_routes.merge(protected_routes).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::INVALID_CREDENTIALS;
    use crate::core::config::tests::test_config;
    use crate::db::manager::DatabaseManager;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        state: AppState,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
            let state = AppState::new(Arc::new(test_config()), db).unwrap();
            let router = build_api_routes(state.clone());
            Self { state, router }
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.dispatch(request).await
        }

        async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, body)
        }

        async fn register(
            &self,
            email: &str,
            password: &str,
            user_type: &str,
        ) -> (StatusCode, Value) {
            self.send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"email": email, "password": password, "user_type": user_type})),
            )
            .await
        }

        async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
            let form = format!(
                "username={}&password={}",
                email.replace('@', "%40"),
                password
            );
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap();
            self.dispatch(request).await
        }

        /// Register and return (token, user id)
        async fn signup(&self, email: &str, user_type: &str) -> (String, String) {
            let (status, body) = self.register(email, "pw1", user_type).await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            (
                body["access_token"].as_str().unwrap().to_string(),
                body["user"]["id"].as_str().unwrap().to_string(),
            )
        }
    }

    #[tokio::test]
    async fn test_register_returns_identity_and_token() {
        let app = TestApp::new();

        let (status, body) = app.register("A@X.com", "pw1", "patient").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["user"]["email"], "a@x.com");
        assert_eq!(body["user"]["user_type"], "patient");
        assert_eq!(body["user"]["is_active"], true);
        assert!(body["user"].get("password_hash").is_none());

        let token = body["access_token"].as_str().unwrap();
        let (status, me) = app.send(Method::GET, "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], body["user"]["id"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = TestApp::new();
        app.signup("a@x.com", "patient").await;

        let (status, body) = app.register(" a@X.COM ", "other", "researcher").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email already registered");
        assert_eq!(app.state.user_repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = TestApp::new();

        let (status, _) = app.register("not-an-email", "pw1", "patient").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.register("a@x.com", "", "patient").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.register("a@x.com", &"p".repeat(73), "patient").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(app.state.user_repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_input_gets_json_error_body() {
        let app = TestApp::new();

        let (status, body) = app.register("a@x.com", "pw1", "admin").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");
        assert!(body["message"].as_str().unwrap().contains("user_type"));
        assert!(body["trace_id"].is_string());
        assert_eq!(app.state.user_repo.count().await.unwrap(), 0);

        let (status, body) = app
            .send(Method::GET, "/api/trials?limit=abc", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidRequest");
        assert!(body["trace_id"].is_string());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=a%40x.com"))
            .unwrap();
        let (status, body) = app.dispatch(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidRequest");
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let app = TestApp::new();
        let (_, user_id) = app.signup("a@x.com", "patient").await;

        let (status, body) = app.login("a@x.com", "pw1").await;
        assert_eq!(status, StatusCode::OK);
        let token = body["access_token"].as_str().unwrap();
        assert_eq!(app.state.tokens.verify(token).unwrap(), user_id);

        let (status, body) = app.login("a@x.com", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Incorrect email or password");
        assert!(body.get("access_token").is_none());

        let (status, body) = app.login("nobody@x.com", "pw1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Incorrect email or password");
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_password_check() {
        let app = TestApp::new();
        app.signup("a@x.com", "patient").await;

        let before = app.state.hasher.checks_performed();
        let (status, _) = app.login("a@x.com", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(app.state.hasher.checks_performed(), before + 1);

        let (status, _) = app.login("nobody@x.com", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(app.state.hasher.checks_performed(), before + 2);
    }

    #[tokio::test]
    async fn test_inactive_account() {
        let app = TestApp::new();
        let (token, user_id) = app.signup("a@x.com", "patient").await;
        app.state.user_repo.set_active(&user_id, false).await.unwrap();

        let (status, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Inactive user");

        let (status, body) = app.login("a@x.com", "pw1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Inactive user");
    }

    #[tokio::test]
    async fn test_credential_failures_share_one_response() {
        let app = TestApp::new();
        let (token, _) = app.signup("a@x.com", "patient").await;

        let ghost = app.state.tokens.issue_now("no-such-user").unwrap();
        let expired = app
            .state
            .tokens
            .issue("no-such-user", chrono::Utc::now() - chrono::Duration::hours(2))
            .unwrap();
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let mut bodies = Vec::new();
        let candidates = [
            Some(ghost.as_str()),
            Some(expired.as_str()),
            Some("garbage"),
            Some(tampered.as_str()),
            None,
        ];
        for candidate in candidates {
            let (status, body) = app.send(Method::GET, "/api/auth/me", candidate, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{:?}", candidate);
            bodies.push(body);
        }

        for body in &bodies {
            assert_eq!(body["message"], INVALID_CREDENTIALS);
            assert_eq!(body["error"], bodies[0]["error"]);
        }
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_rejected() {
        let app = TestApp::new();
        let (token, _) = app.signup("a@x.com", "patient").await;

        let request = Request::builder()
            .uri("/api/auth/me")
            .header(header::AUTHORIZATION, format!("Token {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.dispatch(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_password_change() {
        let app = TestApp::new();
        let (token, _) = app.signup("a@x.com", "patient").await;

        let (status, body) = app
            .send(
                Method::PATCH,
                "/api/auth/me",
                Some(&token),
                Some(json!({"password": "new-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["updated_at"].is_string());

        assert_eq!(app.login("a@x.com", "pw1").await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(app.login("a@x.com", "new-password").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_patient_cannot_create_trial() {
        let app = TestApp::new();
        let (token, _) = app.signup("p@x.com", "patient").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/trials",
                Some(&token),
                Some(json!({"title": "Sneaky trial"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "PermissionDenied");

        let (_, trials) = app.send(Method::GET, "/api/trials", None, None).await;
        assert_eq!(trials, json!([]));
    }

    #[tokio::test]
    async fn test_researcher_trial_lifecycle() {
        let app = TestApp::new();
        let (token, user_id) = app.signup("r@x.com", "researcher").await;

        let (status, created) = app
            .send(
                Method::POST,
                "/api/trials",
                Some(&token),
                Some(json!({
                    "title": "Asthma Inhaler Study",
                    "description": "Dose finding",
                    "locations": ["Boston"],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "recruiting");
        assert_eq!(created["created_by"], user_id.as_str());

        let (_, found) = app
            .send(Method::GET, "/api/trials?keywords=ASTHMA&location=Boston", None, None)
            .await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (_, none) = app
            .send(Method::GET, "/api/trials?status=completed", None, None)
            .await;
        assert_eq!(none, json!([]));

        let uri = format!("/api/trials/{}", created["id"].as_str().unwrap());
        let (status, one) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["title"], "Asthma Inhaler Study");

        let (status, _) = app.send(Method::GET, "/api/trials/missing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_publications() {
        let app = TestApp::new();
        let (researcher, _) = app.signup("r@x.com", "researcher").await;
        let (patient, _) = app.signup("p@x.com", "patient").await;

        let paper = json!({"title": "Gene therapy outcomes", "abstract": "Long-term follow-up"});
        let (status, _) = app
            .send(Method::POST, "/api/publications", Some(&patient), Some(paper.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, created) = app
            .send(Method::POST, "/api/publications", Some(&researcher), Some(paper))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["abstract"], "Long-term follow-up");

        let (_, found) = app
            .send(Method::GET, "/api/publications?keywords=follow-up", None, None)
            .await;
        assert_eq!(found.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_profiles() {
        let app = TestApp::new();
        let (patient, _) = app.signup("p@x.com", "patient").await;
        let (researcher, _) = app.signup("r@x.com", "researcher").await;

        let (status, _) = app
            .send(Method::GET, "/api/patients/profile", Some(&patient), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, saved) = app
            .send(
                Method::POST,
                "/api/patients/profile",
                Some(&patient),
                Some(json!({"full_name": "Pat", "conditions": ["asthma"]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["conditions"], json!(["asthma"]));

        let (status, _) = app
            .send(
                Method::POST,
                "/api/patients/profile",
                Some(&researcher),
                Some(json!({"full_name": "Not a patient"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/researchers/profile",
                Some(&researcher),
                Some(json!({"full_name": "Dr. R", "specialties": ["oncology"]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, directory) = app
            .send(Method::GET, "/api/researchers?specialty=oncology", None, None)
            .await;
        assert_eq!(directory.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_favorites_are_private() {
        let app = TestApp::new();
        let (alice, _) = app.signup("alice@x.com", "patient").await;
        let (bob, _) = app.signup("bob@x.com", "patient").await;

        let favorite = json!({"favorite_type": "trial", "favorite_id": "t1"});
        let (status, created) = app
            .send(Method::POST, "/api/favorites", Some(&alice), Some(favorite.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app
            .send(Method::POST, "/api/favorites", Some(&alice), Some(favorite))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Already favorited");

        let (_, bobs) = app.send(Method::GET, "/api/favorites", Some(&bob), None).await;
        assert_eq!(bobs, json!([]));

        let uri = format!("/api/favorites/{}", created["id"].as_str().unwrap());
        let (status, _) = app.send(Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.send(Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, remaining) = app.send(Method::GET, "/api/favorites", Some(&alice), None).await;
        assert_eq!(remaining, json!([]));
    }

    #[tokio::test]
    async fn test_forum_flow() {
        let app = TestApp::new();
        let (researcher, _) = app.signup("r@x.com", "researcher").await;
        let (patient, _) = app.signup("p@x.com", "patient").await;

        let (status, _) = app
            .send(Method::POST, "/api/forums", Some(&patient), Some(json!({"name": "Nope"})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, forum) = app
            .send(Method::POST, "/api/forums", Some(&researcher), Some(json!({"name": "Oncology"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let forum_id = forum["id"].as_str().unwrap();

        let (status, _) = app
            .send(
                Method::POST,
                "/api/forums/posts",
                Some(&patient),
                Some(json!({"forum_id": "missing", "title": "Q", "content": "?"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, post) = app
            .send(
                Method::POST,
                "/api/forums/posts",
                Some(&patient),
                Some(json!({"forum_id": forum_id, "title": "Question", "content": "Anyone?"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(post["author_type"], "patient");
        let post_id = post["id"].as_str().unwrap();

        let reply = json!({"post_id": post_id, "content": "Yes"});
        let (status, _) = app
            .send(Method::POST, "/api/forums/replies", Some(&patient), Some(reply.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(Method::POST, "/api/forums/replies", Some(&researcher), Some(reply))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, posts) = app
            .send(Method::GET, &format!("/api/forums/{}/posts", forum_id), None, None)
            .await;
        assert_eq!(posts.as_array().unwrap().len(), 1);

        let (_, replies) = app
            .send(Method::GET, &format!("/api/forums/posts/{}/replies", post_id), None, None)
            .await;
        assert_eq!(replies.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_meeting_requests() {
        let app = TestApp::new();
        let (patient, user_id) = app.signup("p@x.com", "patient").await;
        let (other, _) = app.signup("o@x.com", "patient").await;

        let (status, created) = app
            .send(
                Method::POST,
                "/api/meeting-requests",
                Some(&patient),
                Some(json!({
                    "expert_id": "e1",
                    "message": "Hi",
                    "contact_info": {"email": "p@x.com"},
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["requester_id"], user_id.as_str());

        let (_, mine) = app.send(Method::GET, "/api/meeting-requests", Some(&patient), None).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);

        let (_, theirs) = app.send(Method::GET, "/api/meeting-requests", Some(&other), None).await;
        assert_eq!(theirs, json!([]));
    }

    #[tokio::test]
    async fn test_pagination_limits() {
        let app = TestApp::new();
        let (token, _) = app.signup("r@x.com", "researcher").await;

        for i in 0..3 {
            let (status, _) = app
                .send(
                    Method::POST,
                    "/api/trials",
                    Some(&token),
                    Some(json!({"title": format!("Trial {}", i)})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, page) = app.send(Method::GET, "/api/trials?skip=1&limit=1", None, None).await;
        assert_eq!(page.as_array().unwrap().len(), 1);

        let (_, rest) = app.send(Method::GET, "/api/trials?skip=2", None, None).await;
        assert_eq!(rest.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_liveness_routes() {
        let app = TestApp::new();
        assert_eq!(app.send(Method::GET, "/", None, None).await.0, StatusCode::OK);
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
