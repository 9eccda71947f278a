use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Offset, Utc};

use blog_core::domain::{NewPost, NewUser};
use blog_infra::InMemoryStore;

use super::configure_routes;
use crate::config::AppConfig;
use crate::state::AppState;

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: None,
        #[cfg(feature = "auth")]
        jwt: blog_infra::JwtConfig::default(),
        #[cfg(feature = "auth")]
        staff_account: None,
        utc_offset: Utc.fix(),
    }
}

fn test_state() -> AppState {
    let repos = Arc::new(InMemoryStore::new()).repositories();
    AppState::with_repositories(repos, &test_config())
}

async fn seed_post(state: &AppState, published: bool) -> i64 {
    let repos = state.blog.repositories();
    let author = match repos.users.find_by_username("author").await.unwrap() {
        Some(user) => user,
        None => repos
            .users
            .create(NewUser::new("author", "x"))
            .await
            .unwrap(),
    };
    repos
        .posts
        .create(NewPost {
            title: "Seeded".to_string(),
            text: "Body".to_string(),
            pub_date: Utc::now() - Duration::hours(1),
            is_published: published,
            image: None,
            author_id: author.id,
            location_id: None,
            category_id: None,
        })
        .await
        .unwrap()
        .id
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let app = app!(test_state());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_index_lists_public_posts() {
    let state = test_state();
    seed_post(&state, true).await;
    seed_post(&state, false).await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["posts"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["posts"][0]["author_username"], "author");
}

#[actix_web::test]
async fn test_hidden_and_malformed_posts_are_404() {
    let state = test_state();
    let hidden = seed_post(&state, false).await;
    let app = app!(state);

    for uri in [format!("/posts/{hidden}/"), "/posts/999/".to_string(), "/posts/abc/".to_string()] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn test_problem_details_body() {
    let app = app!(test_state());

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/profile/ghost/").to_request())
            .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["detail"], "User ghost not found");
}

#[actix_web::test]
async fn test_anonymous_create_redirects_to_login() {
    let app = app!(test_state());

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(header::ContentType::form_url_encoded())
        .set_payload("title=x&text=y&pub_date=2024-01-01T10:00")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/auth/login/?next=/posts/create/"
    );
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["login_required"], true);
}

#[actix_web::test]
async fn test_page_query_out_of_range_clamps() {
    let state = test_state();
    seed_post(&state, true).await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/profile/author/?page=7")
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["page"]["number"], 1);
    assert_eq!(body["is_owner"], false);
}

#[actix_web::test]
async fn test_anonymous_management_requires_login() {
    let app = app!(test_state());

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/manage/categories/").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/auth/login/?next=/manage/categories/"
    );
}

#[cfg(feature = "auth")]
mod accounts {
    use super::*;

    /// Registers `username` over HTTP, logs in and yields the bearer token.
    macro_rules! register_and_login {
        ($app:expr, $username:expr) => {{
            let username = $username;
            let req = test::TestRequest::post()
                .uri("/auth/registration/")
                .insert_header(header::ContentType::form_url_encoded())
                .set_payload(format!(
                    "username={username}&password1=long+enough&password2=long+enough"
                ))
                .to_request();
            let resp = test::call_service($app, req).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/auth/login/");

            let req = test::TestRequest::post()
                .uri("/auth/login/?next=/posts/create/")
                .insert_header(header::ContentType::form_url_encoded())
                .set_payload(format!("username={username}&password=long+enough"))
                .to_request();
            let resp = test::call_service($app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["token_type"], "Bearer");
            assert_eq!(body["next"], "/posts/create/");
            body["access_token"].as_str().unwrap().to_string()
        }};
    }

    #[actix_web::test]
    async fn test_logged_in_user_creates_post() {
        let app = app!(test_state());
        let token = register_and_login!(&app, "writer");

        let req = test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .insert_header(header::ContentType::form_url_encoded())
            .set_payload("title=Hello&text=World&pub_date=2024-01-01T10%3A00")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/profile/writer/"
        );
    }

    #[actix_web::test]
    async fn test_invalid_form_is_422() {
        let state = test_state();
        let post_id = seed_post(&state, true).await;
        let app = app!(state);
        let token = register_and_login!(&app, "reader");

        let req = test::TestRequest::post()
            .uri(&format!("/posts/{post_id}/comment/"))
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .insert_header(header::ContentType::form_url_encoded())
            .set_payload(format!("text={}", "x".repeat(1001)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["errors"]["text"].is_array());
    }

    #[actix_web::test]
    async fn test_bad_token_is_anonymous() {
        let app = app!(test_state());

        let req = test::TestRequest::get()
            .uri("/profile/edit/")
            .insert_header((header::AUTHORIZATION, "Bearer garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/profile/edit/"
        );
    }

    #[actix_web::test]
    async fn test_wrong_password_is_401() {
        let app = app!(test_state());
        register_and_login!(&app, "someone");

        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .insert_header(header::ContentType::form_url_encoded())
            .set_payload("username=someone&password=wrong")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_provisioned_staff_account_reaches_management() {
        let mut config = test_config();
        config.staff_account = Some(crate::config::StaffAccount {
            username: "admin".to_string(),
            password: "admin password".to_string(),
        });
        let state = test_state();
        state.provision_staff(&config).await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .insert_header(header::ContentType::form_url_encoded())
            .set_payload("username=admin&password=admin+password")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let token = body["access_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/manage/categories/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_regular_user_is_sent_home_from_management() {
        let app = app!(test_state());
        let token = register_and_login!(&app, "regular");

        let req = test::TestRequest::get()
            .uri("/manage/categories/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
    }
}
