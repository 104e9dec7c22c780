use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use llego_common::LlegoError;
use llego_store::User;
use secrecy::Secret;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{LoginRequest, RegisterRequest, TokenResponse, UserView};

const MIN_PASSWORD_LEN: usize = 8;

#[post("/auth/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        name,
        email,
        password,
        phone,
        role,
    } = body.into_inner();
    let email = email.trim().to_lowercase();

    if name.trim().is_empty() {
        return Err(LlegoError::invalid_input("name cannot be empty").into());
    }
    if !email.contains('@') {
        return Err(LlegoError::invalid_input(format!("Invalid email: {}", email)).into());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LlegoError::invalid_input(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }

    let users = state.repo::<User>();
    if !users.find_by("email", email.as_str()).await?.is_empty() {
        return Err(LlegoError::conflict(format!("Email {} is already registered", email)).into());
    }

    let password_hash = hash_password_blocking(Secret::new(password)).await?;
    let mut user = User {
        id: String::new(),
        name: name.trim().to_string(),
        email,
        phone,
        password: password_hash,
        role: role.unwrap_or_else(|| "customer".to_string()),
        created_at: Utc::now(),
    };
    user.id = users.insert(&user).await?;

    info!(email = %user.email, "Registered user {}", user.id);
    Ok(HttpResponse::Created().json(token_response(&state, user)?))
}

#[post("/auth/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let LoginRequest { email, password } = body.into_inner();
    let email = email.trim().to_lowercase();

    info!(email = %email, "Login attempt");

    let user = state
        .repo::<User>()
        .find_by("email", email.as_str())
        .await?
        .into_iter()
        .next();

    let user = match user {
        Some(user) => user,
        None => {
            warn!(email = %email, "Login for unknown email");
            return Err(invalid_credentials());
        }
    };

    if !verify_password_blocking(user.password.clone(), Secret::new(password)).await? {
        warn!(email = %email, "Login with wrong password");
        return Err(invalid_credentials());
    }

    Ok(HttpResponse::Ok().json(token_response(&state, user)?))
}

fn invalid_credentials() -> crate::error::ApiError {
    LlegoError::unauthorized("Invalid credentials").into()
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, LlegoError> {
    let access_token = state.jwt.create_token(&user.id, &user.email)?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.jwt.expires_in_seconds(),
        user: UserView::from(user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{configure, test_support};
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_register_then_login() {
        let ctx = test_support::context().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({
                "name": "Ana",
                "email": "Ana@Example.com",
                "password": "cafecito-123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["email"], "ana@example.com");
        assert_eq!(body["user"]["role"], "customer");
        assert!(body["user"].get("password").is_none());

        let claims = ctx
            .state
            .jwt
            .decode_token(body["access_token"].as_str().unwrap())
            .unwrap();
        assert_eq!(claims.sub, "ana@example.com");
        assert_eq!(claims.user_id, body["user"]["id"].as_str().unwrap());

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "ana@example.com", "password": "cafecito-123"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "ana@example.com", "password": "wrong-password"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "nadie@example.com", "password": "cafecito-123"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }

    #[actix_web::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let ctx = test_support::context().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let register_req = |email: &str, password: &str| {
            test::TestRequest::post()
                .uri("/auth/register")
                .set_json(json!({"name": "Ana", "email": email, "password": password}))
                .to_request()
        };

        assert_eq!(
            test::call_service(&app, register_req("ana@example.com", "cafecito-123")).await.status(),
            201
        );
        assert_eq!(
            test::call_service(&app, register_req("ANA@example.com", "otra-clave-1")).await.status(),
            409
        );
        assert_eq!(
            test::call_service(&app, register_req("no-at-sign", "cafecito-123")).await.status(),
            400
        );
        assert_eq!(
            test::call_service(&app, register_req("pepe@example.com", "corta")).await.status(),
            400
        );
        assert_eq!(ctx.store.count("users").await, 1);
    }
}
