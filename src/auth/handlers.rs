use actix_web::{web, HttpResponse, Responder};
use bcrypt::{hash, verify, DEFAULT_COST};

use super::jwt::{generate_token, get_token_expiry};
use super::model::{LoginRequest, RegisterRequest, RegisterResponse, TokenResponse, UserInfo};
use crate::AppState;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 409, description = "Email already registered", body = crate::ErrorResponse),
        (status = 500, description = "Internal Server Error", body = crate::ErrorResponse)
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> impl Responder {
    // Reject duplicate emails up front
    match state.get_user_by_email(&body.email).await {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(crate::ErrorResponse::new(
                "Conflict",
                "Email already registered",
            ));
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Database error during registration: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(crate::ErrorResponse::internal_error("Registration failed"));
        }
    }

    let password_hash = match hash(&body.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            log::error!("Failed to hash password: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(crate::ErrorResponse::internal_error("Registration failed"));
        }
    };

    match state
        .create_user(&body.name, &body.email, &password_hash)
        .await
    {
        Ok(user) => {
            log::info!("Registered new user {}", user.id);
            HttpResponse::Created().json(RegisterResponse {
                user: UserInfo::from(user),
            })
        }
        Err(e) => {
            log::error!("Failed to create user: {:?}", e);
            HttpResponse::InternalServerError()
                .json(crate::ErrorResponse::internal_error("Registration failed"))
        }
    }
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::ErrorResponse),
        (status = 500, description = "Internal Server Error", body = crate::ErrorResponse)
    )
)]
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let user = match state.get_user_by_email(&body.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(crate::ErrorResponse::new(
                "Unauthorized",
                "Invalid credentials",
            ));
        }
        Err(e) => {
            log::error!("Database error during login: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(crate::ErrorResponse::internal_error("Login failed"));
        }
    };

    let password_valid = verify(&body.password, &user.password_hash).unwrap_or(false);
    if !password_valid {
        return HttpResponse::Unauthorized().json(crate::ErrorResponse::new(
            "Unauthorized",
            "Invalid credentials",
        ));
    }

    let token = match generate_token(&user.id.to_string(), &user.email) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to generate token: {:?}", e);
            return HttpResponse::InternalServerError().json(
                crate::ErrorResponse::internal_error("Failed to generate token"),
            );
        }
    };

    HttpResponse::Ok().json(TokenResponse {
        token,
        user: UserInfo::from(user),
        expires_in: get_token_expiry(),
    })
}

/// Configure auth routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login)),
    );
}
