use crate::{
    auth::{
        auth::{AuthUser, bearer_token},
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
        usernames::UsernameRegistry,
    },
    config::Config,
    errors::AppError,
    model::role::Role,
    models::{Claims, LoginReqDto, TokenPair, TokenType, UserReq, UserSql},
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Width of `users.username`.
const USERNAME_MAX: usize = 150;

fn internal(context: &'static str, e: impl std::fmt::Display) -> HttpResponse {
    error!(error = %e, "{}", context);
    HttpResponse::InternalServerError().json(json!({"error": context}))
}

/// The very first account administers the books. After that only an admin
/// may hand out a role; everyone else starts as a viewer.
pub fn granted_role(requested: Option<u8>, caller: Option<&AuthUser>, existing_users: u64) -> Role {
    if existing_users == 0 {
        return Role::Admin;
    }

    match caller {
        Some(user) if user.role == Role::Admin => {
            requested.and_then(Role::from_id).unwrap_or(Role::Viewer)
        }
        _ => Role::Viewer,
    }
}

async fn insert_user(
    username: &str,
    password: &str,
    role: Role,
    pool: &MySqlPool,
    usernames: &UsernameRegistry,
) -> Result<(), HttpResponse> {
    let hashed = hash_password(password).map_err(|e| internal("Failed to register user", e))?;

    let result = sqlx::query("INSERT INTO users (username, password, role_id) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hashed)
        .bind(role.id())
        .execute(pool)
        .await;

    match result {
        Ok(_) => {
            usernames.mark_taken(username).await;
            Ok(())
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(HttpResponse::Conflict().json(json!({
                        "error": "Username already exists"
                    })));
                }
            }

            Err(internal("Failed to register user", e))
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = UserReq,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Empty username or password, or username too long"),
        (status = 409, description = "Username already taken")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip_all, fields(username = %user.username))]
pub async fn register(
    caller: Option<AuthUser>,
    user: web::Json<UserReq>,
    pool: web::Data<MySqlPool>,
    usernames: web::Data<UsernameRegistry>,
) -> HttpResponse {
    let username = user.username.trim().to_lowercase();
    let password = &user.password;

    if username.is_empty() || password.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Username and password must not be empty"
        }));
    }

    if username.chars().count() > USERNAME_MAX {
        return HttpResponse::BadRequest().json(json!({
            "error": format!("Username is limited to {} characters", USERNAME_MAX)
        }));
    }

    if !usernames.is_available(&username, pool.get_ref()).await {
        return HttpResponse::Conflict().json(json!({
            "error": "Username already taken"
        }));
    }

    let existing_users = match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool.get_ref())
        .await
    {
        Ok(count) => count.max(0) as u64,
        Err(e) => return internal("Failed to register user", e),
    };

    let role = granted_role(user.role_id, caller.as_ref(), existing_users);

    match insert_user(&username, password, role, pool.get_ref(), &usernames).await {
        Ok(_) => {
            info!(role = ?role, "User registered");
            HttpResponse::Created().json(json!({
                "message": "User registered successfully",
                "role_id": role.id(),
            }))
        }
        Err(err_resp) => err_resp,
    }
}

async fn issue_pair(
    user_id: u64,
    username: String,
    role: u8,
    pool: &MySqlPool,
    config: &Config,
) -> Result<TokenPair, HttpResponse> {
    let access_token = generate_access_token(
        user_id,
        username.clone(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| internal("Failed to issue token", e))?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user_id,
        username,
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| internal("Failed to issue token", e))?;

    debug!(user_id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await
    .map_err(|e| internal("Failed to store refresh token", e))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, body = TokenPair),
        (status = 400, description = "Username or password required"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    info!("Login request received");

    let username = user.username.trim().to_lowercase();
    if username.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().body("Username or password required");
    }

    let db_user = match sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, username, password, role_id, is_active
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(&username)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) if user.is_active => user,
        Ok(Some(_)) => {
            info!("Invalid credentials: account disabled");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => return internal("Failed to fetch user", e),
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    let pair = match issue_pair(db_user.id, db_user.username, db_user.role_id, &pool, &config).await {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        // not fatal for the login itself
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");
    HttpResponse::Ok().json(pair)
}

/// A refresh token from the Authorization header, or `None`.
fn refresh_claims(req: &HttpRequest, config: &Config) -> Option<Claims> {
    let claims = verify_token(bearer_token(req)?, &config.jwt_secret).ok()?;
    (claims.token_type == TokenType::Refresh).then_some(claims)
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let claims = match refresh_claims(&req, &config) {
        Some(c) => c,
        None => return HttpResponse::Unauthorized().finish(),
    };

    // Revoking first makes a replayed refresh token fail.
    let revoked = match sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE",
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await
    {
        Ok(result) => result.rows_affected(),
        Err(e) => return internal("Failed to rotate refresh token", e),
    };

    if revoked == 0 {
        info!(user_id = claims.user_id, "Refresh token unknown or already revoked");
        return HttpResponse::Unauthorized().finish();
    }

    match issue_pair(claims.user_id, claims.sub, claims.role, &pool, &config).await {
        Ok(pair) => HttpResponse::Ok().json(pair),
        Err(resp) => resp,
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked (if it existed)")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let claims = match refresh_claims(&req, &config) {
        Some(c) => c,
        None => return HttpResponse::NoContent().finish(),
    };

    // idempotent
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "The authenticated user")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(json!({
        "user_id": auth.user_id,
        "username": auth.username,
        "role_id": auth.role.id(),
        "can_write": auth.role.can_write(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode};
    use actix_web::test as actix_test;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "root".into(),
            role,
        }
    }

    #[test]
    fn first_account_is_admin() {
        assert_eq!(granted_role(None, None, 0), Role::Admin);
        assert_eq!(granted_role(Some(3), None, 0), Role::Admin);
    }

    #[test]
    fn only_admins_hand_out_roles() {
        assert_eq!(granted_role(Some(1), None, 5), Role::Viewer);
        assert_eq!(granted_role(Some(1), Some(&user(Role::Bookkeeper)), 5), Role::Viewer);
        assert_eq!(granted_role(Some(2), Some(&user(Role::Admin)), 5), Role::Bookkeeper);
        assert_eq!(granted_role(Some(42), Some(&user(Role::Admin)), 5), Role::Viewer);
    }

    #[actix_web::test]
    async fn logout_without_refresh_token_is_a_no_op() {
        let pool = sqlx::mysql::MySqlPoolOptions::new()
            .connect_lazy("mysql://nobody@localhost/none")
            .unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(Config::for_tests("s")))
                .route("/auth/logout", web::post().to(logout))
                .route("/auth/refresh", web::post().to(refresh_token)),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/auth/logout").to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        // An access token cannot be used to refresh.
        let access = generate_access_token(1, "root".into(), 1, "s", 60).unwrap();
        let req = actix_test::TestRequest::post()
            .uri("/auth/refresh")
            .insert_header(("Authorization", format!("Bearer {}", access)))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn register_rejects_blank_credentials() {
        let pool = sqlx::mysql::MySqlPoolOptions::new()
            .connect_lazy("mysql://nobody@localhost/none")
            .unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(UsernameRegistry::new()))
                .app_data(web::Data::new(Config::for_tests("s")))
                .route("/auth/register", web::post().to(register)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({"username": "  ", "password": "x"}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn register_rejects_overlong_username() {
        let pool = sqlx::mysql::MySqlPoolOptions::new()
            .connect_lazy("mysql://nobody@localhost/none")
            .unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(UsernameRegistry::new()))
                .app_data(web::Data::new(Config::for_tests("s")))
                .route("/auth/register", web::post().to(register)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({"username": "u".repeat(USERNAME_MAX + 1), "password": "x"}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
