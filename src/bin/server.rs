//! anchorauth REST API Server
//!
//! Run with: cargo run --features server --bin anchorauth-server
//!
//! The caller is named by the `x-user` header; requests without it are
//! anonymous.
//!
//! Endpoints:
//!   POST   /user                                  - Create user
//!   GET    /user/:name                            - Get user
//!   DELETE /user/:name                            - Delete user (purges rights on it)
//!   POST   /user/:name/roles                      - Replace role list
//!   POST   /user/:name/role/:role/rights/:anchor  - Set rights on an entity anchor
//!   POST   /user/:name/role/:role/rights          - Set rights on the all-users anchor
//!
//! Both rights endpoints take a bare JSON array of right names.
//!   POST   /entity                                - Create entity
//!   GET    /entity/:id                            - Get entity
//!   DELETE /entity/:id                            - Delete entity and subtree (purges rights on them)
//!   POST   /authorize                             - Evaluate requirements for the caller

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use anchorauth::{
    authorize, bootstrap, credentials, get_entity, get_user, init, is_bootstrapped, names_to_rights,
    AnchorAuthError, Entity, ObjectType, PermissionRequirement, PermissionType, Principal, Role, RoleName,
    StoredEntities, Target, User, ALL_USERS_ANCHOR,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct CreateUserReq {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeReq {
    #[serde(default)]
    requirements: Vec<PermissionRequirement>,
    target_entity: Option<String>,
    target_user: Option<String>,
}

#[derive(Serialize)]
struct AuthorizeRes {
    decision: &'static str,
    status: u16,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

// ============================================================================
// Helpers
// ============================================================================

fn fail<T>(status: StatusCode, msg: impl Into<String>) -> Reply<T> {
    (status, Json(ApiResponse::err(msg)))
}

fn error_reply<T>(e: AnchorAuthError) -> Reply<T> {
    let status = match e {
        AnchorAuthError::Validation(_) | AnchorAuthError::Configuration(_) => StatusCode::BAD_REQUEST,
        AnchorAuthError::NotFound(_) => StatusCode::NOT_FOUND,
        AnchorAuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    fail(status, e.to_string())
}

fn done<T>(r: Result<T, AnchorAuthError>) -> Reply<T> {
    match r {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => error_reply(e),
    }
}

/// The calling user, or None when anonymous or unknown
fn caller(headers: &HeaderMap) -> Result<Option<User>, AnchorAuthError> {
    match headers.get("x-user").and_then(|v| v.to_str().ok()) {
        Some(name) if !name.is_empty() => get_user(name),
        _ => Ok(None),
    }
}

/// Run the coordinator for the caller; Err carries the reply to send instead
fn guard<T>(headers: &HeaderMap, requirements: &[PermissionRequirement], target: Target<'_>) -> Result<(), Reply<T>> {
    let user = caller(headers).map_err(error_reply)?;
    let decision = authorize(&StoredEntities, Principal::from(user.as_ref()), requirements, target)
        .map_err(error_reply)?;
    if decision.is_allowed() {
        return Ok(());
    }
    let status = StatusCode::from_u16(decision.http_status()).unwrap_or(StatusCode::FORBIDDEN);
    Err(fail(status, decision.status_str()))
}

fn load_user<T>(name: &str) -> Result<User, Reply<T>> {
    match get_user(name) {
        Ok(Some(u)) => Ok(u),
        Ok(None) => Err(fail(StatusCode::NOT_FOUND, format!("user '{}' does not exist", name))),
        Err(e) => Err(error_reply(e)),
    }
}

fn load_entity<T>(id: &str) -> Result<Entity, Reply<T>> {
    match get_entity(id) {
        Ok(Some(e)) => Ok(e),
        Ok(None) => Err(fail(StatusCode::NOT_FOUND, format!("entity '{}' does not exist", id))),
        Err(e) => Err(error_reply(e)),
    }
}

fn admin_only() -> [PermissionRequirement; 1] {
    [PermissionRequirement::new(RoleName::Admin)]
}

fn user_admin(p: PermissionType) -> [PermissionRequirement; 2] {
    [
        PermissionRequirement::new(RoleName::Admin),
        PermissionRequirement::new(RoleName::UserAdmin).with_permission(p),
    ]
}

fn entity_access(p: PermissionType) -> [PermissionRequirement; 3] {
    [
        PermissionRequirement::new(RoleName::Admin),
        PermissionRequirement::new(RoleName::Level1Admin).with_permission(p),
        PermissionRequirement::of(RoleName::User, p, ObjectType::Entity),
    ]
}

// ============================================================================
// Handlers
// ============================================================================

async fn post_user(headers: HeaderMap, Json(req): Json<CreateUserReq>) -> Reply<User> {
    if let Err(r) = guard(&headers, &admin_only(), Target::None) {
        return r;
    }
    done(credentials::create_user(&req.name))
}

async fn get_user_handler(headers: HeaderMap, Path(name): Path<String>) -> Reply<User> {
    let user = match load_user(&name) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = guard(&headers, &user_admin(PermissionType::Read), Target::User(&user)) {
        return r;
    }
    (StatusCode::OK, Json(ApiResponse::ok(user)))
}

async fn delete_user(headers: HeaderMap, Path(name): Path<String>) -> Reply<User> {
    let user = match load_user(&name) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if let Err(r) = guard(&headers, &user_admin(PermissionType::Write), Target::User(&user)) {
        return r;
    }
    done(credentials::delete_user(&name))
}

async fn post_roles(headers: HeaderMap, Path(name): Path<String>, Json(roles): Json<Vec<Role>>) -> Reply<User> {
    if let Err(r) = guard(&headers, &admin_only(), Target::None) {
        return r;
    }
    done(credentials::set_roles(&name, roles))
}

fn apply_rights(name: &str, role: &str, anchor: &str, rights: &[String]) -> Reply<User> {
    let names: Vec<&str> = rights.iter().map(String::as_str).collect();
    let parsed = role.parse::<RoleName>().and_then(|role| Ok((role, names_to_rights(&names)?)));
    match parsed {
        Ok((role, rights)) => done(credentials::set_right(name, role, anchor, rights)),
        Err(e) => error_reply(e),
    }
}

async fn post_entity_rights(
    headers: HeaderMap,
    Path((name, role, anchor)): Path<(String, String, String)>,
    Json(rights): Json<Vec<String>>,
) -> Reply<User> {
    let entity = match get_entity(&anchor) {
        Ok(e) => e,
        Err(e) => return error_reply(e),
    };
    let target = entity.as_ref().map_or(Target::None, Target::Entity);
    if let Err(r) = guard(&headers, &entity_access(PermissionType::Write), target) {
        return r;
    }
    apply_rights(&name, &role, &anchor, &rights)
}

async fn post_rights(
    headers: HeaderMap,
    Path((name, role)): Path<(String, String)>,
    Json(rights): Json<Vec<String>>,
) -> Reply<User> {
    if let Err(r) = guard(&headers, &admin_only(), Target::None) {
        return r;
    }
    apply_rights(&name, &role, ALL_USERS_ANCHOR, &rights)
}

async fn post_entity(headers: HeaderMap, Json(entity): Json<Entity>) -> Reply<Entity> {
    let parent = match entity.parent_id.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => match load_entity(p) {
            Ok(e) => Some(e),
            Err(r) => return r,
        },
        None => None,
    };
    let target = parent.as_ref().map_or(Target::None, Target::Entity);
    if let Err(r) = guard(&headers, &entity_access(PermissionType::Write), target) {
        return r;
    }
    done(credentials::create_entity(entity))
}

async fn get_entity_handler(headers: HeaderMap, Path(id): Path<String>) -> Reply<Entity> {
    let entity = match load_entity(&id) {
        Ok(e) => e,
        Err(r) => return r,
    };
    if let Err(r) = guard(&headers, &entity_access(PermissionType::Read), Target::Entity(&entity)) {
        return r;
    }
    (StatusCode::OK, Json(ApiResponse::ok(entity)))
}

async fn delete_entity(headers: HeaderMap, Path(id): Path<String>) -> Reply<Vec<Entity>> {
    let entity = match load_entity(&id) {
        Ok(e) => e,
        Err(r) => return r,
    };
    if let Err(r) = guard(&headers, &entity_access(PermissionType::Write), Target::Entity(&entity)) {
        return r;
    }
    done(credentials::delete_entity(&id))
}

async fn post_authorize(headers: HeaderMap, Json(req): Json<AuthorizeReq>) -> Reply<AuthorizeRes> {
    let entity = match req.target_entity.as_deref().map(load_entity) {
        Some(Ok(e)) => Some(e),
        Some(Err(r)) => return r,
        None => None,
    };
    let user = match req.target_user.as_deref().map(load_user) {
        Some(Ok(u)) => Some(u),
        Some(Err(r)) => return r,
        None => None,
    };
    let target = match (&entity, &user) {
        (Some(e), _) => Target::Entity(e),
        (None, Some(u)) => Target::User(u),
        (None, None) => Target::None,
    };
    let result = caller(&headers).and_then(|caller| {
        authorize(&StoredEntities, Principal::from(caller.as_ref()), &req.requirements, target)
    });
    done(result.map(|d| AuthorizeRes { decision: d.status_str(), status: d.http_status() }))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("anchorauth=info,tower_http=info")),
        )
        .init();

    // Initialize database
    let db_path = std::env::var("ANCHORAUTH_DB").unwrap_or_else(|_| "./data/anchorauth.mdb".into());
    init(&db_path).expect("Failed to initialize database");

    // First admin
    if !is_bootstrapped().expect("Failed to read users") {
        let admin = std::env::var("ANCHORAUTH_ADMIN").unwrap_or_else(|_| "admin".into());
        bootstrap(&admin).expect("Failed to bootstrap admin user");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/user", post(post_user))
        .route("/user/:name", get(get_user_handler).delete(delete_user))
        .route("/user/:name/roles", post(post_roles))
        .route("/user/:name/role/:role/rights", post(post_rights))
        .route("/user/:name/role/:role/rights/:anchor", post(post_entity_rights))
        .route("/entity", post(post_entity))
        .route("/entity/:id", get(get_entity_handler).delete(delete_entity))
        .route("/authorize", post(post_authorize))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{}", port);
    tracing::info!(%addr, db = %db_path, "anchorauth server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await.expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
