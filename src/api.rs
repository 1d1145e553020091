//! Back-office REST API routes
//!
//! Store owners use these routes to manage their account, store and products,
//! and to list the orders the assistant registered.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info};

use crate::db;
use crate::models::{Order, Product, Store, User};
use crate::seed;

/// Status code and plain-text body
pub type ApiError = (StatusCode, String);

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "REST request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct UserIdResponse {
    pub id: i32,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub is_match: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStoreRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub price: String,
    pub stock: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedResponse {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Router
// ============================================================================

pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/user/:email", get(find_user).put(update_user))
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signup", post(sign_up))
        .route("/api/store/:id", get(get_store).put(update_store))
        .route("/api/store/:id/products", get(list_store_products))
        .route("/api/store/:id/orders", get(list_store_orders))
        .route(
            "/api/store/:id/product/:product_id",
            put(update_store_product),
        )
        .route("/api/seeder", get(run_seeder))
        .with_state(pool)
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_users(State(pool): State<PgPool>) -> Result<Json<Vec<User>>, ApiError> {
    let users = db::list_users(&pool).await.map_err(internal)?;
    Ok(Json(users))
}

async fn find_user(
    State(pool): State<PgPool>,
    Path(email): Path<String>,
) -> Result<Json<UserIdResponse>, ApiError> {
    let user = db::find_user_by_email(&pool, &email)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("User"))?;
    Ok(Json(UserIdResponse { id: user.id }))
}

/// `PUT /api/user/:userId` shares the path shape with the email lookup
async fn update_user(
    State(pool): State<PgPool>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let user_id: i32 = user_id
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid user id".to_string()))?;

    let user = db::update_user(&pool, user_id, &body.email, &body.name)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("User"))?;
    Ok(Json(user))
}

async fn sign_in(
    State(pool): State<PgPool>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let stored = db::get_user_password(&pool, &body.email)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("User"))?;

    Ok(Json(SignInResponse {
        is_match: stored == body.password,
    }))
}

async fn sign_up(
    State(pool): State<PgPool>,
    Json(body): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if body.password != body.confirm_password {
        return Err((StatusCode::BAD_REQUEST, "Passwords do not match".to_string()));
    }

    let user = db::create_user(&pool, &body.email, &body.password, &body.name)
        .await
        .map_err(internal)?;
    info!(user_id = user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/store/:userId` looks the store up by its owner
async fn get_store(
    State(pool): State<PgPool>,
    Path(user_id): Path<i32>,
) -> Result<Json<Store>, ApiError> {
    let store = db::get_store_by_user(&pool, user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Store"))?;
    Ok(Json(store))
}

async fn update_store(
    State(pool): State<PgPool>,
    Path(store_id): Path<i32>,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<Store>, ApiError> {
    let store = db::update_store(&pool, store_id, &body.name, &body.address)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Store"))?;
    Ok(Json(store))
}

async fn list_store_products(
    State(pool): State<PgPool>,
    Path(store_id): Path<i32>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = db::list_store_products(&pool, store_id)
        .await
        .map_err(internal)?;
    Ok(Json(products))
}

async fn list_store_orders(
    State(pool): State<PgPool>,
    Path(store_id): Path<i32>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = db::list_store_orders(&pool, store_id)
        .await
        .map_err(internal)?;
    Ok(Json(orders))
}

async fn update_store_product(
    State(pool): State<PgPool>,
    Path((store_id, product_id)): Path<(i32, i32)>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    if body.stock < 0 {
        return Err((StatusCode::BAD_REQUEST, "Stock cannot be negative".to_string()));
    }

    let product = db::update_store_product(
        &pool,
        store_id,
        product_id,
        &body.name,
        &body.price,
        body.stock,
    )
    .await
    .map_err(internal)?
    .ok_or_else(|| not_found("Product"))?;
    Ok(Json(product))
}

async fn run_seeder(
    State(pool): State<PgPool>,
) -> (StatusCode, Json<SeedResponse>) {
    match seed::seed_database(&pool).await {
        Ok(rows) => {
            info!(rows, "Database seeded");
            (
                StatusCode::OK,
                Json(SeedResponse {
                    success: true,
                    message: "Database seeded successfully".to_string(),
                }),
            )
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Error seeding database");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SeedResponse {
                    success: false,
                    message: format!("Error seeding database: {e}"),
                }),
            )
        }
    }
}
