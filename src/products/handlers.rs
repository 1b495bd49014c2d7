use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateProductRequest, ListQuery, ProductResponse, UpdateProductRequest},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

// --- public router ---

/// Reads are open; every write goes through [`AuthUser`].
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products/", get(list_products).post(create_product))
        .route("/products", get(list_products).post(create_product))
        .route("/products/my", get(list_my_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

// --- handlers ---

#[instrument(skip(state, body))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<CreateProductRequest>,
) -> Result<(StatusCode, HeaderMap, Json<ProductResponse>), AppError> {
    let product = services::create_product(state.products.as_ref(), user_id, body).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/products/{}", product.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(product.into())))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = services::list_products(state.products.as_ref(), &q).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn list_my_products(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = services::list_owned(state.products.as_ref(), user_id).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = services::get_product(state.products.as_ref(), id).await?;
    Ok(Json(product.into()))
}

#[instrument(skip(state, body))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = services::update_product(state.products.as_ref(), user_id, id, body).await?;
    Ok(Json(product.into()))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_product(state.products.as_ref(), user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
