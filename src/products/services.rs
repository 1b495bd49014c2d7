use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::{CreateProductRequest, ListQuery, UpdateProductRequest},
    guard::{authorize_mutation, Mutation},
    repo::ProductRepo,
    repo_types::{NewProduct, Page, Product, ProductChanges},
};
use crate::error::AppError;

const NAME_MAX: usize = 100;
const PAGE_MAX: i64 = 100;

fn validate_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > NAME_MAX {
        return Err(AppError::validation(
            "name",
            format!("Name must be between 1 and {NAME_MAX} characters"),
        ));
    }
    Ok(name.to_string())
}

/// Non-negative and representable as NUMERIC(12,2).
fn validate_price(price: Decimal) -> Result<Decimal, AppError> {
    if price < Decimal::ZERO {
        return Err(AppError::validation("price", "Price must be non-negative"));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::validation(
            "price",
            "Price must have at most two decimal places",
        ));
    }
    if price >= Decimal::new(10_000_000_000, 0) {
        return Err(AppError::validation("price", "Price is too large"));
    }
    Ok(price)
}

fn validate_page(q: &ListQuery) -> Result<Page, AppError> {
    let skip = q.skip.unwrap_or(0);
    if skip < 0 {
        return Err(AppError::validation("skip", "skip must be non-negative"));
    }
    if let Some(limit) = q.limit {
        if !(1..=PAGE_MAX).contains(&limit) {
            return Err(AppError::validation(
                "limit",
                format!("limit must be between 1 and {PAGE_MAX}"),
            ));
        }
    }
    Ok(Page {
        skip,
        limit: q.limit,
    })
}

pub async fn create_product(
    repo: &dyn ProductRepo,
    owner_id: Uuid,
    req: CreateProductRequest,
) -> Result<Product, AppError> {
    let product = NewProduct {
        name: validate_name(&req.name)?,
        description: req.description,
        price: validate_price(req.price)?,
    };
    let created = repo.create(owner_id, product).await?;
    info!(product_id = %created.id, owner_id = %owner_id, "product created");
    Ok(created)
}

pub async fn list_products(
    repo: &dyn ProductRepo,
    query: &ListQuery,
) -> Result<Vec<Product>, AppError> {
    let page = validate_page(query)?;
    repo.list_all(page).await
}

pub async fn list_owned(repo: &dyn ProductRepo, owner_id: Uuid) -> Result<Vec<Product>, AppError> {
    repo.list_by_owner(owner_id).await
}

pub async fn get_product(repo: &dyn ProductRepo, id: Uuid) -> Result<Product, AppError> {
    repo.get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

/// Existence, then ownership, then the write. Nothing is written on any failure.
pub async fn update_product(
    repo: &dyn ProductRepo,
    actor: Uuid,
    id: Uuid,
    req: UpdateProductRequest,
) -> Result<Product, AppError> {
    let changes = ProductChanges {
        name: req.name.as_deref().map(validate_name).transpose()?,
        description: req.description,
        price: req.price.map(validate_price).transpose()?,
    };

    let product = get_product(repo, id).await?;
    authorize_mutation(Some(actor), &product, Mutation::Update).require()?;

    let updated = repo
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    info!(product_id = %id, actor = %actor, "product updated");
    Ok(updated)
}

pub async fn delete_product(repo: &dyn ProductRepo, actor: Uuid, id: Uuid) -> Result<(), AppError> {
    let product = get_product(repo, id).await?;
    authorize_mutation(Some(actor), &product, Mutation::Delete).require()?;

    if !repo.delete(id).await? {
        return Err(AppError::not_found("Product"));
    }
    info!(product_id = %id, actor = %actor, "product deleted");
    Ok(())
}
