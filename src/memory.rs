//! In-process stand-in for Postgres used by the test suite.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    error::AppError,
    products::{
        repo::ProductRepo,
        repo_types::{NewProduct, Page, Product, ProductChanges},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    products: Vec<Product>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Inserts a user with an unusable password hash and returns its ID.
    pub async fn seed_user(&self, username: &str) -> Uuid {
        let user = UserRepo::create(
            self,
            NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                password_hash: "!".into(),
            },
        )
        .await
        .expect("seed user");
        user.id
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateCredential("Email already registered".into()));
        }
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::DuplicateCredential("Username already taken".into()));
        }
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl ProductRepo for MemoryStore {
    async fn create(&self, owner_id: Uuid, product: NewProduct) -> Result<Product, AppError> {
        let mut t = self.tables.write().await;
        let Some(owner_username) = t
            .users
            .iter()
            .find(|u| u.id == owner_id)
            .map(|u| u.username.clone())
        else {
            return Err(AppError::Unauthorized("User not found".into()));
        };
        let now = OffsetDateTime::now_utc();
        let row = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            owner_id,
            owner_username,
            created_at: now,
            updated_at: now,
        };
        t.products.push(row.clone());
        Ok(row)
    }

    async fn list_all(&self, page: Page) -> Result<Vec<Product>, AppError> {
        let t = self.tables.read().await;
        let rows = t.products.iter().skip(page.skip.max(0) as usize);
        Ok(match page.limit {
            Some(limit) => rows.take(limit.max(0) as usize).cloned().collect(),
            None => rows.cloned().collect(),
        })
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>, AppError> {
        let t = self.tables.read().await;
        Ok(t.products
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let t = self.tables.read().await;
        Ok(t.products.iter().find(|p| p.id == id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Option<Product>, AppError> {
        let mut t = self.tables.write().await;
        let Some(row) = t.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(description) = changes.description {
            row.description = Some(description);
        }
        if let Some(price) = changes.price {
            row.price = price;
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut t = self.tables.write().await;
        let before = t.products.len();
        t.products.retain(|p| p.id != id);
        Ok(t.products.len() != before)
    }
}
