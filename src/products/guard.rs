//! Owner-only write access to products.
//!
//! Callers must load the product first (absent rows are `NotFound`, never
//! `Forbidden`) and must not write anything before [`Decision::require`] passes.

use std::fmt;

use tracing::warn;
use uuid::Uuid;

use super::repo_types::Product;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Mutation),
}

impl Decision {
    pub fn require(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(m) => Err(AppError::Forbidden(format!(
                "You can only {m} your own products"
            ))),
        }
    }
}

/// Allow iff the actor is the product's owner. Anonymous actors never pass.
pub fn authorize_mutation(actor: Option<Uuid>, product: &Product, mutation: Mutation) -> Decision {
    match actor {
        Some(id) if id == product.owner_id => Decision::Allow,
        _ => {
            warn!(
                actor = ?actor,
                product_id = %product.id,
                owner_id = %product.owner_id,
                %mutation,
                "mutation denied"
            );
            Decision::Deny(mutation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use time::OffsetDateTime;

    fn product_owned_by(owner_id: Uuid) -> Product {
        let now = OffsetDateTime::now_utc();
        Product {
            id: Uuid::new_v4(),
            name: "Laptop".into(),
            description: None,
            price: Decimal::new(150099, 2),
            owner_id,
            owner_username: "owner".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_is_allowed_for_every_mutation() {
        let owner = Uuid::new_v4();
        let p = product_owned_by(owner);
        for m in [Mutation::Update, Mutation::Delete] {
            assert_eq!(authorize_mutation(Some(owner), &p, m), Decision::Allow);
        }
    }

    #[test]
    fn non_owner_is_denied() {
        let p = product_owned_by(Uuid::new_v4());
        for m in [Mutation::Update, Mutation::Delete] {
            assert_eq!(authorize_mutation(Some(Uuid::new_v4()), &p, m), Decision::Deny(m));
        }
    }

    #[test]
    fn anonymous_is_denied() {
        let p = product_owned_by(Uuid::new_v4());
        assert_eq!(
            authorize_mutation(None, &p, Mutation::Update),
            Decision::Deny(Mutation::Update)
        );
    }

    #[test]
    fn allow_iff_actor_is_owner() {
        let owners: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let products: Vec<Product> = owners.iter().map(|o| product_owned_by(*o)).collect();
        let actors = owners.iter().copied().map(Some).chain([None]);
        for actor in actors {
            for p in &products {
                let allowed =
                    authorize_mutation(actor, p, Mutation::Update) == Decision::Allow;
                assert_eq!(allowed, actor == Some(p.owner_id));
            }
        }
    }

    #[test]
    fn deny_maps_to_forbidden() {
        let err = Decision::Deny(Mutation::Delete).require().unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m.contains("delete")));
        assert!(Decision::Allow.require().is_ok());
    }
}
