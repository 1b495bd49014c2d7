use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::RegisterRequest,
    password::{hash_password, verify_dummy, verify_password},
    repo::UserRepo,
    repo_types::{NewUser, User},
};
use crate::error::AppError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(AppError::validation(
            "username",
            "Username must be between 3 and 50 characters",
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::validation(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if email.chars().count() > 100 || !is_valid_email(email) {
        return Err(AppError::validation("email", "Invalid email"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(8..=100).contains(&len) {
        return Err(AppError::validation(
            "password",
            "Password must be between 8 and 100 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::validation(
            "password",
            "Password must contain at least one letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(
            "password",
            "Password must contain at least one number",
        ));
    }
    Ok(())
}

/// Validates and stores a new user. The raw password never leaves this function.
pub async fn register(users: &dyn UserRepo, req: RegisterRequest) -> Result<User, AppError> {
    let username = req.username.trim().to_string();
    let email = normalize_email(&req.email);

    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&req.password)?;

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateCredential("Email already registered".into()));
    }
    if users.find_by_username(&username).await?.is_some() {
        warn!(username = %username, "username already taken");
        return Err(AppError::DuplicateCredential("Username already taken".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks an email/password pair. Unknown email and wrong password are the same error.
pub async fn authenticate(
    users: &dyn UserRepo,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);

    let Some(user) = users.find_by_email(&email).await? else {
        verify_dummy(password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredential);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredential);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn req(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_authenticate_returns_same_user() {
        let store = MemoryStore::default();
        let user = register(&store, req("alice", "Alice@Example.com ", "Wonderland1"))
            .await
            .expect("register");
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.password_hash, "Wonderland1");

        let authed = authenticate(&store, "alice@example.com", "Wonderland1")
            .await
            .expect("authenticate");
        assert_eq!(authed.id, user.id);
    }

    #[tokio::test]
    async fn reused_email_is_duplicate_and_adds_no_row() {
        let store = MemoryStore::default();
        register(&store, req("user_one", "dup@example.com", "Pass12345"))
            .await
            .expect("first");
        let err = register(&store, req("user_two", "DUP@example.com", "Pass67890"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateCredential(_)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn reused_username_is_duplicate() {
        let store = MemoryStore::default();
        register(&store, req("taken", "a@example.com", "Pass12345"))
            .await
            .expect("first");
        let err = register(&store, req("taken", "b@example.com", "Pass12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateCredential(m) if m.contains("Username")));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let store = MemoryStore::default();
        register(&store, req("bob", "bob@example.com", "Builder99"))
            .await
            .expect("register");

        let unknown = authenticate(&store, "nobody@example.com", "Builder99")
            .await
            .unwrap_err();
        let wrong = authenticate(&store, "bob@example.com", "Builder98")
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::InvalidCredential));
        assert!(matches!(wrong, AppError::InvalidCredential));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_storage() {
        let store = MemoryStore::default();
        let cases = [
            (req("ab", "ok@example.com", "Test12345"), "username"),
            (req(&"a".repeat(51), "ok@example.com", "Test12345"), "username"),
            (req("bad name", "ok@example.com", "Test12345"), "username"),
            (req("validuser", "not-an-email", "Test12345"), "email"),
            (req("validuser", "ok@example.com", "Short1"), "password"),
            (req("validuser", "ok@example.com", "NoNumbers"), "password"),
            (req("validuser", "ok@example.com", "12345678"), "password"),
        ];
        for (input, expected) in cases {
            match register(&store, input).await {
                Err(AppError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error on {expected}, got {other:?}"),
            }
        }
        assert_eq!(store.user_count().await, 0);
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
    }
}
