/// Authentication primitives
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 token signing and validation
///
/// # Example
///
/// ```no_run
/// use workhub_shared::auth::password::{hash_password, verify_password};
/// use workhub_shared::auth::jwt::{create_token, Claims};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(1, "user@example.com", Duration::hours(24));
/// let token = create_token(&claims, "a-secret-that-is-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
