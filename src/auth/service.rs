use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::claims::{Claims, SessionToken, TokenSettings};
use super::error::{AuthError, AuthResult};
use super::identity::{Identity, NewIdentity};
use super::password;
use super::role::{Role, RoleSet};
use crate::database::{DatabaseError, IdentityStore};

/// Self-registration input; the role is already parsed
#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub role: Role,
}

/// Issues and verifies session tokens and checks credentials.
///
/// Stateless apart from the signing settings; every lookup goes to the
/// identity store, so a deleted identity or a changed password takes effect
/// on the next request.
pub struct CredentialService {
    store: Arc<dyn IdentityStore>,
    tokens: TokenSettings,
}

/// Pure role check: `Ok` iff the identity's role is in `allowed`
pub fn authorize(identity: &Identity, allowed: RoleSet) -> AuthResult<()> {
    if allowed.contains(identity.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(identity.role.to_string()))
    }
}

impl CredentialService {
    pub fn new(store: Arc<dyn IdentityStore>, tokens: TokenSettings) -> Self {
        Self { store, tokens }
    }

    /// Sign a token for the identity. No side effects.
    pub fn issue_token(&self, identity: &Identity) -> AuthResult<SessionToken> {
        let claims = Claims::new(identity.id, Utc::now(), self.tokens.lifetime());
        let value = self.tokens.generate_jwt(&claims)?;

        Ok(SessionToken {
            value,
            subject: identity.id,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        })
    }

    /// Check an email/password pair within the partition implied by the claimed role.
    ///
    /// Unknown email and wrong password produce the same error.
    #[instrument(skip(self, password), fields(role = %claimed_role))]
    pub async fn authenticate(&self, email: &str, password: &str, claimed_role: Role) -> AuthResult<Identity> {
        let category = claimed_role.category();

        let Some(identity) = self.store.find_by_email(category, email.trim()).await? else {
            password::verify_dummy(password).await?;
            debug!("login rejected: no such identity");
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password(password, &identity.password_hash).await? {
            debug!(id = %identity.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        info!(id = %identity.id, role = %identity.role, "login succeeded");
        Ok(identity)
    }

    /// Verify a presented token and load the identity it names
    pub async fn resolve_session(&self, token: Option<&str>) -> AuthResult<Identity> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::unauthenticated("no session token"))?;

        let claims = self.tokens.validate_jwt(token)?;

        let identity = self
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AuthError::unauthenticated("identity no longer exists"))?;

        if identity.changed_password_after(claims.iat_us) {
            warn!(id = %identity.id, "stale session: password changed after token was issued");
            return Err(AuthError::unauthenticated("password changed, sign in again"));
        }

        Ok(identity)
    }

    /// Self-registration from the public signup form
    pub async fn register(&self, signup: Signup) -> AuthResult<Identity> {
        if !signup.role.self_registrable() {
            return Err(AuthError::validation(format!("{} accounts cannot be self-registered", signup.role)));
        }
        self.provision(signup).await
    }

    /// Create an identity of any role. Operator path, used for Admin accounts.
    #[instrument(skip(self, signup), fields(email = %signup.email, role = %signup.role))]
    pub async fn provision(&self, signup: Signup) -> AuthResult<Identity> {
        let name = signup.name.trim();
        if name.is_empty() {
            return Err(AuthError::validation("Name is required"));
        }
        let email = signup.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::validation("A valid email is required"));
        }
        password::validate_password(&signup.password, &signup.password_confirm)?;

        if self.store.find_by_email(signup.role.category(), &email).await?.is_some() {
            return Err(AuthError::Conflict(email));
        }

        let password_hash = password::hash_password(&signup.password).await?;
        let identity = self
            .store
            .insert_identity(NewIdentity { name: name.to_string(), email: email.clone(), password_hash, role: signup.role })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent signup
                DatabaseError::Conflict(_) => AuthError::Conflict(email),
                other => AuthError::Database(other),
            })?;

        info!(id = %identity.id, "identity registered");
        Ok(identity)
    }

    /// Replace the password. Every token issued before this call becomes stale.
    #[instrument(skip_all, fields(id = %identity.id))]
    pub async fn change_password(
        &self,
        identity: &Identity,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> AuthResult<Identity> {
        if !password::verify_password(current, &identity.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }
        password::validate_password(new, confirm)?;

        let password_hash = password::hash_password(new).await?;
        let updated = self
            .store
            .update_password(identity.id, &password_hash, Utc::now())
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound(what) => AuthError::NotFound(what),
                other => AuthError::Database(other),
            })?;

        info!("password changed");
        Ok(updated)
    }
}
