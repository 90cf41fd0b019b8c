use std::sync::Arc;

use crate::domain::errors::{DomainError, RemoteError};
use crate::domain::ports::{TokenStore, UserApi};
use crate::domain::session::{Registration, Role, Session, UserProfile};

/// Session bootstrap. Tokens are issued by the identity provider; this side
/// only stores them and asks the users service who they belong to.
pub struct AuthService<U> {
    users: U,
    tokens: Arc<dyn TokenStore>,
}

impl<U: UserApi> AuthService<U> {
    pub fn new(users: U, tokens: Arc<dyn TokenStore>) -> Self {
        Self { users, tokens }
    }

    /// Creates the account. Returns a session only when the backend hands
    /// back a token along with the profile.
    pub async fn register(
        &self,
        registration: &Registration,
        confirm_password: &str,
    ) -> Result<Option<Session>, DomainError> {
        registration.validate(confirm_password)?;
        let registered = self.users.register(registration).await?;
        log::info!("Registered user {}", registered.profile.id);
        match registered.token {
            Some(token) => {
                self.tokens.set_token(&token)?;
                Ok(Some(Session::new(registered.profile)))
            }
            None => Ok(None),
        }
    }

    /// Verifies `id_token` and keeps it for later requests.
    pub async fn sign_in(&self, id_token: &str) -> Result<Session, DomainError> {
        let id_token = id_token.trim();
        if id_token.is_empty() {
            return Err(DomainError::InvalidInput("token is empty".to_string()));
        }
        let profile = self.users.verify_token(id_token).await?;
        self.tokens.set_token(id_token)?;
        log::info!("Signed in as {} ({})", profile.id, profile.role.code());
        Ok(Session::new(profile))
    }

    /// Re-verifies the stored token, if any. A rejected token yields no
    /// session.
    pub async fn restore(&self) -> Result<Option<Session>, DomainError> {
        let Some(token) = self.tokens.token()? else {
            return Ok(None);
        };
        match self.users.verify_token(&token).await {
            Ok(profile) => Ok(Some(Session::new(profile))),
            Err(RemoteError::Unauthorized) => {
                log::info!("Stored token rejected, sign-in required");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn sign_out(&self) -> Result<(), DomainError> {
        self.tokens.clear_token()
    }

    // ── Administration ───────────────────────────────────────────────────────

    pub async fn users(
        &self,
        session: &Session,
        role: Option<Role>,
    ) -> Result<Vec<UserProfile>, DomainError> {
        session.require_role(&[Role::Admin])?;
        let users = match role {
            Some(role) => self.users.users_by_role(role).await?,
            None => self.users.list_users().await?,
        };
        Ok(users)
    }

    /// A profile by id. Anyone may read their own, only admins others'.
    pub async fn user(
        &self,
        session: &Session,
        user_id: &str,
    ) -> Result<UserProfile, DomainError> {
        if user_id != session.user_id() {
            session.require_role(&[Role::Admin])?;
        }
        match self.users.get_user(user_id).await {
            Ok(profile) => Ok(profile),
            Err(e) if e.is_not_found() => Err(DomainError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn change_role(
        &self,
        session: &Session,
        user_id: &str,
        role: Role,
    ) -> Result<UserProfile, DomainError> {
        session.require_role(&[Role::Admin])?;
        Ok(self.users.update_role(user_id, role).await?)
    }

    pub async fn delete_user(&self, session: &Session, user_id: &str) -> Result<(), DomainError> {
        session.require_role(&[Role::Admin])?;
        if user_id == session.user_id() {
            return Err(DomainError::InvalidInput(
                "administrators cannot delete their own account".to_string(),
            ));
        }
        Ok(self.users.delete_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockTokenStore, MockUserApi, RegisteredUser};
    use crate::domain::session::sample_profile;

    fn registration(password: &str) -> Registration {
        Registration {
            last_name: "Mukendi".to_string(),
            first_name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            password: password.to_string(),
            role: Role::Client,
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn sign_in_stores_verified_token() {
        let mut users = MockUserApi::new();
        users
            .expect_verify_token()
            .times(1)
            .returning(|_| Ok(sample_profile("u1", Role::Vendor)));
        let mut tokens = MockTokenStore::new();
        tokens
            .expect_set_token()
            .withf(|token| token == "id-token")
            .times(1)
            .returning(|_| Ok(()));

        let auth = AuthService::new(users, Arc::new(tokens));
        let session = auth.sign_in(" id-token ").await.unwrap();

        assert_eq!(session.user_id(), "u1");
        assert_eq!(session.role(), Role::Vendor);
    }

    #[tokio::test]
    async fn failed_verification_stores_nothing() {
        let mut users = MockUserApi::new();
        users
            .expect_verify_token()
            .returning(|_| Err(RemoteError::Unauthorized));
        let mut tokens = MockTokenStore::new();
        tokens.expect_set_token().never();

        let auth = AuthService::new(users, Arc::new(tokens));
        assert!(auth.sign_in("bad").await.is_err());
    }

    #[tokio::test]
    async fn restore_without_token_is_anonymous() {
        let mut users = MockUserApi::new();
        users.expect_verify_token().never();
        let mut tokens = MockTokenStore::new();
        tokens.expect_token().returning(|| Ok(None));

        let auth = AuthService::new(users, Arc::new(tokens));
        assert!(auth.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_with_rejected_token_is_anonymous() {
        let mut users = MockUserApi::new();
        users
            .expect_verify_token()
            .returning(|_| Err(RemoteError::Unauthorized));
        let mut tokens = MockTokenStore::new();
        tokens
            .expect_token()
            .returning(|| Ok(Some("stale".to_string())));

        let auth = AuthService::new(users, Arc::new(tokens));
        assert!(auth.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn register_validates_before_calling_backend() {
        let mut users = MockUserApi::new();
        users.expect_register().never();
        let auth = AuthService::new(users, Arc::new(MockTokenStore::new()));

        assert!(auth.register(&registration("secret1"), "secret2").await.is_err());
    }

    #[tokio::test]
    async fn register_with_token_opens_session() {
        let mut users = MockUserApi::new();
        users.expect_register().times(1).returning(|_| {
            Ok(RegisteredUser {
                token: Some("fresh".to_string()),
                profile: sample_profile("new", Role::Client),
            })
        });
        let mut tokens = MockTokenStore::new();
        tokens.expect_set_token().times(1).returning(|_| Ok(()));

        let auth = AuthService::new(users, Arc::new(tokens));
        let session = auth
            .register(&registration("secret1"), "secret1")
            .await
            .unwrap()
            .expect("session");
        assert_eq!(session.user_id(), "new");
    }

    #[tokio::test]
    async fn only_admins_list_users() {
        let mut users = MockUserApi::new();
        users.expect_list_users().never();
        let auth = AuthService::new(users, Arc::new(MockTokenStore::new()));
        let session = Session::new(sample_profile("u1", Role::Client));

        assert!(auth.users(&session, None).await.is_err());
    }

    #[tokio::test]
    async fn clients_read_only_their_own_profile() {
        let mut users = MockUserApi::new();
        users
            .expect_get_user()
            .times(1)
            .withf(|id| id == "u1")
            .returning(|_| Ok(sample_profile("u1", Role::Client)));
        let auth = AuthService::new(users, Arc::new(MockTokenStore::new()));
        let session = Session::new(sample_profile("u1", Role::Client));

        assert_eq!(auth.user(&session, "u1").await.unwrap().id, "u1");
        let err = auth.user(&session, "u2").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
