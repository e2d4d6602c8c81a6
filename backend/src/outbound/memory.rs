//! In-memory identity backend and guest directory.
//!
//! Used by the server when no backend URL is configured and by the
//! integration tests. Mirrors the observable behaviour of the hosted
//! backend: sign-up creates the profile row, one-time codes are single-use
//! and only issued to existing accounts, and every data call is authorised
//! by the session token. Refresh tokens are single-use and rotate on every
//! renewal.
//!
//! There is no mailbox: an issued one-time code is written to the
//! `wedding_rsvp::dev_mailbox` log target at debug level, and tests read it
//! through [`InMemoryBackend::issued_code`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{
    GuestDirectory, GuestDirectoryError, IdentityBackend, IdentityBackendError, SignUpOutcome,
};
use crate::domain::{
    AccessToken, AuthSession, DisplayName, Email, GuestProfile, Identity, LoginCredentials,
    OneTimeCode, PasswordChange, RefreshToken, Registration, RsvpUpdate, UserId,
};

const TOKEN_LEN: usize = 40;

fn random_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

struct Account {
    id: UserId,
    password: Zeroizing<String>,
    display_name: DisplayName,
}

#[derive(Default)]
struct Store {
    accounts: HashMap<Email, Account>,
    profiles: HashMap<UserId, GuestProfile>,
    pending_codes: HashMap<Email, Zeroizing<String>>,
    tokens: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, UserId>,
}

impl Store {
    fn open_session(&mut self, email: &Email) -> Option<AuthSession> {
        let account = self.accounts.get(email)?;
        let token = random_token();
        let refresh = random_token();
        self.tokens.insert(token.clone(), account.id.clone());
        self.refresh_tokens.insert(refresh.clone(), account.id.clone());
        let identity = Identity::new(
            account.id.clone(),
            email.clone(),
            Some(account.display_name.clone()),
        );
        Some(
            AuthSession::new(identity, AccessToken::new(token))
                .with_refresh(Some(RefreshToken::new(refresh)), None),
        )
    }

    fn email_of(&self, id: &UserId) -> Option<Email> {
        self.accounts
            .iter()
            .find(|(_, account)| &account.id == id)
            .map(|(email, _)| email.clone())
    }

    fn owner_of(&self, session: &AuthSession) -> Option<&UserId> {
        self.tokens
            .get(session.access_token().expose())
            .filter(|id| *id == session.identity().id())
    }
}

/// Process-local stand-in for the hosted backend.
#[derive(Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    /// Empty backend with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, String> {
        self.store
            .lock()
            .map_err(|_| "in-memory store poisoned".to_owned())
    }

    /// The code currently awaiting verification for `email`, if any.
    ///
    /// Takes the place of reading the guest's mailbox.
    pub fn issued_code(&self, email: &str) -> Option<String> {
        let email = Email::new(email).ok()?;
        let store = self.lock().ok()?;
        store
            .pending_codes
            .get(&email)
            .map(|code| code.as_str().to_owned())
    }

    /// Invalidate every access token while keeping refresh tokens, as if all
    /// sessions had outlived their token lifetime.
    pub fn expire_access_tokens(&self) {
        if let Ok(mut store) = self.lock() {
            store.tokens.clear();
        }
    }

    /// Invalidate every access and refresh token.
    pub fn revoke_all_sessions(&self) {
        if let Ok(mut store) = self.lock() {
            store.tokens.clear();
            store.refresh_tokens.clear();
        }
    }
}

#[async_trait]
impl IdentityBackend for InMemoryBackend {
    async fn create_account(
        &self,
        registration: &Registration,
    ) -> Result<SignUpOutcome, IdentityBackendError> {
        let mut store = self.lock().map_err(IdentityBackendError::transport)?;
        let email = registration.credentials().email();
        if store.accounts.contains_key(email) {
            return Ok(SignUpOutcome::AlreadyRegistered);
        }
        let id = UserId::random();
        store.accounts.insert(
            email.clone(),
            Account {
                id: id.clone(),
                password: Zeroizing::new(registration.credentials().password().to_owned()),
                display_name: registration.display_name().clone(),
            },
        );
        let mut profile = GuestProfile::empty(id.clone());
        profile.full_name = Some(registration.display_name().to_string());
        store.profiles.insert(id, profile);
        Ok(SignUpOutcome::Created)
    }

    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthSession, IdentityBackendError> {
        let mut store = self.lock().map_err(IdentityBackendError::transport)?;
        let matches = store
            .accounts
            .get(credentials.email())
            .is_some_and(|account| account.password.as_str() == credentials.password());
        if !matches {
            return Err(IdentityBackendError::invalid_credentials(
                "Invalid login credentials",
            ));
        }
        store
            .open_session(credentials.email())
            .ok_or_else(|| IdentityBackendError::invalid_credentials("Invalid login credentials"))
    }

    async fn request_one_time_code(&self, email: &Email) -> Result<(), IdentityBackendError> {
        let mut store = self.lock().map_err(IdentityBackendError::transport)?;
        if !store.accounts.contains_key(email) {
            return Err(IdentityBackendError::rejected("Signups not allowed for otp"));
        }
        let code = format!("{:06}", thread_rng().gen_range(0..1_000_000));
        debug!(
            target: "wedding_rsvp::dev_mailbox",
            %email,
            %code,
            "one-time code issued by development backend"
        );
        store.pending_codes.insert(email.clone(), Zeroizing::new(code));
        Ok(())
    }

    async fn verify_one_time_code(
        &self,
        email: &Email,
        code: &OneTimeCode,
    ) -> Result<AuthSession, IdentityBackendError> {
        let mut store = self.lock().map_err(IdentityBackendError::transport)?;
        let valid = store
            .pending_codes
            .get(email)
            .is_some_and(|pending| pending.as_str() == code.as_str());
        if !valid {
            return Err(IdentityBackendError::invalid_code(
                "Token has expired or is invalid",
            ));
        }
        store.pending_codes.remove(email);
        store
            .open_session(email)
            .ok_or_else(|| IdentityBackendError::invalid_code("Token has expired or is invalid"))
    }

    async fn change_password(
        &self,
        session: &AuthSession,
        change: &PasswordChange,
    ) -> Result<(), IdentityBackendError> {
        let mut store = self.lock().map_err(IdentityBackendError::transport)?;
        if store.owner_of(session).is_none() {
            return Err(IdentityBackendError::unauthorized("invalid JWT"));
        }
        let account = store
            .accounts
            .get_mut(session.identity().email())
            .ok_or_else(|| IdentityBackendError::unauthorized("User not found"))?;
        account.password = Zeroizing::new(change.new_password().to_owned());
        Ok(())
    }

    async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AuthSession, IdentityBackendError> {
        let mut store = self.lock().map_err(IdentityBackendError::transport)?;
        let id = store
            .refresh_tokens
            .remove(refresh_token.expose())
            .ok_or_else(|| IdentityBackendError::unauthorized("Invalid Refresh Token"))?;
        store
            .email_of(&id)
            .and_then(|email| store.open_session(&email))
            .ok_or_else(|| IdentityBackendError::unauthorized("User not found"))
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), IdentityBackendError> {
        let mut store = self.lock().map_err(IdentityBackendError::transport)?;
        store.tokens.remove(session.access_token().expose());
        if let Some(refresh) = session.refresh_token() {
            store.refresh_tokens.remove(refresh.expose());
        }
        Ok(())
    }
}

#[async_trait]
impl GuestDirectory for InMemoryBackend {
    async fn fetch_own_profile(
        &self,
        session: &AuthSession,
    ) -> Result<Option<GuestProfile>, GuestDirectoryError> {
        let store = self.lock().map_err(GuestDirectoryError::transport)?;
        let id = store
            .owner_of(session)
            .ok_or_else(|| GuestDirectoryError::unauthorized("JWT expired"))?;
        Ok(store.profiles.get(id).cloned())
    }

    async fn update_own_profile(
        &self,
        session: &AuthSession,
        update: &RsvpUpdate,
    ) -> Result<(), GuestDirectoryError> {
        let mut store = self.lock().map_err(GuestDirectoryError::transport)?;
        let id = store
            .owner_of(session)
            .cloned()
            .ok_or_else(|| GuestDirectoryError::unauthorized("JWT expired"))?;
        // Like a filtered PATCH, a missing row is not an error.
        if let Some(profile) = store.profiles.get_mut(&id) {
            profile.attendance_status = update.attendance_status;
            profile.food_preference.clone_from(&update.food_preference);
        }
        Ok(())
    }
}
