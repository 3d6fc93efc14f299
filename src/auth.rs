//! Sign-in state for the portal.
//!
//! Credentials are checked against the demo accounts in the catalog plus
//! any accounts registered during this process. The signed-in user is
//! persisted as JSON under `USER_KEY` so a restart restores the session;
//! logout removes it. Every "network" call waits a fixed simulated latency
//! and then always completes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{Catalog, DemoAccount};
use crate::db::{get_json, set_json, DatabaseError, LocalStorage, USER_KEY};
use crate::models::User;
use crate::validation::{
    format_cedula, format_phone_number, validate_birth_date_on, validate_cedula, validate_email,
    validate_name, validate_password, validate_phone, FieldCheck, FormErrors,
};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {0}")]
    EmailTaken(String),

    #[error("Form has invalid fields: {}", .0.invalid_fields().join(", "))]
    Validation(FormErrors),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Another sign-in or sign-out finished first")]
    SessionChanged,

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Internal lock error")]
    LockPoisoned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub cedula: String,
    pub phone: String,
    pub email: String,
    pub birth_date: String, // YYYY-MM-DD
    pub municipality: String,
    pub password: String,
    pub confirm_password: String,
}

/// Editable profile fields. The cédula is fixed after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub birth_date: String, // YYYY-MM-DD
    pub municipality: String,
    pub allergies: Vec<String>,
    pub medical_history: Vec<String>,
}

pub fn validate_registration(request: &RegisterRequest, today: NaiveDate) -> FormErrors {
    let mut form = FormErrors::default();
    form.check("name", validate_name(&request.name));
    form.check("cedula", validate_cedula(&request.cedula));
    form.check("phone", validate_phone(&request.phone));
    form.check("email", validate_email(&request.email));
    form.check("birth_date", validate_birth_date_on(&request.birth_date, today));
    form.check("municipality", required(&request.municipality, "El municipio es requerido"));
    form.check("password", validate_password(&request.password));
    form.check(
        "confirm_password",
        if request.password == request.confirm_password {
            FieldCheck::ok()
        } else {
            FieldCheck::fail("Las contraseñas no coinciden")
        },
    );
    form
}

pub fn validate_profile_update(update: &ProfileUpdate, today: NaiveDate) -> FormErrors {
    let mut form = FormErrors::default();
    form.check("name", validate_name(&update.name));
    form.check("phone", validate_phone(&update.phone));
    form.check("email", validate_email(&update.email));
    form.check("birth_date", validate_birth_date_on(&update.birth_date, today));
    form.check("municipality", required(&update.municipality, "El municipio es requerido"));
    form
}

fn required(value: &str, message: &str) -> FieldCheck {
    if value.trim().is_empty() {
        FieldCheck::fail(message)
    } else {
        FieldCheck::ok()
    }
}

fn parse_birth_date(raw: &str) -> Result<NaiveDate, AuthError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        let mut form = FormErrors::default();
        form.check("birth_date", FieldCheck::fail("Fecha de nacimiento inválida"));
        AuthError::Validation(form)
    })
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ═══════════════════════════════════════════════════════════
// AuthService
// ═══════════════════════════════════════════════════════════

pub struct AuthService {
    storage: Arc<dyn LocalStorage>,
    catalog: Arc<Catalog>,
    latency: Duration,
    save_latency: Duration,
    current: RwLock<Option<User>>,
    /// Bumped on every sign-in, profile save and logout, always under the
    /// `current` write lock.
    generation: AtomicU64,
    /// Accounts registered or edited during this process. An entry shadows
    /// the catalog account of the same user.
    registered: RwLock<Vec<DemoAccount>>,
}

impl AuthService {
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        catalog: Arc<Catalog>,
        latency: Duration,
        save_latency: Duration,
    ) -> Self {
        Self {
            storage,
            catalog,
            latency,
            save_latency,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            registered: RwLock::new(Vec::new()),
        }
    }

    /// Restore the persisted user, if any. A corrupt record is discarded.
    pub fn restore(&self) -> Result<Option<User>, AuthError> {
        let user: Option<User> = match get_json(self.storage.as_ref(), USER_KEY) {
            Ok(user) => user,
            Err(DatabaseError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable stored user: {e}");
                self.storage.remove_item(USER_KEY)?;
                None
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(ref u) = user {
            tracing::info!(user_id = %u.id, "Session restored");
        }
        let mut session = self.lock_session()?;
        *session = user.clone();
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(user)
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.read().ok().and_then(|u| u.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.read().map(|u| u.is_some()).unwrap_or(false)
    }

    fn lock_session(&self) -> Result<RwLockWriteGuard<'_, Option<User>>, AuthError> {
        self.current.write().map_err(|_| AuthError::LockPoisoned)
    }

    fn lock_accounts(&self) -> Result<RwLockWriteGuard<'_, Vec<DemoAccount>>, AuthError> {
        self.registered.write().map_err(|_| AuthError::LockPoisoned)
    }

    /// Signed-in user and session generation, read together.
    fn snapshot(&self) -> Result<(u64, Option<User>), AuthError> {
        let current = self.current.read().map_err(|_| AuthError::LockPoisoned)?;
        Ok((self.generation.load(Ordering::SeqCst), current.clone()))
    }

    fn find_credentials(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let registered = self.registered.read().map_err(|_| AuthError::LockPoisoned)?;
        if let Some(account) = registered
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email.trim()))
        {
            return Ok((account.password == password).then(|| account.user.clone()));
        }
        Ok(self
            .catalog
            .find_account(email)
            .filter(|a| !registered.iter().any(|r| r.user.id == a.user.id))
            .filter(|a| a.password == password)
            .map(|a| a.user.clone()))
    }

    /// Id of the user who owns `email`, if anyone does.
    fn email_owner(&self, accounts: &[DemoAccount], email: &str) -> Option<String> {
        let email = email.trim();
        if let Some(account) = accounts.iter().find(|a| a.email.eq_ignore_ascii_case(email)) {
            return Some(account.user.id.clone());
        }
        self.catalog
            .find_account(email)
            .filter(|a| !accounts.iter().any(|r| r.user.id == a.user.id))
            .map(|a| a.user.id.clone())
    }

    fn email_taken_by_other(&self, email: &str, user_id: Option<&str>) -> Result<bool, AuthError> {
        let registered = self.registered.read().map_err(|_| AuthError::LockPoisoned)?;
        Ok(self
            .email_owner(&registered, email)
            .is_some_and(|owner| Some(owner.as_str()) != user_id))
    }

    /// Persist `user` as the session. Callers hold the `current` write lock.
    fn store_session(&self, session: &mut Option<User>, user: User) -> Result<User, AuthError> {
        set_json(self.storage.as_ref(), USER_KEY, &user)?;
        *session = Some(user.clone());
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(user)
    }

    /// Fails with `SessionChanged` if another login or logout completed
    /// while this one was waiting.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let (generation, _) = self.snapshot()?;
        tokio::time::sleep(self.latency).await;
        let Some(user) = self.find_credentials(email, password)? else {
            tracing::info!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let mut session = self.lock_session()?;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::warn!(user_id = %user.id, "Login superseded by a concurrent session change");
            return Err(AuthError::SessionChanged);
        }
        tracing::info!(user_id = %user.id, "Login succeeded");
        self.store_session(&mut session, user)
    }

    /// Validates every field first; an invalid form returns without waiting.
    /// The email is checked again when the account is stored, so concurrent
    /// registrations of one address leave a single account.
    pub async fn register(
        &self,
        request: RegisterRequest,
        today: NaiveDate,
    ) -> Result<User, AuthError> {
        let form = validate_registration(&request, today);
        if !form.is_valid() {
            return Err(AuthError::Validation(form));
        }
        if self.email_taken_by_other(&request.email, None)? {
            return Err(AuthError::EmailTaken(request.email.trim().to_string()));
        }
        let birth_date = parse_birth_date(&request.birth_date)?;
        let (generation, _) = self.snapshot()?;

        tokio::time::sleep(self.latency).await;

        let email = request.email.trim().to_string();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            cedula: format_cedula(&request.cedula),
            phone: format_phone_number(&request.phone),
            email: email.clone(),
            birth_date,
            municipality: request.municipality.trim().to_string(),
            allergies: Vec::new(),
            medical_history: Vec::new(),
        };

        let mut session = self.lock_session()?;
        {
            let mut accounts = self.lock_accounts()?;
            if self.email_owner(&accounts, &email).is_some() {
                return Err(AuthError::EmailTaken(email));
            }
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::warn!("Registration superseded by a concurrent session change");
                return Err(AuthError::SessionChanged);
            }
            accounts.push(DemoAccount {
                email,
                password: request.password,
                user: user.clone(),
            });
        }
        tracing::info!(user_id = %user.id, "Account registered");
        self.store_session(&mut session, user)
    }

    /// Saves only if the same user is still signed in after the wait; a
    /// logout in between wins and nothing is written.
    pub async fn update_profile(
        &self,
        update: ProfileUpdate,
        today: NaiveDate,
    ) -> Result<User, AuthError> {
        let (_, Some(mut user)) = self.snapshot()? else {
            return Err(AuthError::NotSignedIn);
        };
        let form = validate_profile_update(&update, today);
        if !form.is_valid() {
            return Err(AuthError::Validation(form));
        }
        if self.email_taken_by_other(&update.email, Some(user.id.as_str()))? {
            return Err(AuthError::EmailTaken(update.email.trim().to_string()));
        }
        let birth_date = parse_birth_date(&update.birth_date)?;

        tokio::time::sleep(self.save_latency).await;

        user.name = update.name;
        user.phone = format_phone_number(&update.phone);
        user.email = update.email.trim().to_string();
        user.birth_date = birth_date;
        user.municipality = update.municipality.trim().to_string();
        user.allergies = clean_list(&update.allergies);
        user.medical_history = clean_list(&update.medical_history);

        let mut session = self.lock_session()?;
        if session.as_ref().map(|u| u.id.as_str()) != Some(user.id.as_str()) {
            tracing::warn!(user_id = %user.id, "Profile save dropped: user signed out");
            return Err(AuthError::NotSignedIn);
        }
        {
            let mut accounts = self.lock_accounts()?;
            if self
                .email_owner(&accounts, &user.email)
                .is_some_and(|owner| owner != user.id)
            {
                return Err(AuthError::EmailTaken(user.email));
            }
            match accounts.iter_mut().find(|a| a.user.id == user.id) {
                Some(account) => {
                    account.email = user.email.clone();
                    account.user = user.clone();
                }
                // A restored session whose account did not survive the
                // restart has no password to carry over
                None => {
                    if let Some(demo) = self.catalog.account_for_user(&user.id) {
                        accounts.push(DemoAccount {
                            email: user.email.clone(),
                            password: demo.password.clone(),
                            user: user.clone(),
                        });
                    }
                }
            }
        }
        tracing::info!(user_id = %user.id, "Profile updated");
        self.store_session(&mut session, user)
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        let mut session = self.lock_session()?;
        self.storage.remove_item(USER_KEY)?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(u) = session.take() {
            tracing::info!(user_id = %u.id, "Logged out");
        }
        Ok(())
    }
}
