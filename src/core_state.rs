//! Process-lifetime portal state.
//!
//! `PortalState` bundles the services every screen needs: storage, the
//! catalog, auth, language and theme, navigation, the signed-in patient's
//! appointment book, the virtual queue and the outbound collaborators.
//! Interior locks are `std::sync` and are never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::activity::{ActivityRecorder, Notifier, TracingActivityRecorder, TracingNotifier};
use crate::appointment::{AppointmentBook, AppointmentError, AppointmentView, TabCounts};
use crate::auth::{AuthError, AuthService, ProfileUpdate, RegisterRequest};
use crate::booking::{BookingConfirmation, BookingError, BookingWindow, BookingWizard};
use crate::catalog::{Catalog, HospitalMatch};
use crate::config::{self, PortalConfig};
use crate::db::{self, LocalStorage, MemoryStorage, SqliteStorage};
use crate::history::{HistorySummary, MedicalHistory};
use crate::home::{build_dashboard, DashboardSummary};
use crate::i18n::{interpolate, LanguageService};
use crate::models::{
    ActivityKind, Appointment, AppointmentFilter, AppointmentTab, HospitalFilter, Language,
    MedicalRecord, QueueStatus, RecordFilter, Severity, Theme, User,
};
use crate::queue::{
    self, queue_message, CheckIn, PollerHandle, QueueError, QueuePoller, RandomSource,
    ThreadRandom, VirtualQueue,
};
use crate::router::{Navigator, View};
use crate::theme::ThemeService;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Appointment(#[from] AppointmentError),
    #[error(transparent)]
    Queue(QueueError),
}

impl From<QueueError> for CoreError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::LockPoisoned => CoreError::LockPoisoned,
            other => CoreError::Queue(other),
        }
    }
}

/// Source of "today" for date windows and tab placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Everything `PortalState` needs from the outside.
pub struct PortalDeps {
    pub storage: Arc<dyn LocalStorage>,
    pub activity: Arc<dyn ActivityRecorder>,
    pub notifier: Arc<dyn Notifier>,
    pub random: Box<dyn RandomSource>,
    pub clock: Clock,
}

impl PortalDeps {
    /// Tracing collaborators, OS randomness and the system clock over the
    /// given storage.
    pub fn with_storage(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            activity: Arc::new(TracingActivityRecorder),
            notifier: Arc::new(TracingNotifier),
            random: Box::new(ThreadRandom::new()),
            clock: Clock::System,
        }
    }

    /// Nothing outlives the process.
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }
}

// ═══════════════════════════════════════════════════════════
// PortalState
// ═══════════════════════════════════════════════════════════

pub struct PortalState {
    config: PortalConfig,
    clock: Clock,
    catalog: Arc<Catalog>,
    auth: AuthService,
    language: RwLock<LanguageService>,
    theme: RwLock<ThemeService>,
    navigator: Mutex<Navigator>,
    /// Appointments of the signed-in patient. Empty while signed out.
    appointments: RwLock<AppointmentBook>,
    history: MedicalHistory,
    queue: Arc<Mutex<VirtualQueue>>,
    poller: Mutex<Option<PollerHandle>>,
    activity: Arc<dyn ActivityRecorder>,
    notifier: Arc<dyn Notifier>,
}

impl PortalState {
    /// Restore user, language and theme from storage and land on the
    /// matching view.
    pub fn new(deps: PortalDeps, config: PortalConfig) -> Result<Self, CoreError> {
        let catalog = Arc::new(Catalog::mock());
        let auth = AuthService::new(
            deps.storage.clone(),
            catalog.clone(),
            config.auth_latency,
            config.profile_save_latency,
        );
        let user = auth.restore()?;
        let signed_in = user.is_some();
        let book = match &user {
            Some(u) => AppointmentBook::for_patient(catalog.clone(), &u.id),
            None => AppointmentBook::new(catalog.clone(), Vec::new()),
        };
        let language = LanguageService::load(deps.storage.clone());
        let theme = ThemeService::load(deps.storage.clone());

        tracing::info!(
            signed_in,
            language = language.current().as_str(),
            theme = theme.current().as_str(),
            "Portal state initialized"
        );

        Ok(Self {
            history: MedicalHistory::from_catalog(&catalog),
            config,
            clock: deps.clock,
            catalog,
            auth,
            language: RwLock::new(language),
            theme: RwLock::new(theme),
            navigator: Mutex::new(Navigator::new(signed_in)),
            appointments: RwLock::new(book),
            queue: Arc::new(Mutex::new(VirtualQueue::new(deps.random))),
            poller: Mutex::new(None),
            activity: deps.activity,
            notifier: deps.notifier,
        })
    }

    /// Default on-disk storage under the app data directory.
    pub fn open_default() -> Result<Self, CoreError> {
        let storage = SqliteStorage::open(&config::storage_path())?;
        Self::new(PortalDeps::with_storage(Arc::new(storage)), PortalConfig::default())
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ── Lock helpers ────────────────────────────────────────

    fn read_language(&self) -> Result<RwLockReadGuard<'_, LanguageService>, CoreError> {
        self.language.read().map_err(|_| CoreError::LockPoisoned)
    }

    fn write_language(&self) -> Result<RwLockWriteGuard<'_, LanguageService>, CoreError> {
        self.language.write().map_err(|_| CoreError::LockPoisoned)
    }

    fn write_theme(&self) -> Result<RwLockWriteGuard<'_, ThemeService>, CoreError> {
        self.theme.write().map_err(|_| CoreError::LockPoisoned)
    }

    fn read_book(&self) -> Result<RwLockReadGuard<'_, AppointmentBook>, CoreError> {
        self.appointments.read().map_err(|_| CoreError::LockPoisoned)
    }

    fn write_book(&self) -> Result<RwLockWriteGuard<'_, AppointmentBook>, CoreError> {
        self.appointments.write().map_err(|_| CoreError::LockPoisoned)
    }

    fn lock_navigator(&self) -> Result<MutexGuard<'_, Navigator>, CoreError> {
        self.navigator.lock().map_err(|_| CoreError::LockPoisoned)
    }

    fn lock_queue(&self) -> Result<MutexGuard<'_, VirtualQueue>, CoreError> {
        self.queue.lock().map_err(|_| CoreError::LockPoisoned)
    }

    fn lock_poller(&self) -> Result<MutexGuard<'_, Option<PollerHandle>>, CoreError> {
        self.poller.lock().map_err(|_| CoreError::LockPoisoned)
    }

    fn require_user(&self) -> Result<User, CoreError> {
        self.auth.current_user().ok_or(CoreError::NotSignedIn)
    }

    /// Send a translated notification.
    fn notify(&self, key: &str, args: &[(&str, &str)], severity: Severity) -> Result<(), CoreError> {
        let message = interpolate(self.read_language()?.t(key), args);
        self.notifier.notify(&message, severity);
        Ok(())
    }

    // ── Auth ────────────────────────────────────────────────

    pub fn current_user(&self) -> Option<User> {
        self.auth.current_user()
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.is_signed_in()
    }

    fn enter_session(&self, user: &User) -> Result<(), CoreError> {
        *self.write_book()? = AppointmentBook::for_patient(self.catalog.clone(), &user.id);
        self.lock_navigator()?.reset(true);
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, CoreError> {
        match self.auth.login(email, password).await {
            Ok(user) => {
                self.enter_session(&user)?;
                self.notify("auth.welcome", &[("name", user.name.as_str())], Severity::Success)?;
                Ok(user)
            }
            Err(AuthError::InvalidCredentials) => {
                self.notify("auth.invalid_credentials", &[], Severity::Error)?;
                Err(AuthError::InvalidCredentials.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, CoreError> {
        match self.auth.register(request, self.today()).await {
            Ok(user) => {
                self.enter_session(&user)?;
                self.notify("auth.registered", &[], Severity::Success)?;
                Ok(user)
            }
            Err(AuthError::EmailTaken(email)) => {
                self.notify("auth.email_taken", &[], Severity::Error)?;
                Err(AuthError::EmailTaken(email).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User, CoreError> {
        let user = self.auth.update_profile(update, self.today()).await?;
        self.activity.record(ActivityKind::ProfileUpdated, None);
        self.notify("profile.saved", &[], Severity::Success)?;
        Ok(user)
    }

    /// Sign out: clears the stored user, the queue and the appointment book.
    pub fn logout(&self) -> Result<(), CoreError> {
        self.auth.logout()?;
        self.stop_poller()?;
        self.lock_queue()?.cancel();
        *self.write_book()? = AppointmentBook::new(self.catalog.clone(), Vec::new());
        self.lock_navigator()?.reset(false);
        self.notify("auth.logged_out", &[], Severity::Info)
    }

    // ── Language & theme ────────────────────────────────────

    pub fn language(&self) -> Result<Language, CoreError> {
        Ok(self.read_language()?.current())
    }

    pub fn set_language(&self, language: Language) -> Result<(), CoreError> {
        Ok(self.write_language()?.set_language(language)?)
    }

    pub fn toggle_language(&self) -> Result<Language, CoreError> {
        Ok(self.write_language()?.toggle()?)
    }

    pub fn t(&self, key: &str) -> Result<String, CoreError> {
        Ok(self.read_language()?.t(key).to_string())
    }

    pub fn theme(&self) -> Result<Theme, CoreError> {
        self.theme
            .read()
            .map(|t| t.current())
            .map_err(|_| CoreError::LockPoisoned)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), CoreError> {
        Ok(self.write_theme()?.set_theme(theme)?)
    }

    pub fn toggle_theme(&self) -> Result<Theme, CoreError> {
        Ok(self.write_theme()?.toggle()?)
    }

    // ── Navigation ──────────────────────────────────────────

    pub fn current_view(&self) -> Result<View, CoreError> {
        Ok(self.lock_navigator()?.current())
    }

    pub fn navigate(&self, view: View) -> Result<View, CoreError> {
        let signed_in = self.is_signed_in();
        Ok(self.lock_navigator()?.navigate(view, signed_in))
    }

    pub fn navigate_path(&self, path: &str) -> Result<View, CoreError> {
        let signed_in = self.is_signed_in();
        Ok(self.lock_navigator()?.navigate_path(path, signed_in))
    }

    pub fn back(&self) -> Result<View, CoreError> {
        let signed_in = self.is_signed_in();
        Ok(self.lock_navigator()?.back(signed_in))
    }

    // ── Booking ─────────────────────────────────────────────

    pub fn booking_window(&self) -> BookingWindow {
        BookingWindow::from_today(self.today(), &self.config)
    }

    /// Fresh wizard for the signed-in patient.
    pub fn booking_wizard(&self) -> Result<BookingWizard, CoreError> {
        let user = self.require_user()?;
        Ok(BookingWizard::new(self.catalog.clone(), self.booking_window(), user.id))
    }

    /// Submit the wizard and add the new appointment to the book. The book
    /// is only touched if the same patient is still signed in afterwards.
    pub async fn submit_booking(
        &self,
        wizard: &mut BookingWizard,
    ) -> Result<BookingConfirmation, CoreError> {
        let user = self.require_user()?;
        let confirmation = wizard
            .submit(self.config.booking_latency, self.activity.as_ref())
            .await?;
        {
            // logout clears the session before resetting the book
            let mut book = self.write_book()?;
            let still_signed_in = self
                .auth
                .current_user()
                .is_some_and(|u| u.id == user.id);
            if !still_signed_in || confirmation.appointment.patient_id != user.id {
                tracing::warn!(
                    appointment_id = %confirmation.appointment.id,
                    "Booking dropped: session changed while submitting"
                );
                return Err(CoreError::NotSignedIn);
            }
            book.add(confirmation.appointment.clone());
        }
        self.notify("booking.confirmed", &[], Severity::Success)?;
        Ok(confirmation)
    }

    // ── My appointments ─────────────────────────────────────

    pub fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentView>, CoreError> {
        Ok(self.read_book()?.list(filter, self.today()))
    }

    pub fn appointment_counts(&self) -> Result<TabCounts, CoreError> {
        Ok(self.read_book()?.counts(self.today()))
    }

    /// Cancelling the appointment currently in the queue also leaves the queue.
    pub fn cancel_appointment(&self, id: &str) -> Result<Appointment, CoreError> {
        let cancelled = self.write_book()?.cancel(id, self.activity.as_ref())?;
        let queued = self.lock_queue()?.active_appointment() == Some(id);
        if queued {
            self.cancel_check_in()?;
        }
        self.notify("appointments.cancelled_ok", &[], Severity::Success)?;
        Ok(cancelled)
    }

    pub fn reschedule_appointment(
        &self,
        id: &str,
        date: NaiveDate,
        time: &str,
    ) -> Result<Appointment, CoreError> {
        let window = self.booking_window();
        let moved = self
            .write_book()?
            .reschedule(id, date, time, &window, self.activity.as_ref())?;
        self.notify("appointments.rescheduled_ok", &[], Severity::Success)?;
        Ok(moved)
    }

    // ── History & directory ─────────────────────────────────

    /// Summary for the history screen; records a `history_viewed` activity.
    pub fn open_history(&self) -> Result<HistorySummary, CoreError> {
        self.require_user()?;
        Ok(self.history.open(self.activity.as_ref()))
    }

    pub fn search_history(&self, filter: &RecordFilter) -> Result<Vec<MedicalRecord>, CoreError> {
        self.require_user()?;
        Ok(self.history.search(filter).into_iter().cloned().collect())
    }

    pub fn search_hospitals(&self, filter: &HospitalFilter) -> Vec<HospitalMatch> {
        self.catalog.search_hospitals(filter)
    }

    // ── Virtual queue ───────────────────────────────────────

    /// Check in for an upcoming appointment and start the position poller.
    pub async fn check_in(&self, appointment_id: &str) -> Result<QueueStatus, CoreError> {
        self.require_user()?;
        {
            let book = self.read_book()?;
            let appointment = book
                .get(appointment_id)
                .ok_or_else(|| AppointmentError::NotFound(appointment_id.to_string()))?;
            if crate::appointment::tab_for(appointment, self.today()) != AppointmentTab::Upcoming {
                return Err(AppointmentError::InvalidTransition {
                    id: appointment_id.to_string(),
                    status: appointment.status,
                }
                .into());
            }
        }

        let status = queue::check_in(
            &self.queue,
            appointment_id,
            self.config.check_in_latency,
            self.activity.as_ref(),
        )
        .await?;

        let handle = QueuePoller::new(self.queue.clone(), self.config.queue_poll_interval).spawn();
        if let Some(mut previous) = self.lock_poller()?.replace(handle) {
            previous.stop();
        }
        let message = self.queue_message()?;
        self.notifier.notify(&message, Severity::Info);
        Ok(status)
    }

    pub fn queue_state(&self) -> Result<CheckIn, CoreError> {
        Ok(self.lock_queue()?.state().clone())
    }

    pub fn queue_message(&self) -> Result<String, CoreError> {
        let language = self.language()?;
        Ok(queue_message(self.lock_queue()?.state(), language))
    }

    /// One manual simulation step, independent of the poller.
    pub fn tick_queue(&self) -> Result<Option<QueueStatus>, CoreError> {
        Ok(self.lock_queue()?.tick())
    }

    pub fn admit_from_queue(&self) -> Result<QueueStatus, CoreError> {
        Ok(self.lock_queue()?.admit()?)
    }

    pub fn is_polling(&self) -> Result<bool, CoreError> {
        Ok(self
            .lock_poller()?
            .as_ref()
            .is_some_and(|h| h.is_running()))
    }

    fn stop_poller(&self) -> Result<(), CoreError> {
        if let Some(mut handle) = self.lock_poller()?.take() {
            handle.stop();
        }
        Ok(())
    }

    /// Leave the queue. Returns whether a check-in was discarded.
    pub fn cancel_check_in(&self) -> Result<bool, CoreError> {
        self.stop_poller()?;
        Ok(self.lock_queue()?.cancel())
    }

    // ── Dashboard ───────────────────────────────────────────

    pub fn dashboard(&self) -> Result<DashboardSummary, CoreError> {
        let user = self.require_user()?;
        let queue = self.lock_queue()?.status().cloned();
        let language = self.language()?;
        let book = self.read_book()?;
        Ok(build_dashboard(&user, &book, &self.history, queue, language, self.today()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{MemoryActivityRecorder, MemoryNotifier};
    use crate::db::{get_json, USER_KEY};
    use crate::models::{AppointmentStatus, QueueState};
    use crate::queue::SequenceRandom;

    struct Harness {
        state: PortalState,
        storage: Arc<dyn LocalStorage>,
        activity: Arc<MemoryActivityRecorder>,
        notifier: Arc<MemoryNotifier>,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn harness_with(storage: Arc<dyn LocalStorage>, random: Vec<u32>) -> Harness {
        harness_config(storage, random, PortalConfig::instant())
    }

    fn harness_config(storage: Arc<dyn LocalStorage>, random: Vec<u32>, config: PortalConfig) -> Harness {
        let activity = Arc::new(MemoryActivityRecorder::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let deps = PortalDeps {
            storage: storage.clone(),
            activity: activity.clone(),
            notifier: notifier.clone(),
            random: Box::new(SequenceRandom::new(random)),
            clock: Clock::Fixed(today()),
        };
        Harness {
            state: PortalState::new(deps, config).unwrap(),
            storage,
            activity,
            notifier,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(MemoryStorage::new()), vec![])
    }

    async fn signed_in(h: &Harness) {
        h.state
            .login("maria.gonzalez@email.com", "123456")
            .await
            .unwrap();
    }

    #[test]
    fn fresh_state_lands_on_login() {
        let h = harness();
        assert!(!h.state.is_signed_in());
        assert_eq!(h.state.current_view().unwrap(), View::Login);
        assert_eq!(h.state.navigate(View::MyAppointments).unwrap(), View::Login);
        assert_eq!(h.state.language().unwrap(), Language::Es);
        assert_eq!(h.state.theme().unwrap(), Theme::Light);
        assert_eq!(h.state.t("app.title").unwrap(), "SaludCerca");
        assert!(matches!(h.state.booking_wizard(), Err(CoreError::NotSignedIn)));
        assert!(matches!(h.state.dashboard(), Err(CoreError::NotSignedIn)));
    }

    #[tokio::test]
    async fn wrong_password_notifies_error() {
        let h = harness();
        let err = h
            .state
            .login("maria.gonzalez@email.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Auth(AuthError::InvalidCredentials)));
        let last = h.notifier.last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(last.message, "Correo o contraseña incorrectos");
        assert_eq!(h.state.current_view().unwrap(), View::Login);
    }

    #[tokio::test]
    async fn login_loads_book_and_dashboard() {
        let h = harness();
        signed_in(&h).await;

        assert_eq!(h.state.current_view().unwrap(), View::Dashboard);
        assert_eq!(h.notifier.last().unwrap().message, "Bienvenido(a), María José González");
        assert_eq!(
            h.state.appointment_counts().unwrap(),
            TabCounts { upcoming: 3, past: 2, cancelled: 1 }
        );
        let dashboard = h.state.dashboard().unwrap();
        assert_eq!(dashboard.greeting, "Hola, María");
        assert_eq!(dashboard.next_appointment.unwrap().appointment.id, "a-001");
    }

    #[tokio::test]
    async fn session_and_preferences_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.db");
        {
            let storage: Arc<dyn LocalStorage> = Arc::new(SqliteStorage::open(&path).unwrap());
            let h = harness_with(storage, vec![]);
            signed_in(&h).await;
            h.state.set_language(Language::En).unwrap();
            h.state.toggle_theme().unwrap();
        }

        let storage: Arc<dyn LocalStorage> = Arc::new(SqliteStorage::open(&path).unwrap());
        let h = harness_with(storage, vec![]);
        assert!(h.state.is_signed_in());
        assert_eq!(h.state.current_view().unwrap(), View::Dashboard);
        assert_eq!(h.state.language().unwrap(), Language::En);
        assert_eq!(h.state.theme().unwrap(), Theme::Dark);
        assert_eq!(h.state.t("app.title").unwrap(), "HealthNear");
        assert_eq!(h.state.appointment_counts().unwrap().upcoming, 3);
    }

    #[tokio::test]
    async fn booking_flow_adds_upcoming_appointment() {
        let h = harness();
        signed_in(&h).await;

        let mut wizard = h.state.booking_wizard().unwrap();
        wizard.select_department("Managua").unwrap();
        wizard.select_specialty("Pediatría").unwrap();
        wizard.select_hospital("h-006").unwrap();
        wizard.next().unwrap();
        wizard.select_doctor("d-010").unwrap();
        wizard.next().unwrap();
        wizard.select_date(NaiveDate::from_ymd_opt(2026, 10, 30).unwrap()).unwrap();
        wizard.select_time("08:00").unwrap();

        let confirmation = h.state.submit_booking(&mut wizard).await.unwrap();
        assert_eq!(confirmation.doctor_name, "Dra. Isabel Morales");
        assert_eq!(h.activity.count(ActivityKind::AppointmentBooked), 1);
        assert_eq!(h.notifier.last().unwrap().message, "¡Cita solicitada con éxito!");

        let upcoming = h
            .state
            .list_appointments(&AppointmentFilter::default())
            .unwrap();
        assert_eq!(upcoming.len(), 4);
        assert!(upcoming
            .iter()
            .any(|v| v.appointment.id == confirmation.appointment.id));
        assert_eq!(h.state.dashboard().unwrap().next_appointment.unwrap().appointment.id, confirmation.appointment.id);
    }

    #[tokio::test]
    async fn cancel_confirmed_moves_to_cancelled_tab() {
        let h = harness();
        signed_in(&h).await;
        let cancelled = h.state.cancel_appointment("a-001").unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelada);

        let upcoming = h.state.list_appointments(&AppointmentFilter::default()).unwrap();
        assert!(upcoming.iter().all(|v| v.appointment.id != "a-001"));
        assert_eq!(h.state.appointment_counts().unwrap().cancelled, 2);
        assert_eq!(h.activity.count(ActivityKind::AppointmentCancelled), 1);
    }

    #[tokio::test]
    async fn check_in_starts_and_cancel_stops_poller() {
        let h = harness_with(Arc::new(MemoryStorage::new()), vec![5, 30, 1, 4]);
        signed_in(&h).await;

        let status = h.state.check_in("a-001").await.unwrap();
        assert_eq!((status.position, status.estimated_wait_minutes), (5, 30));
        assert_eq!(status.status, QueueState::Waiting);
        assert!(h.state.is_polling().unwrap());
        assert_eq!(h.activity.count(ActivityKind::QueueCheckedIn), 1);
        assert_eq!(
            h.notifier.last().unwrap().message,
            "Su posición en la fila es 5. Espera estimada: 30 min"
        );

        let err = h.state.check_in("a-002").await.unwrap_err();
        assert!(matches!(err, CoreError::Queue(QueueError::AlreadyCheckedIn(_))));

        let ticked = h.state.tick_queue().unwrap().unwrap();
        assert_eq!((ticked.position, ticked.estimated_wait_minutes), (4, 26));

        assert!(h.state.cancel_check_in().unwrap());
        assert!(!h.state.is_polling().unwrap());
        assert_eq!(h.state.queue_state().unwrap(), CheckIn::NotCheckedIn);
    }

    #[tokio::test]
    async fn cancelling_the_queued_appointment_leaves_the_queue() {
        let h = harness_with(Arc::new(MemoryStorage::new()), vec![5, 30]);
        signed_in(&h).await;
        h.state.check_in("a-001").await.unwrap();

        h.state.cancel_appointment("a-002").unwrap();
        assert!(h.state.is_polling().unwrap());

        h.state.cancel_appointment("a-001").unwrap();
        assert!(!h.state.is_polling().unwrap());
        assert_eq!(h.state.queue_state().unwrap(), CheckIn::NotCheckedIn);
    }

    #[tokio::test]
    async fn logout_during_booking_submit_keeps_book_empty() {
        let config = PortalConfig {
            booking_latency: std::time::Duration::from_millis(100),
            ..PortalConfig::instant()
        };
        let h = harness_config(Arc::new(MemoryStorage::new()), vec![], config);
        signed_in(&h).await;

        let mut wizard = h.state.booking_wizard().unwrap();
        wizard.select_department("Managua").unwrap();
        wizard.select_specialty("Pediatría").unwrap();
        wizard.select_hospital("h-006").unwrap();
        wizard.next().unwrap();
        wizard.select_doctor("d-010").unwrap();
        wizard.next().unwrap();
        wizard.select_date(NaiveDate::from_ymd_opt(2026, 10, 30).unwrap()).unwrap();
        wizard.select_time("08:00").unwrap();

        let (submitted, logged_out) = tokio::join!(h.state.submit_booking(&mut wizard), async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            h.state.logout()
        });
        logged_out.unwrap();
        assert!(matches!(submitted, Err(CoreError::NotSignedIn)));
        assert_eq!(h.state.appointment_counts().unwrap(), TabCounts::default());

        signed_in(&h).await;
        assert_eq!(h.state.appointment_counts().unwrap().upcoming, 3);
    }

    #[tokio::test]
    async fn logout_during_profile_save_stays_signed_out() {
        let config = PortalConfig {
            profile_save_latency: std::time::Duration::from_millis(100),
            ..PortalConfig::instant()
        };
        let h = harness_config(Arc::new(MemoryStorage::new()), vec![], config);
        signed_in(&h).await;
        let user = h.state.current_user().unwrap();
        let update = ProfileUpdate {
            name: user.name.clone(),
            phone: user.phone.clone(),
            email: user.email.clone(),
            birth_date: user.birth_date.format("%Y-%m-%d").to_string(),
            municipality: "Granada".into(),
            allergies: vec![],
            medical_history: vec![],
        };

        let (saved, logged_out) = tokio::join!(h.state.update_profile(update), async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            h.state.logout()
        });
        logged_out.unwrap();
        assert!(matches!(saved, Err(CoreError::Auth(AuthError::NotSignedIn))));
        assert!(!h.state.is_signed_in());
        assert_eq!(h.state.current_view().unwrap(), View::Login);
        assert_eq!(h.activity.count(ActivityKind::ProfileUpdated), 0);
        let stored: Option<User> = get_json(h.storage.as_ref(), USER_KEY).unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn check_in_requires_upcoming_appointment() {
        let h = harness();
        signed_in(&h).await;
        assert!(matches!(
            h.state.check_in("a-006").await,
            Err(CoreError::Appointment(AppointmentError::InvalidTransition { .. }))
        ));
        assert!(matches!(
            h.state.check_in("a-404").await,
            Err(CoreError::Appointment(AppointmentError::NotFound(_)))
        ));
        assert_eq!(h.state.queue_state().unwrap(), CheckIn::NotCheckedIn);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let h = harness_with(Arc::new(MemoryStorage::new()), vec![5, 30]);
        signed_in(&h).await;
        h.state.check_in("a-001").await.unwrap();

        h.state.logout().unwrap();
        assert!(!h.state.is_signed_in());
        assert_eq!(h.state.current_view().unwrap(), View::Login);
        assert_eq!(h.state.queue_state().unwrap(), CheckIn::NotCheckedIn);
        assert!(!h.state.is_polling().unwrap());
        assert_eq!(h.state.appointment_counts().unwrap(), TabCounts::default());
        let stored: Option<User> = get_json(h.storage.as_ref(), USER_KEY).unwrap();
        assert!(stored.is_none());
        assert_eq!(h.notifier.last().unwrap().message, "Sesión cerrada");
    }

    #[tokio::test]
    async fn history_open_records_activity() {
        let h = harness();
        signed_in(&h).await;
        let summary = h.state.open_history().unwrap();
        assert_eq!(summary.total, 6);
        assert_eq!(h.activity.count(ActivityKind::HistoryViewed), 1);
        let exams = h
            .state
            .search_history(&RecordFilter {
                record_type: Some(crate::models::RecordType::Exam),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(exams.len(), 1);
    }

    #[tokio::test]
    async fn profile_update_records_activity() {
        let h = harness();
        signed_in(&h).await;
        let user = h.state.current_user().unwrap();
        let update = ProfileUpdate {
            name: user.name.clone(),
            phone: "8888 1111".into(),
            email: user.email.clone(),
            birth_date: user.birth_date.format("%Y-%m-%d").to_string(),
            municipality: "Managua".into(),
            allergies: vec!["Penicilina".into()],
            medical_history: vec![],
        };
        let saved = h.state.update_profile(update).await.unwrap();
        assert_eq!(saved.phone, "+505 8888 1111");
        assert_eq!(saved.allergies.len(), 1);
        assert_eq!(h.activity.count(ActivityKind::ProfileUpdated), 1);
        assert_eq!(h.notifier.last().unwrap().message, "Perfil actualizado");
    }

    #[tokio::test]
    async fn register_taken_email_notifies_error() {
        let h = harness();
        let request = RegisterRequest {
            name: "Ana Rivera".into(),
            cedula: "001-250595-0003A".into(),
            phone: "5777 1234".into(),
            email: "MARIA.GONZALEZ@email.com".into(),
            birth_date: "1995-05-25".into(),
            municipality: "Managua".into(),
            password: "secreto".into(),
            confirm_password: "secreto".into(),
        };
        let err = h.state.register(request.clone()).await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(AuthError::EmailTaken(_))));
        assert_eq!(h.notifier.last().unwrap().severity, Severity::Error);

        let user = h
            .state
            .register(RegisterRequest {
                email: "ana.rivera@email.com".into(),
                ..request
            })
            .await
            .unwrap();
        assert_eq!(h.state.current_view().unwrap(), View::Dashboard);
        assert_eq!(h.state.appointment_counts().unwrap(), TabCounts::default());
        assert_eq!(h.state.current_user().unwrap().id, user.id);
    }

    #[test]
    fn in_memory_deps_build_a_signed_out_state() {
        let state = PortalState::new(PortalDeps::in_memory(), PortalConfig::instant()).unwrap();
        assert!(state.current_user().is_none());
        assert_eq!(state.navigate_path("/perfil").unwrap(), View::Login);
        assert_eq!(state.toggle_language().unwrap(), Language::En);
        assert_eq!(state.queue_message().unwrap(), "You have not checked in yet");
    }

    #[test]
    fn hospital_search_ranks_by_distance() {
        let h = harness();
        let results = h.state.search_hospitals(&HospitalFilter {
            specialty: Some("Cardiología".into()),
            near: Some(crate::models::Coordinates { lat: 12.4350, lng: -86.8790 }),
            ..Default::default()
        });
        assert_eq!(results[0].hospital.id, "h-009");
        assert!(results.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }
}
