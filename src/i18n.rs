//! UI language and translation table.
//!
//! Spanish is the default. The chosen tag is persisted under
//! `LANGUAGE_KEY`; an unknown stored tag falls back to Spanish.
//! Lookups of unknown keys return the key itself so missing strings are
//! visible on screen instead of blank.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::db::{DatabaseError, LocalStorage, LANGUAGE_KEY};
use crate::models::{AppointmentStatus, Language, QueueState, RecordType};

/// (key, es, en)
const TRANSLATIONS: &[(&str, &str, &str)] = &[
    ("app.title", "SaludCerca", "HealthNear"),
    ("app.tagline", "Tu salud, más cerca de ti", "Your health, closer to you"),
    // Navigation
    ("nav.dashboard", "Inicio", "Home"),
    ("nav.book", "Solicitar cita", "Book appointment"),
    ("nav.appointments", "Mis citas", "My appointments"),
    ("nav.queue", "Cola virtual", "Virtual queue"),
    ("nav.history", "Historial médico", "Medical history"),
    ("nav.hospitals", "Hospitales", "Hospitals"),
    ("nav.profile", "Mi perfil", "My profile"),
    ("nav.logout", "Cerrar sesión", "Sign out"),
    // Auth
    ("auth.login", "Iniciar sesión", "Sign in"),
    ("auth.register", "Crear cuenta", "Create account"),
    ("auth.email", "Correo electrónico", "Email"),
    ("auth.password", "Contraseña", "Password"),
    ("auth.welcome", "Bienvenido(a), {name}", "Welcome, {name}"),
    ("auth.invalid_credentials", "Correo o contraseña incorrectos", "Incorrect email or password"),
    ("auth.email_taken", "Ya existe una cuenta con ese correo", "An account with that email already exists"),
    ("auth.registered", "Cuenta creada con éxito", "Account created successfully"),
    ("auth.logged_out", "Sesión cerrada", "Signed out"),
    // Profile
    ("profile.saved", "Perfil actualizado", "Profile updated"),
    ("profile.name", "Nombre completo", "Full name"),
    ("profile.cedula", "Cédula", "National ID"),
    ("profile.phone", "Teléfono", "Phone"),
    ("profile.birth_date", "Fecha de nacimiento", "Date of birth"),
    ("profile.municipality", "Municipio", "Municipality"),
    ("profile.allergies", "Alergias", "Allergies"),
    // Booking wizard
    ("booking.step1", "Departamento, especialidad y hospital", "Department, specialty and hospital"),
    ("booking.step2", "Seleccione un médico", "Choose a doctor"),
    ("booking.step3", "Fecha, hora y motivo", "Date, time and reason"),
    ("booking.department", "Departamento", "Department"),
    ("booking.specialty", "Especialidad", "Specialty"),
    ("booking.hospital", "Hospital", "Hospital"),
    ("booking.doctor", "Médico", "Doctor"),
    ("booking.date", "Fecha", "Date"),
    ("booking.time", "Hora", "Time"),
    ("booking.reason", "Motivo de la consulta", "Reason for visit"),
    ("booking.unavailable", "Próximamente", "Coming soon"),
    ("booking.next", "Siguiente", "Next"),
    ("booking.back", "Atrás", "Back"),
    ("booking.submit", "Confirmar cita", "Confirm appointment"),
    ("booking.confirmed", "¡Cita solicitada con éxito!", "Appointment requested successfully!"),
    ("booking.no_hospitals", "No hay hospitales disponibles", "No hospitals available"),
    ("booking.no_doctors", "No hay médicos disponibles", "No doctors available"),
    // Queue
    ("queue.check_in", "Hacer check-in", "Check in"),
    ("queue.cancel", "Cancelar check-in", "Cancel check-in"),
    ("queue.not_checked_in", "Aún no ha hecho check-in", "You have not checked in yet"),
    ("queue.checking_in", "Registrando su llegada...", "Checking you in..."),
    ("queue.waiting", "Su posición en la fila es {position}. Espera estimada: {minutes} min", "Your position in line is {position}. Estimated wait: {minutes} min"),
    ("queue.called", "¡Es su turno! Diríjase al consultorio", "It's your turn! Please go to the consultation room"),
    ("queue.in_consultation", "En consulta", "In consultation"),
    // Appointment statuses
    ("status.PROGRAMADA", "Programada", "Scheduled"),
    ("status.CONFIRMADA", "Confirmada", "Confirmed"),
    ("status.EN_CURSO", "En curso", "In progress"),
    ("status.COMPLETADA", "Completada", "Completed"),
    ("status.CANCELADA", "Cancelada", "Cancelled"),
    ("status.REAGENDADA", "Reagendada", "Rescheduled"),
    // Appointment screen
    ("appointments.upcoming", "Próximas", "Upcoming"),
    ("appointments.past", "Pasadas", "Past"),
    ("appointments.cancelled", "Canceladas", "Cancelled"),
    ("appointments.cancel", "Cancelar cita", "Cancel appointment"),
    ("appointments.reschedule", "Reagendar", "Reschedule"),
    ("appointments.cancelled_ok", "Cita cancelada", "Appointment cancelled"),
    ("appointments.rescheduled_ok", "Cita reagendada", "Appointment rescheduled"),
    ("appointments.empty", "No tiene citas en esta sección", "No appointments in this section"),
    // History
    ("history.consultation", "Consulta", "Consultation"),
    ("history.exam", "Examen", "Exam"),
    ("history.procedure", "Procedimiento", "Procedure"),
    ("history.vaccine", "Vacuna", "Vaccine"),
    ("history.emergency", "Emergencia", "Emergency"),
    ("history.search", "Buscar en su historial", "Search your history"),
    ("history.empty", "No se encontraron registros", "No records found"),
    // Dashboard
    ("dashboard.greeting", "Hola, {name}", "Hello, {name}"),
    ("dashboard.next_appointment", "Próxima cita", "Next appointment"),
    ("dashboard.no_appointments", "No tiene citas próximas", "You have no upcoming appointments"),
    ("dashboard.recent_records", "Registros recientes", "Recent records"),
    // Theme
    ("theme.light", "Tema claro", "Light theme"),
    ("theme.dark", "Tema oscuro", "Dark theme"),
    // Language
    ("language.es", "Español", "Spanish"),
    ("language.en", "Inglés", "English"),
];

static TABLE: LazyLock<HashMap<&'static str, (&'static str, &'static str)>> =
    LazyLock::new(|| {
        TRANSLATIONS
            .iter()
            .map(|(key, es, en)| (*key, (*es, *en)))
            .collect()
    });

/// Translation for `key`, if the table has one.
pub fn translate(language: Language, key: &str) -> Option<&'static str> {
    TABLE.get(key).map(|(es, en)| match language {
        Language::Es => *es,
        Language::En => *en,
    })
}

/// Replaces each `{name}` placeholder with its value.
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}

pub fn status_key(status: AppointmentStatus) -> String {
    format!("status.{}", status.as_str())
}

pub fn record_type_key(record_type: RecordType) -> String {
    format!("history.{}", record_type.as_str())
}

pub fn queue_state_key(state: QueueState) -> &'static str {
    match state {
        QueueState::Waiting => "queue.waiting",
        QueueState::Called => "queue.called",
        QueueState::InConsultation => "queue.in_consultation",
    }
}

// ═══════════════════════════════════════════
// LanguageService
// ═══════════════════════════════════════════

pub struct LanguageService {
    storage: Arc<dyn LocalStorage>,
    current: Language,
}

impl LanguageService {
    /// Restores the stored language, defaulting to Spanish.
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let current = match storage.get_item(LANGUAGE_KEY) {
            Ok(Some(tag)) => tag.parse().unwrap_or_else(|_| {
                tracing::warn!(tag = %tag, "Unknown stored language, using default");
                Language::default()
            }),
            Ok(None) => Language::default(),
            Err(e) => {
                tracing::warn!("Failed to read language preference: {e}");
                Language::default()
            }
        };
        Self { storage, current }
    }

    pub fn current(&self) -> Language {
        self.current
    }

    pub fn set_language(&mut self, language: Language) -> Result<(), DatabaseError> {
        self.storage.set_item(LANGUAGE_KEY, language.as_str())?;
        self.current = language;
        tracing::debug!(language = language.as_str(), "Language changed");
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<Language, DatabaseError> {
        let next = match self.current {
            Language::Es => Language::En,
            Language::En => Language::Es,
        };
        self.set_language(next)?;
        Ok(next)
    }

    /// Translation in the current language, or `key` when missing.
    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        translate(self.current, key).unwrap_or(key)
    }

    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(self.t(key), args)
    }

    pub fn status_label(&self, status: AppointmentStatus) -> String {
        let key = status_key(status);
        self.t(&key).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;

    fn service() -> (Arc<MemoryStorage>, LanguageService) {
        let storage = Arc::new(MemoryStorage::new());
        let svc = LanguageService::load(storage.clone());
        (storage, svc)
    }

    #[test]
    fn app_title_in_both_languages() {
        let (_, mut svc) = service();
        assert_eq!(svc.current(), Language::Es);
        assert_eq!(svc.t("app.title"), "SaludCerca");
        svc.set_language(Language::En).unwrap();
        assert_eq!(svc.t("app.title"), "HealthNear");
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        let (_, svc) = service();
        assert_eq!(svc.t("nope.missing"), "nope.missing");
    }

    #[test]
    fn language_persists_across_loads() {
        let (storage, mut svc) = service();
        svc.toggle().unwrap();
        assert_eq!(storage.get_item(LANGUAGE_KEY).unwrap().as_deref(), Some("en"));
        let reloaded = LanguageService::load(storage);
        assert_eq!(reloaded.current(), Language::En);
    }

    #[test]
    fn unknown_stored_tag_defaults_to_spanish() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(LANGUAGE_KEY, "fr").unwrap();
        let svc = LanguageService::load(storage);
        assert_eq!(svc.current(), Language::Es);
    }

    #[test]
    fn interpolation_fills_placeholders() {
        let (_, svc) = service();
        let msg = svc.t_with("queue.waiting", &[("position", "4"), ("minutes", "25")]);
        assert_eq!(msg, "Su posición en la fila es 4. Espera estimada: 25 min");
    }

    #[test]
    fn every_status_and_record_type_is_translated() {
        for status in AppointmentStatus::all() {
            assert!(translate(Language::En, &status_key(*status)).is_some(), "{status}");
        }
        for record_type in RecordType::all() {
            assert!(translate(Language::Es, &record_type_key(*record_type)).is_some(), "{record_type}");
        }
    }

    #[test]
    fn keys_are_unique() {
        assert_eq!(TABLE.len(), TRANSLATIONS.len());
    }

    #[test]
    fn status_label_follows_language() {
        let (_, mut svc) = service();
        assert_eq!(svc.status_label(AppointmentStatus::Cancelada), "Cancelada");
        svc.set_language(Language::En).unwrap();
        assert_eq!(svc.status_label(AppointmentStatus::Cancelada), "Cancelled");
    }
}
