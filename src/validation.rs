//! Field validators and input formatters for patient-entered data.
//!
//! Nicaraguan formats: phone numbers are 8 digits behind the `+505`
//! country code and start with 2 (landline), 5, 7 or 8 (mobile); the
//! cédula is `DDD-DDDDDD-DDDDL` where the middle block is the holder's
//! birth date as DDMMYY.
//!
//! Validators never fail: they return a [`FieldCheck`] carrying a Spanish
//! message, and forms aggregate them into [`FormErrors`] to gate submission.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

static CEDULA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-(\d{2})(\d{2})(\d{2})-\d{4}[A-Z]$").unwrap());

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-zÁÉÍÓÚáéíóúÑñÜü ]+$").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const PHONE_DIGITS: usize = 8;
const PHONE_PREFIXES: &[char] = &['2', '5', '7', '8'];
const COUNTRY_CODE: &str = "505";
const CEDULA_DIGITS: usize = 13;
const MAX_AGE_YEARS: i32 = 120;
const MIN_AGE_YEARS: i32 = 1;
const MIN_NAME_CHARS: usize = 2;
const MIN_PASSWORD_CHARS: usize = 6;

/// Outcome of validating one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub valid: bool,
    pub message: Option<String>,
}

impl FieldCheck {
    pub fn ok() -> Self {
        Self { valid: true, message: None }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

// ═══════════════════════════════════════════
// Validators
// ═══════════════════════════════════════════

/// Digits of a phone number with separators and a leading country code removed.
///
/// An explicit `+505` is always the country code, so partial input in the
/// formatter's own `+505 XXXX` shape reads back as the subscriber digits.
/// Without the `+`, a leading 505 counts only when more than 8 digits follow.
fn national_phone_digits(input: &str) -> String {
    let input = input.trim_start();
    if let Some(rest) = input.strip_prefix('+').and_then(|r| r.strip_prefix(COUNTRY_CODE)) {
        return rest.chars().filter(char::is_ascii_digit).collect();
    }
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    match digits.strip_prefix(COUNTRY_CODE) {
        Some(rest) if digits.len() > PHONE_DIGITS => rest.to_string(),
        _ => digits,
    }
}

pub fn validate_phone(input: &str) -> FieldCheck {
    if input.trim().is_empty() {
        return FieldCheck::fail("El teléfono es requerido");
    }
    if input
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')' | '+')))
    {
        return FieldCheck::fail("El teléfono solo puede contener números");
    }
    let digits = national_phone_digits(input);
    if digits.len() != PHONE_DIGITS {
        return FieldCheck::fail("El teléfono debe tener 8 dígitos");
    }
    if !digits.starts_with(PHONE_PREFIXES) {
        return FieldCheck::fail("El teléfono debe comenzar con 2, 5, 7 u 8");
    }
    FieldCheck::ok()
}

pub fn validate_cedula(input: &str) -> FieldCheck {
    if input.trim().is_empty() {
        return FieldCheck::fail("La cédula es requerida");
    }
    let Some(caps) = CEDULA_PATTERN.captures(input) else {
        return FieldCheck::fail("Formato de cédula inválido (ej: 001-120890-0001C)");
    };
    let day: u32 = caps[1].parse().unwrap_or(0);
    let month: u32 = caps[2].parse().unwrap_or(0);
    if !(1..=31).contains(&day) {
        return FieldCheck::fail("El día de nacimiento en la cédula no es válido");
    }
    if !(1..=12).contains(&month) {
        return FieldCheck::fail("El mes de nacimiento en la cédula no es válido");
    }
    FieldCheck::ok()
}

/// Validates a `YYYY-MM-DD` birth date against the local calendar date.
pub fn validate_birth_date(input: &str) -> FieldCheck {
    validate_birth_date_on(input, Local::now().date_naive())
}

pub fn validate_birth_date_on(input: &str, today: NaiveDate) -> FieldCheck {
    if input.trim().is_empty() {
        return FieldCheck::fail("La fecha de nacimiento es requerida");
    }
    let Ok(birth) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") else {
        return FieldCheck::fail("Fecha de nacimiento inválida");
    };
    if birth > today {
        return FieldCheck::fail("La fecha de nacimiento no puede ser futura");
    }
    let age = age_in_years(birth, today);
    if age > MAX_AGE_YEARS {
        return FieldCheck::fail("La edad no puede ser mayor a 120 años");
    }
    if age < MIN_AGE_YEARS {
        return FieldCheck::fail("Debe tener al menos 1 año de edad");
    }
    FieldCheck::ok()
}

/// Completed years between `birth` and `today`.
pub fn age_in_years(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub fn validate_name(input: &str) -> FieldCheck {
    if input.trim().is_empty() {
        return FieldCheck::fail("El nombre es requerido");
    }
    if input.chars().count() < MIN_NAME_CHARS {
        return FieldCheck::fail("El nombre debe tener al menos 2 caracteres");
    }
    if !NAME_PATTERN.is_match(input) {
        return FieldCheck::fail("El nombre solo puede contener letras y espacios");
    }
    if input != input.trim() || input.contains("  ") {
        return FieldCheck::fail("El nombre no puede tener espacios al inicio, al final o dobles");
    }
    FieldCheck::ok()
}

pub fn validate_email(input: &str) -> FieldCheck {
    if input.trim().is_empty() {
        return FieldCheck::fail("El correo electrónico es requerido");
    }
    if !EMAIL_PATTERN.is_match(input.trim()) {
        return FieldCheck::fail("Correo electrónico inválido");
    }
    FieldCheck::ok()
}

pub fn validate_password(input: &str) -> FieldCheck {
    if input.is_empty() {
        return FieldCheck::fail("La contraseña es requerida");
    }
    if input.chars().count() < MIN_PASSWORD_CHARS {
        return FieldCheck::fail("La contraseña debe tener al menos 6 caracteres");
    }
    FieldCheck::ok()
}

// ═══════════════════════════════════════════
// Formatters
// ═══════════════════════════════════════════

/// Reflows typed input into `+505 XXXX XXXX`. Extra digits are dropped.
pub fn format_phone_number(raw: &str) -> String {
    let mut digits = national_phone_digits(raw);
    digits.truncate(PHONE_DIGITS);
    if digits.is_empty() {
        return String::new();
    }
    if digits.len() <= 4 {
        format!("+{COUNTRY_CODE} {digits}")
    } else {
        format!("+{COUNTRY_CODE} {} {}", &digits[..4], &digits[4..])
    }
}

/// Reflows typed input into `XXX-XXXXXX-XXXXL`: 13 digits then one
/// uppercase letter. Characters that do not fit the next position are
/// skipped, and anything past the letter is dropped.
pub fn format_cedula(raw: &str) -> String {
    let mut kept = String::with_capacity(CEDULA_DIGITS + 1);
    let mut digit_count = 0;
    for c in raw.chars() {
        if digit_count < CEDULA_DIGITS {
            if c.is_ascii_digit() {
                kept.push(c);
                digit_count += 1;
            }
        } else if c.is_ascii_alphabetic() {
            kept.push(c.to_ascii_uppercase());
            break;
        }
    }

    let mut out = String::with_capacity(CEDULA_DIGITS + 3);
    for (i, c) in kept.chars().enumerate() {
        if i == 3 || i == 9 {
            out.push('-');
        }
        out.push(c);
    }
    out
}

// ═══════════════════════════════════════════
// Form aggregation
// ═══════════════════════════════════════════

/// Per-field results for a whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors {
    pub fields: BTreeMap<String, FieldCheck>,
}

impl FormErrors {
    pub fn check(&mut self, field: &str, result: FieldCheck) {
        self.fields.insert(field.to_string(), result);
    }

    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|c| c.valid)
    }

    /// Names of failing fields, in field-name order.
    pub fn invalid_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, c)| !c.valid)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|c| c.message.as_deref())
    }
}
