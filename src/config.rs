use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "SaludCerca";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/SaludCerca/ on all platforms, falling back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the local storage database path
pub fn storage_path() -> PathBuf {
    app_data_dir().join("local_storage.db")
}

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "saludcerca_lib=info,warn"
}

/// Runtime tunables. Defaults match the deployed portal; tests shrink the
/// latencies to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Simulated round-trip for login and registration.
    #[serde(with = "millis")]
    pub auth_latency: Duration,
    /// Simulated round-trip for saving the profile.
    #[serde(with = "millis")]
    pub profile_save_latency: Duration,
    /// Simulated round-trip for submitting a booking.
    #[serde(with = "millis")]
    pub booking_latency: Duration,
    /// Simulated round-trip for queue check-in.
    #[serde(with = "millis")]
    pub check_in_latency: Duration,
    /// Period of the queue position update.
    #[serde(with = "millis")]
    pub queue_poll_interval: Duration,
    /// No booking may precede this date, even if "today" is earlier.
    pub booking_earliest: NaiveDate,
    /// Last bookable date.
    pub booking_latest: NaiveDate,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            auth_latency: Duration::from_millis(1000),
            profile_save_latency: Duration::from_millis(1000),
            booking_latency: Duration::from_millis(1500),
            check_in_latency: Duration::from_millis(1500),
            queue_poll_interval: Duration::from_secs(10),
            booking_earliest: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            booking_latest: NaiveDate::from_ymd_opt(2027, 12, 31).unwrap_or_default(),
        }
    }
}

impl PortalConfig {
    /// Same windows, no artificial latency.
    pub fn instant() -> Self {
        Self {
            auth_latency: Duration::ZERO,
            profile_save_latency: Duration::ZERO,
            booking_latency: Duration::ZERO,
            check_in_latency: Duration::ZERO,
            ..Self::default()
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
