use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Programada => "PROGRAMADA",
    Confirmada => "CONFIRMADA",
    EnCurso => "EN_CURSO",
    Completada => "COMPLETADA",
    Cancelada => "CANCELADA",
    Reagendada => "REAGENDADA",
});

impl AppointmentStatus {
    /// Parses either the canonical tag or one of the older four-value tags
    /// (PENDING, CONFIRMED, CANCELLED, COMPLETED).
    pub fn from_any(s: &str) -> Result<Self, DatabaseError> {
        match s {
            "PENDING" => Ok(Self::Programada),
            "CONFIRMED" => Ok(Self::Confirmada),
            "CANCELLED" => Ok(Self::Cancelada),
            "COMPLETED" => Ok(Self::Completada),
            other => other.parse(),
        }
    }

    /// Still on the calendar: can be cancelled, rescheduled or attended.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Programada | Self::Confirmada | Self::Reagendada)
    }
}

str_enum!(QueueState {
    Waiting => "WAITING",
    Called => "CALLED",
    InConsultation => "IN_CONSULTATION",
});

str_enum!(HospitalTier {
    Public => "public",
    Private => "private",
    SemiPrivate => "semi_private",
});

str_enum!(RecordType {
    Consultation => "consultation",
    Exam => "exam",
    Procedure => "procedure",
    Vaccine => "vaccine",
    Emergency => "emergency",
});

str_enum!(RecordStatus {
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(ExamStatus {
    Normal => "normal",
    Abnormal => "abnormal",
    Pending => "pending",
});

str_enum!(Language {
    Es => "es",
    En => "en",
});

impl Default for Language {
    fn default() -> Self {
        Self::Es
    }
}

str_enum!(Theme {
    Light => "light",
    Dark => "dark",
});

impl Default for Theme {
    fn default() -> Self {
        Self::Light
    }
}

str_enum!(Severity {
    Success => "success",
    Error => "error",
    Info => "info",
});

str_enum!(ActivityKind {
    AppointmentBooked => "appointment_booked",
    AppointmentCancelled => "appointment_cancelled",
    AppointmentRescheduled => "appointment_rescheduled",
    HistoryViewed => "history_viewed",
    QueueCheckedIn => "queue_checked_in",
    ProfileUpdated => "profile_updated",
});
