pub mod appointment;
pub mod enums;
pub mod filters;
pub mod hospital;
pub mod medical_record;
pub mod queue;
pub mod user;

pub use appointment::Appointment;
pub use enums::*;
pub use filters::*;
pub use hospital::{Coordinates, Doctor, Hospital};
pub use medical_record::{AttachedDocument, ExamEntry, MedicalRecord, MedicationEntry};
pub use queue::QueueStatus;
pub use user::User;
