use serde::{Deserialize, Serialize};

use super::enums::QueueState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub appointment_id: String,
    /// Always >= 1.
    pub position: u32,
    pub estimated_wait_minutes: u32,
    pub status: QueueState,
}
