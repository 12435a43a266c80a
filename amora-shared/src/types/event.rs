use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ event envelope wrapping all domain events.
///
/// Routing key format: `amora.{domain}.{entity}.{action}`
/// Example: `amora.profile.block.created`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub profile_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            profile_id: None,
            data,
        }
    }

    pub fn with_profile(mut self, profile_id: Uuid) -> Self {
        self.profile_id = Some(profile_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    pub const PROFILE_CREATED: &str = "amora.profile.profile.created";
    pub const PROFILE_DELETED: &str = "amora.profile.profile.deleted";
    pub const PROFILE_SUSPENDED: &str = "amora.profile.profile.suspended";
    pub const LIKE_SENT: &str = "amora.profile.like.sent";
    pub const BLOCK_CREATED: &str = "amora.profile.block.created";
    pub const COMPLAINT_FILED: &str = "amora.profile.complaint.filed";
}

/// Event data payloads
pub mod payloads {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ProfileCreated {
        pub profile_id: Uuid,
        pub credential_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ProfileDeleted {
        pub profile_id: Uuid,
    }

    /// Emitted when complaint volume flips a profile's global block flag.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ProfileSuspended {
        pub profile_id: Uuid,
        pub complaints_this_month: i64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LikeSent {
        pub like_id: Uuid,
        pub liker_id: Uuid,
        pub liked_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BlockCreated {
        pub blocker_id: Uuid,
        pub blocked_id: Uuid,
        pub mutual: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ComplaintFiled {
        pub complaint_id: Uuid,
        pub complaining_id: Uuid,
        pub accused_id: Uuid,
        pub created_at: DateTime<Utc>,
    }
}
