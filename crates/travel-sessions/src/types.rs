use serde::{Deserialize, Serialize};
use travel_core::types::now_unix;

/// Logical conversation (§3 Data Model, `Session`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub profile_id: String,
    pub city_name: Option<String>,
    pub status: SessionStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: i64,
}

impl Session {
    /// Create a brand-new active session with a default expiry window.
    pub fn new(session_id: String, user_id: String, profile_id: String, city_name: Option<String>, ttl_secs: i64) -> Self {
        let now = now_unix();
        Self {
            session_id,
            user_id,
            profile_id,
            city_name,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Expired,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Expired => "expired",
            SessionStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "expired" => SessionStatus::Expired,
            "closed" => SessionStatus::Closed,
            _ => SessionStatus::Active,
        }
    }
}

/// One turn in a session (§3 Data Model, `Message`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub session_id: String,
    pub role: MessageRole,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            "system" => Some(MessageRole::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    InitialRequest,
    ModificationRequest,
    Response,
    Clarification,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::InitialRequest => "initial_request",
            MessageType::ModificationRequest => "modification_request",
            MessageType::Response => "response",
            MessageType::Clarification => "clarification",
            MessageType::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initial_request" => Some(MessageType::InitialRequest),
            "modification_request" => Some(MessageType::ModificationRequest),
            "response" => Some(MessageType::Response),
            "clarification" => Some(MessageType::Clarification),
            "error" => Some(MessageType::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_interaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_poi_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classified_request_type: Option<String>,
}

/// Mutable per-session working set (§3 Data Model, `SessionContext`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_id: Option<String>,
    #[serde(default)]
    pub user_preferences: serde_json::Value,
    #[serde(default)]
    pub active_interests: Vec<String>,
    #[serde(default)]
    pub active_tags: Vec<String>,
    #[serde(default)]
    pub rolling_summary: String,
    #[serde(default)]
    pub modification_history: Vec<ModificationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub timestamp: i64,
    pub applied: bool,
}
