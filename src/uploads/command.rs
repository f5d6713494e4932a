//! Commands accepted by the uploads channel.
//!
//! Each command serializes to a JSON object whose `type` field names the
//! operation, followed by only the fields that operation needs:
//!
//! ```text
//! {"type":"retrieve","instance_id":"42"}
//! {"type":"update","instance_id":"42","data":{"title":"scan"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form payload for `create` and `update`.
pub type CommandData = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UploadCommand {
    Subscribe,
    List,
    Retrieve { instance_id: String },
    Delete { instance_id: String },
    Create { data: CommandData },
    Update {
        instance_id: String,
        data: CommandData,
    },
    Question {
        instance_id: String,
        question: String,
    },
}

impl UploadCommand {
    #[must_use]
    pub fn subscribe() -> Self {
        Self::Subscribe
    }

    #[must_use]
    pub fn list() -> Self {
        Self::List
    }

    pub fn retrieve(instance_id: impl Into<String>) -> Self {
        Self::Retrieve {
            instance_id: instance_id.into(),
        }
    }

    pub fn update(instance_id: impl Into<String>, data: CommandData) -> Self {
        Self::Update {
            instance_id: instance_id.into(),
            data,
        }
    }

    pub fn delete(instance_id: impl Into<String>) -> Self {
        Self::Delete {
            instance_id: instance_id.into(),
        }
    }

    #[must_use]
    pub fn create(data: CommandData) -> Self {
        Self::Create { data }
    }

    /// Ask a question about an upload's extracted text.
    pub fn question(instance_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self::Question {
            instance_id: instance_id.into(),
            question: question.into(),
        }
    }

    /// The wire `type` discriminator.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::List => "list",
            Self::Retrieve { .. } => "retrieve",
            Self::Delete { .. } => "delete",
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Question { .. } => "question",
        }
    }

    /// Serialize to the JSON text sent over the socket.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if a payload value cannot be encoded.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
