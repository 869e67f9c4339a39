use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user as exposed by the API to other users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Hex color the user picked for their name, e.g. "#38bdf8"
    pub display_color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user as listed in a room's member list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMember {
    pub id: String,
    pub username: String,
    pub display_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_access_history: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
}

/// The requesting user's own membership metadata for a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub can_access_history: bool,
    pub joined_at: DateTime<Utc>,
}

/// A named conversation scope with a member list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub is_general: bool,
    pub members: Vec<RoomMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership: Option<Membership>,
}

/// The author of a message or a reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub id: String,
    pub username: String,
    pub display_color: String,
}

/// A (user, emoji) tag attached to a message, unique per pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: String,
    pub emoji: String,
    pub user: Sender,
}

/// A message as stored per room, append-only except for reaction updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sender: Sender,
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// Whether the given user has already reacted to this message with the given emoji
    pub fn has_reaction(&self, user_id: &str, emoji: &str) -> bool {
        self.reactions
            .iter()
            .any(|reaction| reaction.emoji == emoji && reaction.user.id == user_id)
    }
}

/// Proof of authentication plus the cached identity of the current user.
/// Returned by login/registration and persisted locally across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserialization() {
        let raw = r##"{
            "id": "m-1",
            "roomId": "r-1",
            "content": "hello",
            "createdAt": "2024-05-01T12:30:00Z",
            "sender": { "id": "u-1", "username": "ayse", "displayColor": "#38bdf8" },
            "reactions": [
                {
                    "id": "re-1",
                    "emoji": "👍",
                    "user": { "id": "u-2", "username": "mehmet", "displayColor": "#f87171" }
                }
            ]
        }"##;

        let message: Message = serde_json::from_str(raw).unwrap();

        assert_eq!(message.id, "m-1");
        assert_eq!(message.room_id, "r-1");
        assert_eq!(message.sender.username, "ayse");
        assert!(message.has_reaction("u-2", "👍"));
        assert!(!message.has_reaction("u-1", "👍"));
        assert!(!message.has_reaction("u-2", "🔥"));
    }

    #[test]
    fn test_room_summary_without_membership() {
        let raw = r#"{
            "id": "r-1",
            "name": "general",
            "isGeneral": true,
            "members": []
        }"#;

        let room: RoomSummary = serde_json::from_str(raw).unwrap();

        assert!(room.is_general);
        assert!(room.membership.is_none());
        assert!(room.members.is_empty());
    }
}
