use serde::{Deserialize, Serialize};

use crate::types::{Message, PublicUser, RoomMember, RoomSummary};

/// Initial snapshot sent by the server right after the channel is established
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInitEvent {
    /// Fresh copy of the authenticated user
    pub user: PublicUser,
    /// All rooms the user is a member of
    pub rooms: Vec<RoomSummary>,
}

/// The set of users currently composing in a room has changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingUpdateEvent {
    pub room_id: String,
    /// Authoritative replacement for the room's composing set, local user included
    pub users: Vec<RoomMember>,
}

/// An event pushed by the server over the real-time channel.
/// Framed on the wire as `{ "event": <name>, "data": <payload> }`.
/// Events are applied in arrival order; no cross-client ordering is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "connection:init")]
    ConnectionInit(ConnectionInitEvent),
    #[serde(rename = "rooms:update")]
    RoomsUpdate(Vec<RoomSummary>),
    #[serde(rename = "message:new")]
    MessageNew(Message),
    #[serde(rename = "message:updated")]
    MessageUpdated(Message),
    #[serde(rename = "typing:update")]
    TypingUpdate(TypingUpdateEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    // given an event enum, and an expected string, asserts that the event is serialized / deserialized appropiately
    fn assert_event_serialization(event: &ServerEvent, expected: &str) {
        let serialized = serde_json::to_string(&event).unwrap();
        assert_eq!(serialized, expected);
        let deserialized: ServerEvent = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, *event);
    }

    #[test]
    fn test_rooms_update_event() {
        let event = ServerEvent::RoomsUpdate(vec![]);

        assert_event_serialization(&event, r#"{"event":"rooms:update","data":[]}"#);
    }

    #[test]
    fn test_typing_update_event() {
        let event = ServerEvent::TypingUpdate(TypingUpdateEvent {
            room_id: "r-1".to_string(),
            users: vec![],
        });

        assert_event_serialization(
            &event,
            r#"{"event":"typing:update","data":{"roomId":"r-1","users":[]}}"#,
        );
    }

    #[test]
    fn test_connection_init_event_deserialization() {
        let raw = r##"{
            "event": "connection:init",
            "data": {
                "user": {
                    "id": "u-1",
                    "email": "ayse@example.com",
                    "username": "ayse",
                    "displayColor": "#38bdf8",
                    "createdAt": "2024-05-01T12:00:00Z",
                    "updatedAt": "2024-05-01T12:00:00Z"
                },
                "rooms": [
                    { "id": "r-1", "name": "general", "isGeneral": true, "members": [] }
                ]
            }
        }"##;

        let event: ServerEvent = serde_json::from_str(raw).unwrap();

        match event {
            ServerEvent::ConnectionInit(init) => {
                assert_eq!(init.user.username, "ayse");
                assert_eq!(init.rooms.len(), 1);
                assert_eq!(init.rooms[0].name, "general");
            }
            other => panic!("expected connection:init, got {:?}", other),
        }
    }

    #[test]
    fn test_message_new_event_deserialization() {
        let raw = r##"{
            "event": "message:new",
            "data": {
                "id": "m-1",
                "roomId": "r-1",
                "content": "hello",
                "createdAt": "2024-05-01T12:30:00Z",
                "sender": { "id": "u-1", "username": "ayse", "displayColor": "#38bdf8" },
                "reactions": []
            }
        }"##;

        let event: ServerEvent = serde_json::from_str(raw).unwrap();

        match event {
            ServerEvent::MessageNew(message) => {
                assert_eq!(message.id, "m-1");
                assert_eq!(message.content, "hello");
            }
            other => panic!("expected message:new, got {:?}", other),
        }
    }
}
