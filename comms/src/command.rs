use serde::{Deserialize, Serialize};

/// The local user started composing a message in a room.
/// Emitted once per idle-to-composing transition, not per keystroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingStartCommand {
    pub room_id: String,
}

/// The local user stopped composing, either explicitly or by inactivity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingStopCommand {
    pub room_id: String,
}

/// Send a chat message to a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageCommand {
    pub room_id: String,
    pub content: String,
}

/// Attach the given emoji reaction of the local user to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionCommand {
    pub room_id: String,
    pub message_id: String,
    pub emoji: String,
}

/// Detach the given emoji reaction of the local user from a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveReactionCommand {
    pub room_id: String,
    pub message_id: String,
    pub emoji: String,
}

/// A command which can be emitted to the server over the real-time channel.
/// Framed on the wire as `{ "event": <name>, "data": <payload> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    #[serde(rename = "typing:start")]
    TypingStart(TypingStartCommand),
    #[serde(rename = "typing:stop")]
    TypingStop(TypingStopCommand),
    #[serde(rename = "message:send")]
    SendMessage(SendMessageCommand),
    #[serde(rename = "reaction:add")]
    AddReaction(AddReactionCommand),
    #[serde(rename = "reaction:remove")]
    RemoveReaction(RemoveReactionCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    // given a command enum, and an expected string, asserts that the command is serialized / deserialized appropiately
    fn assert_command_serialization(command: &ClientCommand, expected: &str) {
        let serialized = serde_json::to_string(&command).unwrap();
        assert_eq!(serialized, expected);
        let deserialized: ClientCommand = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, *command);
    }

    #[test]
    fn test_typing_start_command() {
        let command = ClientCommand::TypingStart(TypingStartCommand {
            room_id: "r-1".to_string(),
        });

        assert_command_serialization(
            &command,
            r#"{"event":"typing:start","data":{"roomId":"r-1"}}"#,
        );
    }

    #[test]
    fn test_typing_stop_command() {
        let command = ClientCommand::TypingStop(TypingStopCommand {
            room_id: "r-1".to_string(),
        });

        assert_command_serialization(
            &command,
            r#"{"event":"typing:stop","data":{"roomId":"r-1"}}"#,
        );
    }

    #[test]
    fn test_send_message_command() {
        let command = ClientCommand::SendMessage(SendMessageCommand {
            room_id: "r-1".to_string(),
            content: "hello".to_string(),
        });

        assert_command_serialization(
            &command,
            r#"{"event":"message:send","data":{"roomId":"r-1","content":"hello"}}"#,
        );
    }

    #[test]
    fn test_add_reaction_command() {
        let command = ClientCommand::AddReaction(AddReactionCommand {
            room_id: "r-1".to_string(),
            message_id: "m-1".to_string(),
            emoji: "👍".to_string(),
        });

        assert_command_serialization(
            &command,
            r#"{"event":"reaction:add","data":{"roomId":"r-1","messageId":"m-1","emoji":"👍"}}"#,
        );
    }

    #[test]
    fn test_remove_reaction_command() {
        let command = ClientCommand::RemoveReaction(RemoveReactionCommand {
            room_id: "r-1".to_string(),
            message_id: "m-1".to_string(),
            emoji: "👍".to_string(),
        });

        assert_command_serialization(
            &command,
            r#"{"event":"reaction:remove","data":{"roomId":"r-1","messageId":"m-1","emoji":"👍"}}"#,
        );
    }
}
