#[derive(Debug, Clone)]
pub enum Action {
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        password: String,
    },
    Logout,
    SelectRoom {
        room_id: String,
    },
    /// The composer content changed; feeds the typing tracker
    ComposerChanged {
        content: String,
    },
    SendMessage {
        content: String,
    },
    /// Add or remove the local user's reaction, decided from the cached message
    ToggleReaction {
        message_id: String,
        emoji: String,
    },
    CreateRoom {
        name: String,
        member_names: Vec<String>,
        share_history: bool,
    },
    InviteMembers {
        member_names: Vec<String>,
        share_history: bool,
    },
    UpdateProfile {
        username: String,
        display_color: String,
    },
    Exit,
}
