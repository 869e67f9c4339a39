use std::collections::HashMap;

use circular_queue::CircularQueue;
use comms::{
    event::ServerEvent,
    types::{AuthSession, Message, PublicUser, RoomMember, RoomSummary},
};

const MAX_MESSAGES_TO_CACHE_PER_ROOM: usize = 500;

#[derive(Debug, Clone)]
pub enum AuthStatus {
    LoggedOut {
        /// Inline error for the auth page, e.g. rejected credentials
        error: Option<String>,
    },
    Authenticating,
    LoggedIn(AuthSession),
}

impl Default for AuthStatus {
    fn default() -> Self {
        AuthStatus::LoggedOut { error: None }
    }
}

/// State holds everything the client knows, rebuilt from server responses
/// and patched in place by pushed events
#[derive(Debug, Clone, Default)]
pub struct State {
    pub auth_status: AuthStatus,
    /// Rooms known to the client, in server order
    pub rooms: Vec<RoomSummary>,
    /// All registered users, for the invite and create-room forms
    pub users: Vec<PublicUser>,
    /// Bounded per-room message caches keyed by room id
    pub room_messages: HashMap<String, CircularQueue<Message>>,
    /// Users currently composing per room, local user included
    pub typing_users: HashMap<String, Vec<RoomMember>>,
    /// Raw selection; resolve through [State::active_room_id]
    pub selected_room_id: Option<String>,
    /// Whether the real-time channel is currently established
    pub channel_online: bool,
    /// One-line banner for request failures and confirmations
    pub status_message: Option<String>,
}

impl State {
    pub fn session(&self) -> Option<&AuthSession> {
        match &self.auth_status {
            AuthStatus::LoggedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn current_user(&self) -> Option<&PublicUser> {
        self.session().map(|session| &session.user)
    }

    /// The active room id is always a member of the known room set, or None.
    /// A selection that disappeared from the set falls back to the first
    /// available room.
    pub fn active_room_id(&self) -> Option<&str> {
        self.selected_room_id
            .as_deref()
            .filter(|selected| self.rooms.iter().any(|room| room.id == *selected))
            .or_else(|| self.rooms.first().map(|room| room.id.as_str()))
    }

    pub fn active_room(&self) -> Option<&RoomSummary> {
        let active_room_id = self.active_room_id()?;

        self.rooms.iter().find(|room| room.id == active_room_id)
    }

    pub fn select_room(&mut self, room_id: String) {
        self.selected_room_id = Some(room_id);
    }

    pub fn active_room_messages(&self) -> Option<&CircularQueue<Message>> {
        self.room_messages.get(self.active_room_id()?)
    }

    pub fn message_in_room(&self, room_id: &str, message_id: &str) -> Option<&Message> {
        self.room_messages
            .get(room_id)?
            .iter()
            .find(|message| message.id == message_id)
    }

    /// Users currently composing in the active room, excluding the local user
    pub fn active_typers(&self) -> Vec<&RoomMember> {
        let user_id = self.current_user().map(|user| user.id.as_str());

        self.active_room_id()
            .and_then(|room_id| self.typing_users.get(room_id))
            .map(|users| {
                users
                    .iter()
                    .filter(|member| Some(member.id.as_str()) != user_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_authenticated(&mut self, session: AuthSession) {
        self.auth_status = AuthStatus::LoggedIn(session);
    }

    /// Replaces a room's cache with a freshly fetched history
    pub fn replace_messages(&mut self, room_id: &str, messages: Vec<Message>) {
        let mut queue = CircularQueue::with_capacity(MAX_MESSAGES_TO_CACHE_PER_ROOM);
        for message in messages {
            queue.push(message);
        }

        self.room_messages.insert(room_id.to_string(), queue);
    }

    /// Appends a pushed message to its room cache. Idempotent by message id:
    /// the same message delivered through both the acknowledgement and the
    /// broadcast path is stored once. Returns whether the cache changed.
    pub fn append_message(&mut self, message: &Message) -> bool {
        let messages = self
            .room_messages
            .entry(message.room_id.clone())
            .or_insert_with(|| CircularQueue::with_capacity(MAX_MESSAGES_TO_CACHE_PER_ROOM));

        if messages.iter().any(|known| known.id == message.id) {
            return false;
        }

        messages.push(message.clone());
        true
    }

    /// Replaces the cached message carrying the same id, if present.
    /// The server copy is authoritative, reactions included.
    pub fn apply_message_update(&mut self, message: &Message) {
        if let Some(messages) = self.room_messages.get_mut(&message.room_id) {
            if let Some(known) = messages.iter_mut().find(|known| known.id == message.id) {
                *known = message.clone();
            }
        }
    }

    pub fn handle_server_event(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::ConnectionInit(init) => {
                // fresh snapshot of the user and the room set
                if let AuthStatus::LoggedIn(session) = &mut self.auth_status {
                    session.user = init.user.clone();
                }
                self.rooms = init.rooms.clone();
            }
            ServerEvent::RoomsUpdate(rooms) => {
                self.rooms = rooms.clone();
            }
            ServerEvent::MessageNew(message) => {
                self.append_message(message);
            }
            ServerEvent::MessageUpdated(message) => {
                self.apply_message_update(message);
            }
            ServerEvent::TypingUpdate(update) => {
                self.typing_users
                    .insert(update.room_id.clone(), update.users.clone());
            }
        }
    }

    /// Drops the session and every cache derived from it
    pub fn clear_for_logout(&mut self) {
        *self = State::default();
    }
}
