use anyhow::Context;
use comms::{
    command::{self, ClientCommand},
    event::ServerEvent,
    transport::{
        channel::{self, CommandWriter, EventStream},
        http::ApiClient,
    },
    types::AuthSession,
};
use tokio::{
    sync::{
        broadcast,
        mpsc::{self, UnboundedReceiver, UnboundedSender},
    },
    time::Instant,
};
use tokio_stream::StreamExt;

use crate::{config::Config, session::SessionStore, Interrupted, Terminator};

use super::{
    action::Action,
    typing::Composer,
    AuthStatus, State,
};

type ChannelHandle = (EventStream, CommandWriter);

/// Owns all mutable state and pushes an immutable snapshot to the UI after
/// every change
pub struct StateStore {
    state_tx: UnboundedSender<State>,
    config: Config,
}

impl StateStore {
    pub fn new(config: Config) -> (Self, UnboundedReceiver<State>) {
        let (state_tx, state_rx) = mpsc::unbounded_channel::<State>();

        (StateStore { state_tx, config }, state_rx)
    }

    pub async fn main_loop(
        self,
        mut terminator: Terminator,
        mut action_rx: UnboundedReceiver<Action>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        let mut api = ApiClient::new(&self.config.api_url).context("invalid api url")?;
        let session_store = SessionStore::new(self.config.session_file());
        let mut composer = Composer::default();
        let mut state = State::default();
        let mut opt_channel: Option<ChannelHandle> = None;

        // the local-storage read: restore a persisted session before the first paint
        if let Some(session) = session_store.load() {
            self.establish_session(&mut api, &mut state, &mut opt_channel, session)
                .await;
        }

        // the initial state once
        self.state_tx.send(state.clone())?;

        let result = loop {
            if let Some((event_stream, command_writer)) = opt_channel.as_mut() {
                let typing_deadline = composer.deadline();

                tokio::select! {
                    // Apply the server events in arrival order
                    maybe_event = event_stream.next() => match maybe_event {
                        Some(Ok(event)) => {
                            Self::handle_server_event(&mut state, &session_store, &event);
                        },
                        Some(Err(err)) => {
                            tracing::warn!("dropping a malformed channel event: {:#}", err);
                        },
                        // channel lost; keep the session, surface the gap
                        None => {
                            opt_channel = None;
                            state.channel_online = false;
                            state.status_message =
                                Some("connection to the server was lost".to_string());
                        },
                    },
                    // Handle the actions coming from the UI
                    // and process them to do async operations
                    Some(action) = action_rx.recv() => match action {
                        Action::Logout => {
                            // release the composing indicator before going away
                            if let Some(signal) = composer.on_room_change() {
                                Self::emit_command(command_writer, signal.into_command()).await;
                            }

                            session_store.clear();
                            api.set_access_token(None);
                            state.clear_for_logout();
                            opt_channel = None;
                        },
                        Action::Exit => {
                            let _ = terminator.terminate(Interrupted::UserInt);

                            break Interrupted::UserInt;
                        },
                        action => {
                            self.handle_chat_action(
                                &api,
                                &mut state,
                                &session_store,
                                Some(command_writer),
                                &mut composer,
                                action,
                            )
                            .await;
                        },
                    },
                    // The composer's inactivity deadline is the only cancellable
                    // timer; it is re-created whenever a keystroke pushes it
                    _ = tokio::time::sleep_until(typing_deadline.unwrap_or_else(Instant::now)),
                        if typing_deadline.is_some() =>
                    {
                        if let Some(signal) = composer.on_timeout(Instant::now()) {
                            Self::emit_command(command_writer, signal.into_command()).await;
                        }
                    },
                    // Catch and handle interrupt signal to gracefully shutdown
                    Ok(interrupted) = interrupt_rx.recv() => {
                        break interrupted;
                    },
                }
            } else if state.session().is_some() {
                // Logged in but the channel is gone: logout and the plain
                // HTTP operations must keep working
                tokio::select! {
                    Some(action) = action_rx.recv() => match action {
                        Action::Logout => {
                            composer.on_room_change();

                            session_store.clear();
                            api.set_access_token(None);
                            state.clear_for_logout();
                        },
                        Action::Exit => {
                            let _ = terminator.terminate(Interrupted::UserInt);

                            break Interrupted::UserInt;
                        },
                        action => {
                            self.handle_chat_action(
                                &api,
                                &mut state,
                                &session_store,
                                None,
                                &mut composer,
                                action,
                            )
                            .await;
                        },
                    },
                    // Catch and handle interrupt signal to gracefully shutdown
                    Ok(interrupted) = interrupt_rx.recv() => {
                        break interrupted;
                    },
                }
            } else {
                tokio::select! {
                    Some(action) = action_rx.recv() => match action {
                        Action::Login { username, password } => {
                            state.auth_status = AuthStatus::Authenticating;
                            // emit event to re-render any part depending on the auth status
                            self.state_tx.send(state.clone())?;

                            match api.login(&username, &password).await {
                                Ok(session) => {
                                    self.persist_and_establish(
                                        &session_store,
                                        &mut api,
                                        &mut state,
                                        &mut opt_channel,
                                        session,
                                    )
                                    .await;
                                },
                                Err(err) => {
                                    state.auth_status = AuthStatus::LoggedOut {
                                        error: Some(err.to_string()),
                                    };
                                },
                            }
                        },
                        Action::Register { username, password } => {
                            state.auth_status = AuthStatus::Authenticating;
                            self.state_tx.send(state.clone())?;

                            match api.register(&username, &password).await {
                                Ok(session) => {
                                    self.persist_and_establish(
                                        &session_store,
                                        &mut api,
                                        &mut state,
                                        &mut opt_channel,
                                        session,
                                    )
                                    .await;
                                },
                                Err(err) => {
                                    state.auth_status = AuthStatus::LoggedOut {
                                        error: Some(err.to_string()),
                                    };
                                },
                            }
                        },
                        Action::Exit => {
                            let _ = terminator.terminate(Interrupted::UserInt);

                            break Interrupted::UserInt;
                        },
                        _ => (),
                    },
                    // Catch and handle interrupt signal to gracefully shutdown
                    Ok(interrupted) = interrupt_rx.recv() => {
                        break interrupted;
                    },
                }
            }

            self.state_tx.send(state.clone())?;
        };

        Ok(result)
    }

    async fn persist_and_establish(
        &self,
        session_store: &SessionStore,
        api: &mut ApiClient,
        state: &mut State,
        opt_channel: &mut Option<ChannelHandle>,
        session: AuthSession,
    ) {
        if let Err(err) = session_store.save(&session) {
            tracing::warn!("could not persist the session: {:#}", err);
        }

        self.establish_session(api, state, opt_channel, session)
            .await;
    }

    /// Enters the authenticated mode: attaches the bearer token, opens the
    /// real-time channel and issues the initial room/user/history requests
    async fn establish_session(
        &self,
        api: &mut ApiClient,
        state: &mut State,
        opt_channel: &mut Option<ChannelHandle>,
        session: AuthSession,
    ) {
        api.set_access_token(Some(session.access_token.clone()));
        state.set_authenticated(session.clone());

        match channel::connect(&self.config.ws_url, &session.access_token).await {
            Ok(handle) => {
                *opt_channel = Some(handle);
                state.channel_online = true;
            }
            Err(err) => {
                tracing::warn!("could not establish the channel: {:#}", err);
                state.status_message = Some("real-time connection is unavailable".to_string());
            }
        }

        match api.rooms().await {
            Ok(rooms) => state.rooms = rooms,
            Err(err) => Self::surface_error(state, &err),
        }
        match api.users().await {
            Ok(users) => state.users = users,
            Err(err) => Self::surface_error(state, &err),
        }

        self.fetch_active_room_history(api, state).await;
    }

    async fn fetch_active_room_history(&self, api: &ApiClient, state: &mut State) {
        let Some(room_id) = state.active_room_id().map(str::to_string) else {
            return;
        };

        if state.room_messages.contains_key(&room_id) {
            return;
        }

        match api.room_messages(&room_id).await {
            Ok(messages) => state.replace_messages(&room_id, messages),
            Err(err) => Self::surface_error(state, &err),
        }
    }

    async fn handle_chat_action(
        &self,
        api: &ApiClient,
        state: &mut State,
        session_store: &SessionStore,
        mut command_writer: Option<&mut CommandWriter>,
        composer: &mut Composer,
        action: Action,
    ) {
        // a status banner describes the previous action; any new action
        // except plain typing retires it
        if !matches!(action, Action::ComposerChanged { .. }) {
            state.status_message = None;
        }

        match action {
            Action::SelectRoom { room_id } => {
                // stop-on-room-change, so the previous room never shows a
                // stuck typing indicator
                if let Some(signal) = composer.on_room_change() {
                    Self::try_emit_command(&mut command_writer, signal.into_command()).await;
                }

                state.select_room(room_id);
                self.fetch_active_room_history(api, state).await;
            }
            Action::ComposerChanged { content } => {
                if command_writer.is_none() {
                    return;
                }
                let Some(room_id) = state.active_room_id().map(str::to_string) else {
                    return;
                };

                for signal in composer.on_input(&room_id, &content, Instant::now()) {
                    Self::try_emit_command(&mut command_writer, signal.into_command()).await;
                }
            }
            Action::SendMessage { content } => {
                let content = content.trim().to_string();
                let Some(room_id) = state.active_room_id().map(str::to_string) else {
                    return;
                };
                if content.is_empty() {
                    return;
                }
                let Some(command_writer) = command_writer else {
                    state.status_message =
                        Some("cannot send while the connection is down".to_string());
                    return;
                };

                if let Some(signal) = composer.on_submit() {
                    Self::emit_command(command_writer, signal.into_command()).await;
                }

                // the message itself comes back through message:new; the
                // idempotent cache insert absorbs any double delivery
                Self::emit_command(
                    command_writer,
                    ClientCommand::SendMessage(command::SendMessageCommand { room_id, content }),
                )
                .await;
            }
            Action::ToggleReaction { message_id, emoji } => {
                let Some(user_id) = state.current_user().map(|user| user.id.clone()) else {
                    return;
                };
                let Some(room_id) = state.active_room_id().map(str::to_string) else {
                    return;
                };
                let Some(message) = state.message_in_room(&room_id, &message_id) else {
                    return;
                };
                let Some(command_writer) = command_writer else {
                    state.status_message =
                        Some("cannot react while the connection is down".to_string());
                    return;
                };

                // decide add vs remove from the local cache; the server
                // confirms through message:updated either way
                let command = if message.has_reaction(&user_id, &emoji) {
                    ClientCommand::RemoveReaction(command::RemoveReactionCommand {
                        room_id,
                        message_id,
                        emoji,
                    })
                } else {
                    ClientCommand::AddReaction(command::AddReactionCommand {
                        room_id,
                        message_id,
                        emoji,
                    })
                };

                Self::emit_command(command_writer, command).await;
            }
            Action::CreateRoom {
                name,
                member_names,
                share_history,
            } => {
                let member_ids = Self::resolve_member_ids(state, &member_names);

                match api.create_room(&name, &member_ids, share_history).await {
                    Ok(room) => {
                        let room_id = room.id.clone();
                        self.refresh_rooms(api, state).await;
                        state.select_room(room_id);
                        self.fetch_active_room_history(api, state).await;
                        state.status_message = Some(format!("room \"{}\" created", name));
                    }
                    Err(err) => Self::surface_error(state, &err),
                }
            }
            Action::InviteMembers {
                member_names,
                share_history,
            } => {
                let Some(room_id) = state.active_room_id().map(str::to_string) else {
                    return;
                };
                let user_ids = Self::resolve_member_ids(state, &member_names);
                if user_ids.is_empty() {
                    state.status_message = Some("no known users matched the invite".to_string());
                    return;
                }

                match api.add_members(&room_id, &user_ids, share_history).await {
                    Ok(()) => {
                        self.refresh_rooms(api, state).await;
                        state.status_message = Some("members invited".to_string());
                    }
                    Err(err) => Self::surface_error(state, &err),
                }
            }
            Action::UpdateProfile {
                username,
                display_color,
            } => match api.update_profile(&username, &display_color).await {
                Ok(user) => {
                    if let AuthStatus::LoggedIn(session) = &mut state.auth_status {
                        session.user = user;
                        if let Err(err) = session_store.save(session) {
                            tracing::warn!("could not persist the session: {:#}", err);
                        }
                    }
                    match api.users().await {
                        Ok(users) => state.users = users,
                        Err(err) => Self::surface_error(state, &err),
                    }
                    state.status_message = Some("profile updated".to_string());
                }
                Err(err) => Self::surface_error(state, &err),
            },
            // login, register, logout and exit are handled by the main loop
            _ => (),
        }
    }

    async fn refresh_rooms(&self, api: &ApiClient, state: &mut State) {
        match api.rooms().await {
            Ok(rooms) => state.rooms = rooms,
            Err(err) => Self::surface_error(state, &err),
        }
    }

    fn handle_server_event(state: &mut State, session_store: &SessionStore, event: &ServerEvent) {
        state.handle_server_event(event);

        // connection:init refreshes the user; keep the persisted copy current
        if matches!(event, ServerEvent::ConnectionInit(_)) {
            if let Some(session) = state.session() {
                if let Err(err) = session_store.save(session) {
                    tracing::warn!("could not persist the session: {:#}", err);
                }
            }
        }
    }

    fn resolve_member_ids(state: &State, member_names: &[String]) -> Vec<String> {
        member_names
            .iter()
            .filter_map(|name| {
                state
                    .users
                    .iter()
                    .find(|user| user.username.eq_ignore_ascii_case(name.trim()))
                    .map(|user| user.id.clone())
            })
            .collect()
    }

    fn surface_error(state: &mut State, err: &comms::transport::http::ApiError) {
        // uniform failure surfacing: every request failure lands in the banner
        tracing::warn!("api request failed: {:#}", err);
        state.status_message = Some(err.to_string());
    }

    /// Emits only when the channel is up; without it there is nobody to tell
    async fn try_emit_command(
        command_writer: &mut Option<&mut CommandWriter>,
        command: ClientCommand,
    ) {
        if let Some(command_writer) = command_writer.as_deref_mut() {
            Self::emit_command(command_writer, command).await;
        }
    }

    async fn emit_command(command_writer: &mut CommandWriter, command: ClientCommand) {
        if let Err(err) = command_writer.write(&command).await {
            // a failed write means the channel is going away; the event
            // stream branch will observe the disconnect and surface it
            tracing::warn!("could not send a command over the channel: {:#}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use comms::types::PublicUser;

    use crate::create_termination;

    use super::*;

    fn test_config(name: &str) -> Config {
        Config {
            // endpoints that refuse connections straight away
            api_url: "http://127.0.0.1:9".into(),
            ws_url: "ws://127.0.0.1:9".into(),
            session_file: Some(std::env::temp_dir().join(format!(
                "chat-tui-state-test-{}-{}.json",
                std::process::id(),
                name
            ))),
            log_file: None,
        }
    }

    fn sample_session() -> AuthSession {
        AuthSession {
            access_token: "tok-1".into(),
            user: PublicUser {
                id: "u-1".into(),
                email: "ayse@example.com".into(),
                username: "ayse".into(),
                display_color: "#38bdf8".into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    /// Spawns the main loop with a restored session and unreachable
    /// endpoints, so the client comes up logged in but without a channel
    fn start_offline_store(
        config: Config,
    ) -> (
        UnboundedSender<Action>,
        UnboundedReceiver<State>,
        tokio::task::JoinHandle<anyhow::Result<Interrupted>>,
    ) {
        let session_store = SessionStore::new(config.session_file());
        session_store
            .save(&sample_session())
            .expect("could not seed the session file");

        let (terminator, interrupt_rx) = create_termination();
        let (store, state_rx) = StateStore::new(config);
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(store.main_loop(terminator, action_rx, interrupt_rx));

        (action_tx, state_rx, handle)
    }

    #[tokio::test]
    async fn test_logout_without_a_channel_clears_the_session() {
        let config = test_config("logout-offline");
        let session_store = SessionStore::new(config.session_file());
        let (action_tx, mut state_rx, handle) = start_offline_store(config);

        let state = state_rx.recv().await.expect("no initial state");
        assert!(state.session().is_some());
        assert!(!state.channel_online);

        action_tx.send(Action::Logout).unwrap();

        let state = state_rx.recv().await.expect("no state after logout");
        assert!(state.session().is_none());
        assert!(session_store.load().is_none());

        action_tx.send(Action::Exit).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_selecting_a_room_retires_the_status_banner() {
        let config = test_config("banner-clear");
        let session_path = config.session_file();
        let (action_tx, mut state_rx, handle) = start_offline_store(config);

        let state = state_rx.recv().await.expect("no initial state");
        // the failed startup requests leave an error banner behind
        assert!(state.status_message.is_some());

        action_tx
            .send(Action::SelectRoom {
                room_id: "r-1".into(),
            })
            .unwrap();

        let state = state_rx.recv().await.expect("no state after select");
        assert!(state.status_message.is_none());

        action_tx.send(Action::Exit).unwrap();
        handle.await.unwrap().unwrap();

        std::fs::remove_file(session_path).ok();
    }
}
