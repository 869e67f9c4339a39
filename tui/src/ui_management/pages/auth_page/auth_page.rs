use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{prelude::*, widgets::*, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    state_store::{action::Action, AuthStatus, State},
    ui_management::components::{
        input_box::{self, InputBox},
        Component, ComponentRender,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Login,
    Register,
}

struct Props {
    /// Inline error from the last rejected attempt
    error: Option<String>,
    /// A login or register request is in flight
    pending: bool,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        match &state.auth_status {
            AuthStatus::LoggedOut { error } => Props {
                error: error.clone(),
                pending: false,
            },
            AuthStatus::Authenticating => Props {
                error: None,
                pending: true,
            },
            AuthStatus::LoggedIn(_) => Props {
                error: None,
                pending: false,
            },
        }
    }
}

/// AuthPage collects credentials and drives the login and register requests
pub struct AuthPage {
    pub action_tx: UnboundedSender<Action>,
    props: Props,
    // Internal State
    username_input: InputBox,
    password_input: InputBox,
    active_field: Field,
    mode: Mode,
}

impl AuthPage {
    fn active_input_mut(&mut self) -> &mut InputBox {
        match self.active_field {
            Field::Username => &mut self.username_input,
            Field::Password => &mut self.password_input,
        }
    }

    fn switch_field(&mut self) {
        self.active_field = match self.active_field {
            Field::Username => Field::Password,
            Field::Password => Field::Username,
        };
    }

    fn submit(&mut self) {
        let username = self.username_input.text().trim().to_string();
        let password = self.password_input.text().to_string();

        if username.is_empty() || password.is_empty() {
            return;
        }

        let action = match self.mode {
            Mode::Login => Action::Login { username, password },
            Mode::Register => Action::Register { username, password },
        };

        let _ = self.action_tx.send(action);
    }
}

impl Component for AuthPage {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        AuthPage {
            action_tx: action_tx.clone(),
            props: Props::from(state),
            //
            username_input: InputBox::new(state, action_tx.clone()),
            password_input: InputBox::new(state, action_tx),
            active_field: Field::Username,
            mode: Mode::Login,
        }
        .move_with_state(state)
    }

    fn move_with_state(mut self, state: &State) -> Self
    where
        Self: Sized,
    {
        // once signed in, the typed credentials must not linger until the
        // page is shown again after a logout
        if matches!(state.auth_status, AuthStatus::LoggedIn(_)) {
            self.username_input.reset();
            self.password_input.reset();
            self.active_field = Field::Username;
        }

        AuthPage {
            props: Props::from(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        match self.mode {
            Mode::Login => "Sign In",
            Mode::Register => "Create Account",
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            let _ = self.action_tx.send(Action::Exit);
            return;
        }

        // no edits while a request is in flight
        if self.props.pending {
            return;
        }

        match key.code {
            KeyCode::Esc => {
                let _ = self.action_tx.send(Action::Exit);
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.switch_field();
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.mode = match self.mode {
                    Mode::Login => Mode::Register,
                    Mode::Register => Mode::Login,
                };
            }
            KeyCode::Enter => {
                self.submit();
            }
            _ => {
                self.active_input_mut().handle_key_event(key);
            }
        }
    }
}

impl ComponentRender<()> for AuthPage {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, _props: ()) {
        let [_, vertical_centered, _] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Ratio(1, 4),
                    Constraint::Min(12),
                    Constraint::Ratio(1, 4),
                ]
                .as_ref(),
            )
            .split(frame.size())
        else {
            panic!("The main layout should have 3 chunks")
        };

        let [_, both_centered, _] = *Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                [
                    Constraint::Ratio(1, 3),
                    Constraint::Min(1),
                    Constraint::Ratio(1, 3),
                ]
                .as_ref(),
            )
            .split(vertical_centered)
        else {
            panic!("The horizontal layout should have 3 chunks")
        };

        let [container_title, container_username, container_password, container_help, container_error] =
            *Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(2),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(2),
                        Constraint::Length(2),
                    ]
                    .as_ref(),
                )
                .split(both_centered)
        else {
            panic!("The form layout should have 5 chunks")
        };

        let title = Paragraph::new(Text::from(Line::from(vec![Span::from(self.name()).bold()])));
        frame.render_widget(title, container_title);

        self.username_input.render(
            frame,
            input_box::RenderProps {
                title: "Username".into(),
                area: container_username,
                border_color: if self.active_field == Field::Username {
                    Color::Yellow
                } else {
                    Color::Reset
                },
                show_cursor: self.active_field == Field::Username,
                masked: false,
            },
        );

        self.password_input.render(
            frame,
            input_box::RenderProps {
                title: "Password".into(),
                area: container_password,
                border_color: if self.active_field == Field::Password {
                    Color::Yellow
                } else {
                    Color::Reset
                },
                show_cursor: self.active_field == Field::Password,
                masked: true,
            },
        );

        let other_mode = match self.mode {
            Mode::Login => "create an account",
            Mode::Register => "sign in instead",
        };
        let help_text = Paragraph::new(Text::from(Line::from(vec![
            "Press ".into(),
            "<Enter>".bold(),
            " to submit, ".into(),
            "<Ctrl+R>".bold(),
            format!(" to {}.", other_mode).into(),
        ])));
        frame.render_widget(help_text, container_help);

        let status_line = if self.props.pending {
            Line::from(Span::from("Signing in...").italic())
        } else if let Some(error) = self.props.error.as_ref() {
            Line::from(Span::from(error.clone()).fg(Color::Red))
        } else {
            Line::from("")
        };
        frame.render_widget(Paragraph::new(Text::from(status_line)), container_error);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use comms::types::{AuthSession, PublicUser};
    use tokio::sync::mpsc;

    use super::*;

    fn press(page: &mut AuthPage, code: KeyCode) {
        page.handle_key_event(KeyEvent::from(code));
    }

    fn logged_in_state() -> State {
        let mut state = State::default();
        state.set_authenticated(AuthSession {
            access_token: "tok-1".into(),
            user: PublicUser {
                id: "u-1".into(),
                email: "ayse@example.com".into(),
                username: "ayse".into(),
                display_color: "#38bdf8".into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        });

        state
    }

    #[test]
    fn test_credentials_are_cleared_after_signing_in() {
        let (action_tx, _action_rx) = mpsc::unbounded_channel();
        let mut page = AuthPage::new(&State::default(), action_tx);

        press(&mut page, KeyCode::Char('a'));
        press(&mut page, KeyCode::Tab);
        press(&mut page, KeyCode::Char('s'));
        assert_eq!(page.username_input.text(), "a");
        assert_eq!(page.password_input.text(), "s");

        let page = page.move_with_state(&logged_in_state());

        assert!(page.username_input.is_empty());
        assert!(page.password_input.is_empty());
        assert_eq!(page.active_field, Field::Username);
    }
}
