use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{prelude::*, widgets::*, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, State};

use super::{
    components::{
        form::Form,
        message_input_box::{self, MessageInputBox},
        message_list::{self, MessageList},
        room_list::{self, RoomList},
        user_color,
    },
    section::{
        usage::{widget_usage_to_text, HasUsageInfo, UsageInfo, UsageInfoLine},
        SectionActivation,
    },
};
use crate::ui_management::components::{Component, ComponentRender};

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    RoomList,
    MessageList,
    MessageInput,
}

impl Section {
    pub const COUNT: usize = 3;

    fn to_usize(&self) -> usize {
        match self {
            Section::RoomList => 0,
            Section::MessageList => 1,
            Section::MessageInput => 2,
        }
    }
}

impl TryFrom<usize> for Section {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Section::RoomList),
            1 => Ok(Section::MessageList),
            2 => Ok(Section::MessageInput),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Popup {
    CreateRoom,
    InviteMembers,
    Profile,
}

struct Props {
    /// The logged in user
    username: String,
    display_color: String,
    /// The currently active room, resolved against the known room set
    active_room_name: Option<String>,
    /// Usernames and display colors of the active room's members
    members: Vec<(String, String)>,
    /// Other users currently composing in the active room
    typers: Vec<String>,
    status_message: Option<String>,
    channel_online: bool,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        let active_room = state.active_room();

        Props {
            username: state
                .current_user()
                .map(|user| user.username.clone())
                .unwrap_or_default(),
            display_color: state
                .current_user()
                .map(|user| user.display_color.clone())
                .unwrap_or_default(),
            active_room_name: active_room.map(|room| room.name.clone()),
            members: active_room
                .map(|room| {
                    room.members
                        .iter()
                        .map(|member| (member.username.clone(), member.display_color.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            typers: state
                .active_typers()
                .iter()
                .map(|member| member.username.clone())
                .collect(),
            status_message: state.status_message.clone(),
            channel_online: state.channel_online,
        }
    }
}

const DEFAULT_HOVERED_SECTION: Section = Section::MessageInput;

/// ChatPage handles the UI and the state of the chat page
pub struct ChatPage {
    /// Action sender
    pub action_tx: UnboundedSender<Action>,
    /// State Mapped ChatPage Props
    props: Props,
    // Internal State
    /// Currently active section, handling input
    pub active_section: Option<Section>,
    /// Section that is currently hovered
    pub last_hovered_section: Section,
    /// Popup form capturing all input while open
    active_popup: Option<Popup>,
    create_room_form: Form,
    invite_form: Form,
    profile_form: Form,
    // Child Components
    pub room_list: RoomList,
    pub message_list: MessageList,
    pub message_input_box: MessageInputBox,
}

impl ChatPage {
    fn get_component_for_section<'a>(&'a self, section: &Section) -> &'a dyn Component {
        match section {
            Section::RoomList => &self.room_list,
            Section::MessageList => &self.message_list,
            Section::MessageInput => &self.message_input_box,
        }
    }

    fn get_component_for_section_mut<'a>(&'a mut self, section: &Section) -> &'a mut dyn Component {
        match section {
            Section::RoomList => &mut self.room_list,
            Section::MessageList => &mut self.message_list,
            Section::MessageInput => &mut self.message_input_box,
        }
    }

    fn get_section_activation_for_section<'a>(
        &'a mut self,
        section: &Section,
    ) -> &'a mut dyn SectionActivation {
        match section {
            Section::RoomList => &mut self.room_list,
            Section::MessageList => &mut self.message_list,
            Section::MessageInput => &mut self.message_input_box,
        }
    }

    fn hover_next(&mut self) {
        let idx: usize = self.last_hovered_section.to_usize();
        let next_idx = (idx + 1) % Section::COUNT;
        self.last_hovered_section = Section::try_from(next_idx).unwrap();
    }

    fn hover_previous(&mut self) {
        let idx: usize = self.last_hovered_section.to_usize();
        let previous_idx = if idx == 0 {
            Section::COUNT - 1
        } else {
            idx - 1
        };
        self.last_hovered_section = Section::try_from(previous_idx).unwrap();
    }

    fn calculate_border_color(&self, section: Section) -> Color {
        match (self.active_section.as_ref(), &self.last_hovered_section) {
            (Some(active_section), _) if active_section.eq(&section) => Color::Yellow,
            (_, last_hovered_section) if last_hovered_section.eq(&section) => Color::Blue,
            _ => Color::Reset,
        }
    }

    fn disable_section(&mut self, section: &Section) {
        self.get_section_activation_for_section(section)
            .deactivate();

        self.active_section = None;
    }

    fn active_form_mut(&mut self, popup: Popup) -> &mut Form {
        match popup {
            Popup::CreateRoom => &mut self.create_room_form,
            Popup::InviteMembers => &mut self.invite_form,
            Popup::Profile => &mut self.profile_form,
        }
    }

    fn open_popup(&mut self, popup: Popup) {
        if popup == Popup::Profile {
            let username = self.props.username.clone();
            let display_color = self.props.display_color.clone();

            self.profile_form.set_value(0, &username);
            self.profile_form.set_value(1, &display_color);
        }

        self.active_popup = Some(popup);
    }

    fn close_popup(&mut self, popup: Popup) {
        self.active_form_mut(popup).reset();
        self.active_popup = None;
    }

    fn handle_popup_key_event(&mut self, popup: Popup, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.close_popup(popup);
            return;
        }

        let submitted = self.active_form_mut(popup).handle_key_event(key);
        if !submitted {
            return;
        }

        if let Some(action) = self.build_popup_action(popup) {
            let _ = self.action_tx.send(action);
            self.close_popup(popup);
        }
    }

    /// Turns a submitted form into an action. Incomplete forms yield nothing
    /// and stay open.
    fn build_popup_action(&self, popup: Popup) -> Option<Action> {
        match popup {
            Popup::CreateRoom => {
                let name = self.create_room_form.value(0).trim().to_string();
                if name.is_empty() {
                    return None;
                }

                Some(Action::CreateRoom {
                    name,
                    member_names: parse_member_names(self.create_room_form.value(1)),
                    share_history: parse_yes_no(self.create_room_form.value(2)),
                })
            }
            Popup::InviteMembers => {
                let member_names = parse_member_names(self.invite_form.value(0));
                if member_names.is_empty() {
                    return None;
                }

                Some(Action::InviteMembers {
                    member_names,
                    share_history: parse_yes_no(self.invite_form.value(1)),
                })
            }
            Popup::Profile => {
                let username = self.profile_form.value(0).trim().to_string();
                let display_color = self.profile_form.value(1).trim().to_string();
                if username.is_empty() || display_color.is_empty() {
                    return None;
                }

                Some(Action::UpdateProfile {
                    username,
                    display_color,
                })
            }
        }
    }
}

fn parse_member_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_yes_no(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn typing_line(typers: &[String]) -> Option<String> {
    match typers {
        [] => None,
        [only] => Some(format!("@{} is typing...", only)),
        many => {
            let names: Vec<String> = many.iter().map(|name| format!("@{}", name)).collect();
            Some(format!("{} are typing...", names.join(", ")))
        }
    }
}

impl Component for ChatPage {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        ChatPage {
            action_tx: action_tx.clone(),
            // set the props
            props: Props::from(state),
            // internal component state
            active_section: Option::None,
            last_hovered_section: DEFAULT_HOVERED_SECTION,
            active_popup: None,
            create_room_form: Form::new(
                "New Room",
                &["Name", "Members (comma separated)", "Share history (y/n)"],
            ),
            invite_form: Form::new(
                "Invite Members",
                &["Members (comma separated)", "Share history (y/n)"],
            ),
            profile_form: Form::new("Profile", &["Username", "Display color (hex)"]),
            // child components
            room_list: RoomList::new(state, action_tx.clone()),
            message_list: MessageList::new(state, action_tx.clone()),
            message_input_box: MessageInputBox::new(state, action_tx),
        }
        .move_with_state(state)
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        ChatPage {
            props: Props::from(state),
            // propagate the update to the child components
            room_list: self.room_list.move_with_state(state),
            message_list: self.message_list.move_with_state(state),
            message_input_box: self.message_input_box.move_with_state(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Chat Page"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if let Some(popup) = self.active_popup {
            self.handle_popup_key_event(popup, key);
            return;
        }

        let active_section = self.active_section.clone();

        match active_section {
            None => match key.code {
                KeyCode::Char('e') => {
                    let last_hovered_section = self.last_hovered_section.clone();

                    self.active_section = Some(last_hovered_section.clone());
                    self.get_section_activation_for_section(&last_hovered_section)
                        .activate();
                }
                KeyCode::Left => self.hover_previous(),
                KeyCode::Right => self.hover_next(),
                KeyCode::Char('n') => self.open_popup(Popup::CreateRoom),
                KeyCode::Char('i') if self.props.active_room_name.is_some() => {
                    self.open_popup(Popup::InviteMembers)
                }
                KeyCode::Char('p') => self.open_popup(Popup::Profile),
                KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    let _ = self.action_tx.send(Action::Logout);
                }
                KeyCode::Char('q') => {
                    let _ = self.action_tx.send(Action::Exit);
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    let _ = self.action_tx.send(Action::Exit);
                }
                _ => {}
            },
            Some(section) => {
                self.get_component_for_section_mut(&section)
                    .handle_key_event(key);

                // the section is disabled when escape is pressed,
                // or when enter is pressed on the room list
                match section {
                    Section::RoomList if key.code == KeyCode::Enter => {
                        self.disable_section(&section)
                    }
                    _ if key.code == KeyCode::Esc => self.disable_section(&section),
                    _ => (),
                }
            }
        }
    }
}

const NO_ROOM_SELECTED_MESSAGE: &str = "No room yet. Create one with (n)!";

fn calculate_list_offset(height: u16, items_len: usize) -> usize {
    // go back by (container height - 2 for borders) to get the offset
    items_len.saturating_sub(height.saturating_sub(2) as usize)
}

impl ComponentRender<()> for ChatPage {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, _props: ()) {
        let [left, middle, right] = *Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                [
                    Constraint::Percentage(20),
                    Constraint::Percentage(60),
                    Constraint::Percentage(20),
                ]
                .as_ref(),
            )
            .split(frame.size())
        else {
            panic!("The main layout should have 3 chunks")
        };

        let [container_room_list, container_user_info] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(4)].as_ref())
            .split(left)
        else {
            panic!("The left layout should have 2 chunks")
        };

        self.room_list.render(
            frame,
            room_list::RenderProps {
                border_color: self.calculate_border_color(Section::RoomList),
                area: container_room_list,
            },
        );

        let connection_line = if self.props.channel_online {
            Line::from(Span::from("online").fg(Color::Green))
        } else {
            Line::from(Span::from("offline").fg(Color::Red))
        };
        let user_info = Paragraph::new(Text::from(vec![
            Line::from(Span::styled(
                format!("@{}", self.props.username),
                Style::default()
                    .fg(user_color(&self.props.display_color))
                    .add_modifier(Modifier::BOLD),
            )),
            connection_line,
        ]))
        .block(Block::default().borders(Borders::ALL).title("You"));
        frame.render_widget(user_info, container_user_info);

        let [container_highlight, container_messages, container_typing, container_input, container_status] =
            *Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(1),
                        Constraint::Length(1),
                        Constraint::Length(3),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(middle)
        else {
            panic!("The middle layout should have 5 chunks")
        };

        let top_line = if let Some(room_name) = self.props.active_room_name.as_ref() {
            Line::from(vec![
                "on ".into(),
                Span::from(format!("#{}", room_name)).bold(),
                Span::from(format!(" with {} members", self.props.members.len())).italic(),
            ])
        } else {
            Line::from(NO_ROOM_SELECTED_MESSAGE)
        };

        let room_info = Paragraph::new(Text::from(top_line)).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Active Room"),
        );
        frame.render_widget(room_info, container_highlight);

        self.message_list.render(
            frame,
            message_list::RenderProps {
                border_color: self.calculate_border_color(Section::MessageList),
                area: container_messages,
            },
        );

        if let Some(line) = typing_line(&self.props.typers) {
            frame.render_widget(
                Paragraph::new(Text::from(Line::from(Span::from(line).italic()))),
                container_typing,
            );
        }

        self.message_input_box.render(
            frame,
            message_input_box::RenderProps {
                border_color: self.calculate_border_color(Section::MessageInput),
                area: container_input,
                show_cursor: self
                    .active_section
                    .as_ref()
                    .map(|active_section| active_section.eq(&Section::MessageInput))
                    .unwrap_or(false)
                    && self.active_popup.is_none(),
            },
        );

        let status_line = if let Some(message) = self.props.status_message.as_ref() {
            Line::from(Span::from(message.clone()).fg(Color::Yellow))
        } else if !self.props.channel_online {
            Line::from(Span::from("real-time updates are unavailable").fg(Color::Red))
        } else {
            Line::from("")
        };
        frame.render_widget(Paragraph::new(Text::from(status_line)), container_status);

        let [container_members, container_usage] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(12)].as_ref())
            .split(right)
        else {
            panic!("The right layout should have 2 chunks")
        };

        let members_len = self.props.members.len();
        let members_offset = calculate_list_offset(container_members.height, members_len);
        let member_items: Vec<ListItem> = self
            .props
            .members
            .iter()
            .skip(members_offset)
            .map(|(username, display_color)| {
                ListItem::new(Line::from(Span::styled(
                    format!("@{}", username),
                    Style::default().fg(user_color(display_color)),
                )))
            })
            .collect();

        let members_list = List::new(member_items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Members ({})", members_len)),
        );
        frame.render_widget(members_list, container_members);

        let mut usage_text: Text = widget_usage_to_text(self.usage_info());
        usage_text.patch_style(Style::default());
        let usage = Paragraph::new(usage_text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Usage"));
        frame.render_widget(usage, container_usage);

        if let Some(popup) = self.active_popup {
            let form = match popup {
                Popup::CreateRoom => &self.create_room_form,
                Popup::InviteMembers => &self.invite_form,
                Popup::Profile => &self.profile_form,
            };

            form.render(frame, ());
        }
    }
}

impl HasUsageInfo for ChatPage {
    fn usage_info(&self) -> UsageInfo {
        if self.active_popup.is_some() {
            return UsageInfo {
                description: Some("Fill in the form".into()),
                lines: vec![
                    UsageInfoLine {
                        keys: vec!["Esc".into()],
                        description: "to cancel".into(),
                    },
                    UsageInfoLine {
                        keys: vec!["Tab".into()],
                        description: "to switch fields".into(),
                    },
                    UsageInfoLine {
                        keys: vec!["Enter".into()],
                        description: "to submit".into(),
                    },
                ],
            };
        }

        if let Some(section) = self.active_section.as_ref() {
            let handler: &dyn HasUsageInfo = match section {
                Section::RoomList => &self.room_list,
                Section::MessageList => &self.message_list,
                Section::MessageInput => &self.message_input_box,
            };

            handler.usage_info()
        } else {
            UsageInfo {
                description: Some("Select a widget".into()),
                lines: vec![
                    UsageInfoLine {
                        keys: vec!["q".into()],
                        description: "to exit".into(),
                    },
                    UsageInfoLine {
                        keys: vec!["←".into(), "→".into()],
                        description: "to hover widgets".into(),
                    },
                    UsageInfoLine {
                        keys: vec!["e".into()],
                        description: format!(
                            "to activate {}",
                            self.get_component_for_section(&self.last_hovered_section)
                                .name()
                        ),
                    },
                    UsageInfoLine {
                        keys: vec!["n".into()],
                        description: "to create a room".into(),
                    },
                    UsageInfoLine {
                        keys: vec!["i".into()],
                        description: "to invite members".into(),
                    },
                    UsageInfoLine {
                        keys: vec!["p".into()],
                        description: "to edit your profile".into(),
                    },
                    UsageInfoLine {
                        keys: vec!["Ctrl+l".into()],
                        description: "to log out".into(),
                    },
                ],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_names_trims_and_drops_empties() {
        assert_eq!(
            parse_member_names(" ayse , mehmet ,,"),
            vec!["ayse".to_string(), "mehmet".to_string()]
        );
        assert!(parse_member_names("  ").is_empty());
    }

    #[test]
    fn test_parse_yes_no() {
        assert!(parse_yes_no("y"));
        assert!(parse_yes_no(" Yes "));
        assert!(!parse_yes_no("n"));
        assert!(!parse_yes_no(""));
    }

    #[test]
    fn test_typing_line_formats_by_count() {
        assert_eq!(typing_line(&[]), None);
        assert_eq!(
            typing_line(&["ayse".to_string()]),
            Some("@ayse is typing...".to_string())
        );
        assert_eq!(
            typing_line(&["ayse".to_string(), "mehmet".to_string()]),
            Some("@ayse, @mehmet are typing...".to_string())
        );
    }
}
