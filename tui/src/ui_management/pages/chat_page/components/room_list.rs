use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::{Backend, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use super::super::section::usage::{HasUsageInfo, UsageInfo, UsageInfoLine};
use crate::{
    state_store::{action::Action, State},
    ui_management::pages::chat_page::section::SectionActivation,
};

use crate::ui_management::components::{Component, ComponentRender};

pub struct RoomItem {
    pub id: String,
    pub name: String,
    pub member_count: usize,
}

struct Props {
    /// Known rooms in server order
    rooms: Vec<RoomItem>,
    /// Resolved active room id
    active_room_id: Option<String>,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Self {
            rooms: state
                .rooms
                .iter()
                .map(|room| RoomItem {
                    id: room.id.clone(),
                    name: room.name.clone(),
                    member_count: room.members.len(),
                })
                .collect(),
            active_room_id: state.active_room_id().map(str::to_string),
        }
    }
}

pub struct RoomList {
    /// Sending actions to the state store
    action_tx: UnboundedSender<Action>,
    props: Props,
    // Internal Component State
    /// List with optional selection and current offset
    pub list_state: ListState,
}

impl RoomList {
    fn next(&mut self) {
        if self.props.rooms.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= self.props.rooms.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.props.rooms.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.props.rooms.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };

        self.list_state.select(Some(i));
    }

    pub(super) fn rooms(&self) -> &Vec<RoomItem> {
        &self.props.rooms
    }

    fn get_room_idx(&self, id: &str) -> Option<usize> {
        self.props.rooms.iter().position(|room| room.id == id)
    }
}

impl Component for RoomList {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            props: Props::from(state),
            //
            list_state: ListState::default(),
        }
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        Self {
            props: Props::from(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Room List"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Up => {
                self.previous();
            }
            KeyCode::Down => {
                self.next();
            }
            KeyCode::Enter => {
                if let Some(room) = self
                    .list_state
                    .selected()
                    .and_then(|idx| self.props.rooms.get(idx))
                {
                    let _ = self.action_tx.send(Action::SelectRoom {
                        room_id: room.id.clone(),
                    });
                }
            }
            _ => (),
        }
    }
}

impl SectionActivation for RoomList {
    fn activate(&mut self) {
        let idx: usize = self
            .props
            .active_room_id
            .as_ref()
            .and_then(|id| self.get_room_idx(id))
            .unwrap_or(0);

        *self.list_state.offset_mut() = 0;
        self.list_state.select(Some(idx));
    }

    fn deactivate(&mut self) {
        *self.list_state.offset_mut() = 0;
        self.list_state.select(None);
    }
}

pub struct RenderProps {
    pub border_color: Color,
    pub area: Rect,
}

impl ComponentRender<RenderProps> for RoomList {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        let active_room_id = self.props.active_room_id.clone();
        let room_list: Vec<ListItem> = self
            .rooms()
            .iter()
            .map(|room| {
                let content = Line::from(Span::raw(format!(
                    "#{} ({})",
                    room.name, room.member_count
                )));

                let style = if self.list_state.selected().is_none()
                    && active_room_id.as_deref() == Some(room.id.as_str())
                {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                ListItem::new(content).style(style.bg(Color::Reset))
            })
            .collect();

        let room_list = List::new(room_list)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::new().fg(props.border_color))
                    .title("Rooms"),
            )
            .highlight_style(
                Style::default()
                    // yellow that would work for both dark / light modes
                    .bg(Color::Rgb(255, 223, 102))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">");

        let mut app_room_list_state = self.list_state.clone();
        frame.render_stateful_widget(room_list, props.area, &mut app_room_list_state);
    }
}

impl HasUsageInfo for RoomList {
    fn usage_info(&self) -> UsageInfo {
        UsageInfo {
            description: Some("Select the room to talk in".into()),
            lines: vec![
                UsageInfoLine {
                    keys: vec!["Esc".into()],
                    description: "to cancel".into(),
                },
                UsageInfoLine {
                    keys: vec!["↑".into(), "↓".into()],
                    description: "to navigate".into(),
                },
                UsageInfoLine {
                    keys: vec!["Enter".into()],
                    description: "to switch to the room".into(),
                },
            ],
        }
    }
}
