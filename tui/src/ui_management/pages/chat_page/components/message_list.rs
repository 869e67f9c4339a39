use comms::types::Message;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::{Backend, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use super::super::section::usage::{HasUsageInfo, UsageInfo, UsageInfoLine};
use super::user_color;
use crate::{
    state_store::{action::Action, State},
    ui_management::pages::chat_page::section::SectionActivation,
};

use crate::ui_management::components::{Component, ComponentRender};

/// The fixed reaction palette, toggled with the number keys
pub const EMOJIS: [&str; 6] = ["👍", "❤️", "😂", "😮", "🎉", "🔥"];

struct Props {
    /// Messages of the active room in arrival order
    messages: Vec<Message>,
    current_user_id: Option<String>,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Self {
            messages: state
                .active_room_messages()
                .map(|messages| messages.asc_iter().cloned().collect())
                .unwrap_or_default(),
            current_user_id: state.current_user().map(|user| user.id.clone()),
        }
    }
}

pub struct MessageList {
    action_tx: UnboundedSender<Action>,
    props: Props,
    // Internal Component State
    pub list_state: ListState,
}

impl MessageList {
    fn next(&mut self) {
        if self.props.messages.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.props.messages.len() - 1),
            None => self.props.messages.len() - 1,
        };
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.props.messages.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => self.props.messages.len() - 1,
        };
        self.list_state.select(Some(i));
    }

    fn toggle_reaction(&mut self, palette_idx: usize) {
        let Some(message) = self
            .list_state
            .selected()
            .and_then(|idx| self.props.messages.get(idx))
        else {
            return;
        };

        let _ = self.action_tx.send(Action::ToggleReaction {
            message_id: message.id.clone(),
            emoji: EMOJIS[palette_idx].to_string(),
        });
    }
}

/// Collects per-emoji counts in first-appearance order, remembering whether
/// the local user is among the reactors
fn reaction_summary(message: &Message, current_user_id: Option<&str>) -> Vec<(String, usize, bool)> {
    let mut summary: Vec<(String, usize, bool)> = Vec::new();

    for reaction in &message.reactions {
        let mine = Some(reaction.user.id.as_str()) == current_user_id;

        match summary.iter_mut().find(|(emoji, ..)| *emoji == reaction.emoji) {
            Some((_, count, own)) => {
                *count += 1;
                *own |= mine;
            }
            None => summary.push((reaction.emoji.clone(), 1, mine)),
        }
    }

    summary
}

/// Index of the first message that still fits when rendering bottom-up
fn tail_offset(messages: &[Message], height: u16) -> usize {
    let budget = height.saturating_sub(2) as usize;
    let mut used = 0;

    for (idx, message) in messages.iter().enumerate().rev() {
        let lines = if message.reactions.is_empty() { 2 } else { 3 };

        if used + lines > budget {
            return idx + 1;
        }
        used += lines;
    }

    0
}

impl Component for MessageList {
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
        "Messages"
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
            KeyCode::Char(digit @ '1'..='6') => {
                self.toggle_reaction(digit as usize - '1' as usize);
            }
            _ => (),
        }
    }
}

impl SectionActivation for MessageList {
    fn activate(&mut self) {
        *self.list_state.offset_mut() = 0;

        if !self.props.messages.is_empty() {
            self.list_state.select(Some(self.props.messages.len() - 1));
        }
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

impl ComponentRender<RenderProps> for MessageList {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        let is_active = self.list_state.selected().is_some();

        // when idle, pin the view to the latest messages; when navigating,
        // the list state scrolls to the selection over the full history
        let skip = if is_active {
            0
        } else {
            tail_offset(&self.props.messages, props.area.height)
        };

        let items: Vec<ListItem> = self
            .props
            .messages
            .iter()
            .skip(skip)
            .map(|message| {
                let mut lines = vec![
                    Line::from(vec![
                        Span::styled(
                            message
                                .created_at
                                .with_timezone(&chrono::Local)
                                .format("%H:%M ")
                                .to_string(),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::styled(
                            format!("@{}", message.sender.username),
                            Style::default()
                                .fg(user_color(&message.sender.display_color))
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(Span::raw(message.content.clone())),
                ];

                let reactions = reaction_summary(message, self.props.current_user_id.as_deref());
                if !reactions.is_empty() {
                    let mut spans: Vec<Span> = Vec::with_capacity(reactions.len());
                    for (emoji, count, own) in reactions {
                        let label = format!("{} {}  ", emoji, count);
                        spans.push(if own {
                            Span::from(label).bold().underlined()
                        } else {
                            Span::from(label)
                        });
                    }
                    lines.push(Line::from(spans));
                }

                ListItem::new(Text::from(lines))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::new().fg(props.border_color))
                    .title("Messages"),
            )
            .highlight_style(Style::default().bg(Color::Rgb(60, 60, 60)));

        let mut list_state = self.list_state.clone();
        frame.render_stateful_widget(list, props.area, &mut list_state);
    }
}

impl HasUsageInfo for MessageList {
    fn usage_info(&self) -> UsageInfo {
        UsageInfo {
            description: Some("React to the messages of the room".into()),
            lines: vec![
                UsageInfoLine {
                    keys: vec!["Esc".into()],
                    description: "to cancel".into(),
                },
                UsageInfoLine {
                    keys: vec!["↑".into(), "↓".into()],
                    description: "to select a message".into(),
                },
                UsageInfoLine {
                    keys: vec!["1-6".into()],
                    description: "to toggle a reaction".into(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use comms::types::{Reaction, Sender};

    use super::*;

    fn message_with_reactions(reactions: Vec<(&str, &str)>) -> Message {
        Message {
            id: "m-1".to_string(),
            room_id: "r-1".to_string(),
            content: "hello".to_string(),
            created_at: Utc::now(),
            sender: Sender {
                id: "u-1".to_string(),
                username: "ayse".to_string(),
                display_color: "#38bdf8".to_string(),
            },
            reactions: reactions
                .into_iter()
                .enumerate()
                .map(|(idx, (user_id, emoji))| Reaction {
                    id: format!("re-{}", idx),
                    emoji: emoji.to_string(),
                    user: Sender {
                        id: user_id.to_string(),
                        username: user_id.to_string(),
                        display_color: "#38bdf8".to_string(),
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn test_reaction_summary_groups_and_marks_own() {
        let message = message_with_reactions(vec![
            ("u-2", "👍"),
            ("u-1", "👍"),
            ("u-3", "🔥"),
        ]);

        let summary = reaction_summary(&message, Some("u-1"));

        assert_eq!(
            summary,
            vec![
                ("👍".to_string(), 2, true),
                ("🔥".to_string(), 1, false),
            ]
        );
    }

    #[test]
    fn test_tail_offset_keeps_the_latest_messages() {
        let messages: Vec<Message> = (0..10)
            .map(|_| message_with_reactions(vec![]))
            .collect();

        // 8 usable lines at 2 lines per message leaves the last 4 visible
        assert_eq!(tail_offset(&messages, 10), 6);
        // everything fits in a tall container
        assert_eq!(tail_offset(&messages, 50), 0);
    }
}
