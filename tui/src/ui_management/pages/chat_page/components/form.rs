use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::{Backend, Rect},
    style::Color,
    widgets::{Block, Borders, Clear},
    Frame,
};

use crate::ui_management::components::{
    input_box::{self, InputBox},
    Component, ComponentRender,
};

struct FormField {
    label: String,
    input: InputBox,
}

/// A centered popup with a vertical stack of labelled input boxes.
///
/// The owning page decides when the form opens and closes; the form itself
/// only reports whether enter was pressed.
pub struct Form {
    title: String,
    fields: Vec<FormField>,
    active_field: usize,
}

impl Form {
    pub fn new(title: &str, labels: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            fields: labels
                .iter()
                .map(|label| FormField {
                    label: label.to_string(),
                    input: InputBox::default(),
                })
                .collect(),
            active_field: 0,
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields[idx].input.text()
    }

    pub fn set_value(&mut self, idx: usize, value: &str) {
        self.fields[idx].input.set_text(value);
    }

    pub fn reset(&mut self) {
        for field in self.fields.iter_mut() {
            field.input.reset();
        }
        self.active_field = 0;
    }

    fn focus_next(&mut self) {
        self.active_field = (self.active_field + 1) % self.fields.len();
    }

    fn focus_previous(&mut self) {
        self.active_field = if self.active_field == 0 {
            self.fields.len() - 1
        } else {
            self.active_field - 1
        };
    }

    /// Routes a key to the form. Returns true when the form was submitted.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }

        match key.code {
            KeyCode::Enter => return true,
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            _ => self.fields[self.active_field].input.handle_key_event(key),
        }

        false
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

impl ComponentRender<()> for Form {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, _props: ()) {
        let height = self.fields.len() as u16 * 3 + 2;
        let area = centered_rect(50, height, frame.size());

        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(ratatui::style::Style::new().fg(Color::Yellow))
            .title(self.title.clone());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        for (idx, field) in self.fields.iter().enumerate() {
            let field_area = Rect::new(inner.x, inner.y + idx as u16 * 3, inner.width, 3);
            let is_active = idx == self.active_field;

            field.input.render(
                frame,
                input_box::RenderProps {
                    title: field.label.clone(),
                    area: field_area,
                    border_color: if is_active { Color::Yellow } else { Color::Reset },
                    show_cursor: is_active,
                    masked: false,
                },
            );
        }
    }
}
