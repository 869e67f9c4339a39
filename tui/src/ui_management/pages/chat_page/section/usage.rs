use ratatui::{
    style::Stylize,
    text::{Line, Span, Text},
};

#[derive(Debug, Clone)]
pub struct UsageInfoLine {
    pub keys: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UsageInfo {
    pub description: Option<String>,
    pub lines: Vec<UsageInfoLine>,
}

pub trait HasUsageInfo {
    fn usage_info(&self) -> UsageInfo;
}

fn key_to_span<'a>(key: &String) -> Span<'a> {
    Span::from(format!("({})", key)).bold()
}

pub fn widget_usage_to_text<'a>(usage: UsageInfo) -> Text<'a> {
    let mut lines: Vec<Line> = vec![];
    if let Some(description) = usage.description {
        lines.push(Line::from(description));
    }

    for usage_line in usage.lines {
        let mut spans: Vec<Span> = Vec::with_capacity(usage_line.keys.len() * 2 + 1);

        for (idx, key) in usage_line.keys.iter().enumerate() {
            if idx > 0 {
                spans.push(if idx + 1 == usage_line.keys.len() {
                    " or ".into()
                } else {
                    ", ".into()
                });
            }
            spans.push(key_to_span(key));
        }

        spans.push(Span::from(format!(" {}", usage_line.description)));

        lines.push(Line::from(spans));
    }

    Text::from(lines)
}
