pub mod form;
pub mod message_input_box;
pub mod message_list;
pub mod room_list;

use ratatui::style::Color;

/// Maps a `#rrggbb` display color to a terminal color, falling back to the
/// terminal default for anything unparseable
pub fn user_color(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return Color::Reset;
    }

    match (
        u8::from_str_radix(&hex[0..2], 16),
        u8::from_str_radix(&hex[2..4], 16),
        u8::from_str_radix(&hex[4..6], 16),
    ) {
        (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
        _ => Color::Reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_color_parses_hex_triplets() {
        assert_eq!(user_color("#38bdf8"), Color::Rgb(0x38, 0xbd, 0xf8));
        assert_eq!(user_color("f87171"), Color::Rgb(0xf8, 0x71, 0x71));
    }

    #[test]
    fn test_user_color_falls_back_on_garbage() {
        assert_eq!(user_color(""), Color::Reset);
        assert_eq!(user_color("#zzzzzz"), Color::Reset);
        assert_eq!(user_color("#fff"), Color::Reset);
    }
}
