use ratatui::style::{Color, Modifier, Style};

use crate::config::UiConfig;
use crate::poll::PollStatus;

/// Colors used by the admin view. Chart colors come from the configured
/// palette and are picked by option position.
#[derive(Debug, Clone)]
pub struct Theme {
    palette: Vec<Color>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&UiConfig::default())
    }
}

impl Theme {
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut palette: Vec<Color> = ui.palette.iter().map(|c| Self::parse_color(c)).collect();
        if palette.is_empty() {
            palette.push(Color::Cyan);
        }
        Self { palette }
    }

    /// Parse a color string to ratatui Color
    pub fn parse_color(color_str: &str) -> Color {
        match color_str.trim() {
            "Reset" => Color::Reset,
            "Black" => Color::Black,
            "Red" => Color::Red,
            "Green" => Color::Green,
            "Yellow" => Color::Yellow,
            "Blue" => Color::Blue,
            "Magenta" => Color::Magenta,
            "Cyan" => Color::Cyan,
            "Gray" | "Grey" => Color::Gray,
            "DarkGray" | "DarkGrey" => Color::DarkGray,
            "LightRed" => Color::LightRed,
            "LightGreen" => Color::LightGreen,
            "LightYellow" => Color::LightYellow,
            "LightBlue" => Color::LightBlue,
            "LightMagenta" => Color::LightMagenta,
            "LightCyan" => Color::LightCyan,
            "White" => Color::White,
            s if s.starts_with('#') => match parse_hex_color(s) {
                Some((r, g, b)) => Color::Rgb(r, g, b),
                None => Color::Reset,
            },
            s => s.parse::<u8>().map(Color::Indexed).unwrap_or(Color::Reset),
        }
    }

    pub fn palette_size(&self) -> usize {
        self.palette.len()
    }

    /// Chart color for an option's `color_index`.
    pub fn chart_color(&self, color_index: usize) -> Color {
        self.palette[color_index % self.palette.len()]
    }

    pub fn status_color(&self, status: PollStatus) -> Color {
        match status {
            PollStatus::Active => self.success(),
            PollStatus::Upcoming => self.warning(),
            PollStatus::Inactive => self.text_muted(),
        }
    }

    pub fn primary(&self) -> Color {
        Color::Cyan
    }

    pub fn success(&self) -> Color {
        Color::Green
    }

    pub fn warning(&self) -> Color {
        Color::Yellow
    }

    pub fn error(&self) -> Color {
        Color::Red
    }

    pub fn text_muted(&self) -> Color {
        Color::Gray
    }

    pub fn text_disabled(&self) -> Color {
        Color::DarkGray
    }

    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }
}

fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
