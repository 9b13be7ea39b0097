use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use super::theme::Theme;

pub struct StatusBarState {
    pub in_details: bool,
    pub confirming_delete: bool,
    /// `Some` in demo mode: whether the simulated outage is on.
    pub outage: Option<bool>,
    pub status_message: Option<(String, bool)>, // (message, is_error)
}

pub fn render_status_bar(
    f: &mut Frame,
    state: &StatusBarState,
    area: ratatui::layout::Rect,
    theme: &Theme,
) {
    let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::BOLD));

    let status_bar = if let Some((ref msg, is_error)) = state.status_message {
        let color = if is_error { theme.error() } else { theme.success() };
        Paragraph::new(Line::from(vec![
            Span::styled(
                if is_error { "ERROR" } else { "INFO" },
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(": "),
            Span::styled(msg.as_str(), Style::default().fg(color)),
        ]))
    } else if state.confirming_delete {
        Paragraph::new(Line::from(vec![
            Span::styled(
                "CONFIRM",
                Style::default().fg(theme.error()).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | "),
            key("y"),
            Span::raw(": delete | "),
            key("n/Esc"),
            Span::raw(": cancel"),
        ]))
    } else {
        let mut spans = vec![
            Span::styled(
                if state.in_details { "DETAILS" } else { "POLLS" },
                Style::default().fg(theme.primary()).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | "),
        ];
        if state.in_details {
            spans.extend([key("Esc"), Span::raw(": back | ")]);
        } else {
            spans.extend([
                key("jk"),
                Span::raw(": move | "),
                key("Enter"),
                Span::raw(": open | "),
                key("f"),
                Span::raw(": filter | "),
            ]);
        }
        spans.extend([
            key("r"),
            Span::raw(": refresh | "),
            key("d"),
            Span::raw(": delete | "),
        ]);
        if let Some(outage) = state.outage {
            spans.push(key("o"));
            spans.push(Span::raw(if outage { ": end outage | " } else { ": outage | " }));
        }
        spans.extend([key("D"), Span::raw(": debug | "), key("q"), Span::raw(": quit")]);
        Paragraph::new(Line::from(spans))
    };

    let status_bar = status_bar.block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(status_bar, area);
}
