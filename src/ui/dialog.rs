use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::theme::Theme;

/// Confirmation popup shown before a poll is deleted.
pub fn render_confirm_delete(f: &mut Frame, question: &str, area: Rect, theme: &Theme) {
    let popup_width = 54.min(area.width.saturating_sub(4));
    let popup_height = 7;
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height.min(area.height));

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Delete Poll ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.error()));

    f.render_widget(block.clone(), popup_area);

    let inner = block.inner(popup_area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(inner);

    let msg = Paragraph::new(format!(
        "Delete '{}'?",
        truncate_str(question, (popup_width as usize).saturating_sub(12).max(8))
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(msg, chunks[0]);

    let help_text = Paragraph::new("y: delete | n/Esc: cancel")
        .style(Style::default().fg(theme.text_disabled()))
        .alignment(Alignment::Center);
    f.render_widget(help_text, chunks[1]);
}

/// Shorten `s` to at most `max_chars` characters, ending in "..." when cut.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
