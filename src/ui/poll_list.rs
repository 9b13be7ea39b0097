use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::poll::Poll;
use crate::view::Banner;
use super::theme::Theme;

pub struct PollListState<'a> {
    pub polls: &'a [Poll],
    pub selected: usize,
    pub banner: &'a Banner,
    pub filter_label: String,
    pub backend: &'a str,
}

pub fn render_poll_list(f: &mut Frame, state: &PollListState, area: Rect, theme: &Theme) {
    let title = format!(
        "Polls ({}) [{}] [{}]",
        state.polls.len(),
        state.filter_label,
        state.backend
    );

    let list_area = match banner_line(state.banner, theme) {
        Some(line) if !state.polls.is_empty() => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(3)])
                .split(area);
            f.render_widget(Paragraph::new(line), chunks[0]);
            chunks[1]
        }
        Some(line) => {
            // Nothing to list: the banner is the whole content.
            let msg = Paragraph::new(vec![Line::raw(""), line])
                .alignment(Alignment::Center)
                .block(list_block(title, theme));
            f.render_widget(msg, area);
            return;
        }
        None => area,
    };

    let items: Vec<ListItem> = state
        .polls
        .iter()
        .map(|poll| ListItem::new(poll_line(poll, theme)))
        .collect();

    let list = List::new(items)
        .block(list_block(title, theme))
        .highlight_style(theme.highlight_style())
        .highlight_symbol("> ");

    let selected = state.selected.min(state.polls.len().saturating_sub(1));
    f.render_stateful_widget(
        list,
        list_area,
        &mut ListState::default().with_selected(Some(selected)),
    );
}

fn list_block(title: String, theme: &Theme) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.primary()))
}

fn poll_line<'a>(poll: &'a Poll, theme: &Theme) -> Line<'a> {
    let badge = format!("{:<9}", poll.status.to_string());
    let mut spans = vec![
        Span::styled(
            badge,
            Style::default()
                .fg(theme.status_color(poll.status))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(poll.question.as_str()),
        Span::styled(
            format!("  {} votes", poll.total_votes.max(poll.option_vote_sum())),
            Style::default().fg(theme.text_muted()),
        ),
    ];
    if let Some(ref category) = poll.category {
        spans.push(Span::styled(
            format!("  #{}", category),
            Style::default().fg(theme.text_disabled()),
        ));
    }
    Line::from(spans)
}

fn banner_line(banner: &Banner, theme: &Theme) -> Option<Line<'static>> {
    let message = banner.message()?;
    let color = match banner {
        Banner::Stale(_) => theme.warning(),
        Banner::Error(_) => theme.error(),
        _ => theme.text_muted(),
    };
    Some(Line::from(Span::styled(message, Style::default().fg(color))))
}
