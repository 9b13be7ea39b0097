use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::results::{PieProjection, PieSlice};
use crate::view::{PollDetails, ResultsSource};
use super::dialog::truncate_str;
use super::theme::Theme;

const TABLE_BAR_WIDTH: usize = 20;

pub fn render_poll_details(f: &mut Frame, details: &PollDetails, area: Rect, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Header
            Constraint::Length(4), // Share strip
            Constraint::Min(8),    // Chart and table
        ])
        .split(area);

    render_header(f, details, chunks[0], theme);
    render_share_strip(f, details, chunks[1], theme);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);

    render_bar_chart(f, details, lower[0], theme);
    render_table(f, details, lower[1], theme);
}

fn render_header(f: &mut Frame, details: &PollDetails, area: Rect, theme: &Theme) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(theme.text_muted());

    let mut meta = vec![
        Span::styled(
            details.status.to_string(),
            Style::default()
                .fg(theme.status_color(details.status))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} votes", details.projection.total_votes),
            muted,
        ),
    ];
    if let Some(ref category) = details.category {
        meta.push(Span::styled(format!("  #{}", category), muted));
    }

    let dates = match (details.start_date, details.end_date) {
        (Some(start), Some(end)) => format!(
            "{} to {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        ),
        (Some(start), None) => format!("from {}", start.format("%Y-%m-%d %H:%M")),
        (None, Some(end)) => format!("until {}", end.format("%Y-%m-%d %H:%M")),
        (None, None) => "no schedule".to_string(),
    };

    let mut lines = vec![
        Line::from(Span::styled(details.question.as_str(), bold)),
        Line::from(meta),
        Line::from(Span::styled(dates, muted)),
    ];
    if let Some(ref description) = details.description {
        lines.push(Line::raw(description.as_str()));
    }
    if let ResultsSource::ListFallback(ref reason) = details.source {
        lines.push(Line::from(Span::styled(
            format!("Live results unavailable, showing list counts ({})", reason),
            Style::default().fg(theme.warning()),
        )));
    }

    let header = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(format!("Poll {} [Esc: back | d: delete | r: reload]", details.id))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.primary())),
    );
    f.render_widget(header, area);
}

/// Split `width` cells among the slices, proportional to their arcs.
/// Boundaries are rounded from the cumulative percentages, so the segments
/// always fill the full width.
pub fn strip_segments(slices: &[PieSlice], width: usize) -> Vec<(usize, usize)> {
    let cell = |pct: f64| ((pct / 100.0) * width as f64).round() as usize;
    slices
        .iter()
        .map(|s| {
            let start = cell(s.start).min(width);
            let end = cell(s.end).min(width);
            (end.saturating_sub(start), s.color_index)
        })
        .collect()
}

fn render_share_strip(f: &mut Frame, details: &PollDetails, area: Rect, theme: &Theme) {
    let block = Block::default()
        .title("Share")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let width = block.inner(area).width as usize;

    let paragraph = match details.projection.pie {
        PieProjection::Empty => Paragraph::new("No votes yet")
            .style(Style::default().fg(theme.text_disabled()))
            .alignment(Alignment::Center),
        PieProjection::Slices(ref slices) => {
            let strip: Vec<Span> = strip_segments(slices, width)
                .into_iter()
                .filter(|(cells, _)| *cells > 0)
                .map(|(cells, color)| {
                    Span::styled("█".repeat(cells), Style::default().fg(theme.chart_color(color)))
                })
                .collect();
            let legend: Vec<Span> = slices
                .iter()
                .flat_map(|s| {
                    [
                        Span::styled("■ ", Style::default().fg(theme.chart_color(s.color_index))),
                        Span::raw(format!("{} {:.0}%  ", truncate_str(&s.label, 16), s.width())),
                    ]
                })
                .collect();
            Paragraph::new(vec![Line::from(strip), Line::from(legend)])
        }
    };

    f.render_widget(paragraph.block(block), area);
}

fn render_bar_chart(f: &mut Frame, details: &PollDetails, area: Rect, theme: &Theme) {
    let block = Block::default()
        .title("Votes")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    let options = details.projection.bars();
    if options.is_empty() {
        let empty = Paragraph::new("No options")
            .style(Style::default().fg(theme.text_disabled()))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let inner_width = block.inner(area).width as usize;
    let bar_width = (inner_width / options.len()).saturating_sub(1).clamp(1, 9) as u16;

    let bars: Vec<Bar> = options
        .iter()
        .map(|o| {
            Bar::default()
                .value(o.votes)
                .text_value(format!("{}%", o.percent))
                .label(Line::from(truncate_str(&o.label, bar_width as usize)))
                .style(Style::default().fg(theme.chart_color(o.color_index)))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1);
    f.render_widget(chart, area);
}

fn render_table(f: &mut Frame, details: &PollDetails, area: Rect, theme: &Theme) {
    let rows: Vec<Row> = details
        .projection
        .table_rows(TABLE_BAR_WIDTH)
        .into_iter()
        .map(|row| {
            let bar = format!(
                "{}{}",
                "█".repeat(row.bar_cells),
                "░".repeat(TABLE_BAR_WIDTH - row.bar_cells)
            );
            Row::new(vec![
                Cell::from(row.label),
                Cell::from(row.votes.to_string()),
                Cell::from(format!("{}%", row.percent)),
                Cell::from(bar).style(Style::default().fg(theme.chart_color(row.color_index))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(TABLE_BAR_WIDTH as u16),
        ],
    )
    .header(
        Row::new(vec!["Option", "Votes", "%", ""])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(format!("Results ({} total)", details.projection.total_votes))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(table, area);
}
