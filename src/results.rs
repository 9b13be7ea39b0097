//! Vote-distribution math for the results views.
//!
//! Everything here is pure. One ordered projection of the options feeds the
//! pie, bar and table presentations, so they always agree on order and
//! color. Colors are assigned by list position, never by vote count, so they
//! stay put as votes come in.

use crate::poll::Stats;

pub const DEFAULT_PALETTE_SIZE: usize = 8;

/// Rounded share of `votes` in `total`, in whole percent. Zero when
/// `total` is zero.
pub fn percent(votes: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    // Round half up in integer space.
    let scaled = (votes as u128 * 200 + total as u128) / (2 * total as u128);
    scaled.min(u32::MAX as u128) as u32
}

/// One option, ready for any of the three presentations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionProjection {
    pub label: String,
    pub votes: u64,
    pub percent: u32,
    pub color_index: usize,
}

/// One arc of the pie, as a cumulative percent range.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub votes: u64,
    pub start: f64,
    pub end: f64,
    pub color_index: usize,
}

impl PieSlice {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PieProjection {
    /// No votes yet: render a placeholder, not zero-width arcs.
    Empty,
    Slices(Vec<PieSlice>),
}

/// A table row with a proportional bar measured in cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    pub votes: u64,
    pub percent: u32,
    pub bar_cells: usize,
    pub color_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsProjection {
    pub total_votes: u64,
    pub options: Vec<OptionProjection>,
    pub pie: PieProjection,
}

impl ResultsProjection {
    pub fn from_stats(stats: &Stats, palette_size: usize) -> Self {
        let options = project_options(stats, palette_size);
        let pie = pie_projection(&options);
        Self {
            total_votes: stats.total_votes,
            options,
            pie,
        }
    }

    /// Bars in option order.
    pub fn bars(&self) -> &[OptionProjection] {
        &self.options
    }

    /// Table rows with bars scaled to `bar_width` cells at 100%.
    pub fn table_rows(&self, bar_width: usize) -> Vec<TableRow> {
        self.options
            .iter()
            .map(|o| TableRow {
                label: o.label.clone(),
                votes: o.votes,
                percent: o.percent,
                bar_cells: bar_cells(o.percent, bar_width),
                color_index: o.color_index,
            })
            .collect()
    }
}

/// Project options in their stored order with position-based colors.
pub fn project_options(stats: &Stats, palette_size: usize) -> Vec<OptionProjection> {
    let palette_size = palette_size.max(1);
    stats
        .option_stats
        .iter()
        .enumerate()
        .map(|(i, option)| OptionProjection {
            label: option.label.clone(),
            votes: option.votes,
            percent: percent(option.votes, stats.total_votes),
            color_index: i % palette_size,
        })
        .collect()
}

/// Contiguous arcs covering 0..100, in option order. Options without votes
/// get no arc.
pub fn pie_projection(options: &[OptionProjection]) -> PieProjection {
    let sum: u64 = options.iter().map(|o| o.votes).sum();
    if sum == 0 {
        return PieProjection::Empty;
    }

    let mut slices = Vec::new();
    let mut cumulative = 0u64;
    for option in options.iter().filter(|o| o.votes > 0) {
        let start = cumulative as f64 * 100.0 / sum as f64;
        cumulative += option.votes;
        let end = cumulative as f64 * 100.0 / sum as f64;
        slices.push(PieSlice {
            label: option.label.clone(),
            votes: option.votes,
            start,
            end,
            color_index: option.color_index,
        });
    }
    PieProjection::Slices(slices)
}

/// Cells of a `width`-cell bar filled at `percent`.
pub fn bar_cells(percent: u32, width: usize) -> usize {
    let filled = (percent.min(100) as usize * width + 50) / 100;
    filled.min(width)
}
