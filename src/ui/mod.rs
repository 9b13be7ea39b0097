pub mod dialog;
pub mod poll_details;
pub mod poll_list;
pub mod status_bar;
pub mod theme;

pub use dialog::render_confirm_delete;
pub use poll_details::render_poll_details;
pub use poll_list::{render_poll_list, PollListState};
pub use status_bar::{render_status_bar, StatusBarState};
pub use theme::Theme;
