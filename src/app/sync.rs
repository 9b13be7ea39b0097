//! Reconciler event handling.
//!
//! Fetch results, change signals and reconciliation ticks queue up inside
//! the [`Reconciler`](crate::reconciler::Reconciler). `poll_sync` applies
//! whatever is ready so the next frame shows it.

use super::App;

impl App {
    /// Apply queued reconciler events. Called every pass of the main loop.
    pub async fn poll_sync(&mut self) {
        let was_degraded = self.reconciler.state().is_degraded();
        let changed = self.reconciler.drain_ready().await;
        if changed == 0 {
            return;
        }

        self.clamp_selection();

        let state = self.reconciler.state();
        let count = state.polls().len();
        let now_degraded = state.is_degraded();
        let error = state.error().map(|e| e.to_string());

        match (was_degraded, now_degraded, error) {
            (false, true, Some(e)) => {
                self.add_debug(format!("⟳ Store unavailable, showing {} cached polls: {}", count, e));
            }
            (true, false, _) => {
                self.add_debug(format!("⟳ Store reachable again ({} polls)", count));
            }
            (_, _, Some(e)) if count == 0 => {
                self.add_debug(format!("⟳ Could not load polls: {}", e));
            }
            _ => {
                self.add_debug(format!("⟳ Poll list updated ({} polls)", count));
            }
        }
    }
}
