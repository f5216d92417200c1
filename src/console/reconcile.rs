//! Live reconciliation after snapshot replacement
//!
//! The operator holds two references into the inventory: the focused guest
//! in the detail panel and an optional one-shot highlight target from a
//! global search. Each snapshot replaces the mirror wholesale, so both
//! references must be re-bound by identity against the fresh data without
//! the operator losing their place.

use crate::models::{Resource, Snapshot};

use super::engine;
use super::ViewState;

/// What reconciliation changed, mostly for logging
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// The focused guest's rendered copy was replaced with fresher data
    pub focus_refreshed: bool,
    /// The focused guest vanished from the snapshot and focus was cleared
    pub focus_cleared: bool,
    /// A highlight request resolved to this page
    pub jumped_to_page: Option<u32>,
    /// The persisted page went past the shrunken filtered set and was reset
    pub page_reset: bool,
}

/// Re-bind focus and highlight against a fresh snapshot.
///
/// Idempotent: a second application against the same snapshot finds the
/// focused copy already up to date and the highlight request already
/// consumed, and changes nothing. Selection is deliberately never touched
/// here.
pub fn reconcile(
    view: &mut ViewState,
    focused: &mut Option<Resource>,
    snapshot: &Snapshot,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    // 1. Detail panel: replace the rendered copy if the guest still exists
    //    and changed, clear focus if it vanished.
    if let Some(id) = view.focused_id {
        match snapshot.resource(id) {
            Some(fresh) => {
                if focused.as_ref() != Some(fresh) {
                    *focused = Some(fresh.clone());
                    outcome.focus_refreshed = true;
                }
            }
            None => {
                view.focused_id = None;
                *focused = None;
                outcome.focus_cleared = true;
            }
        }
    }

    let filtered = engine::filtered_ids(&snapshot.resources, &view.query);

    // 2. One-shot highlight: find the target's position in the filtered,
    //    sorted sequence and jump to the page containing it. Consumed
    //    either way so later snapshots do not re-trigger the scroll.
    if let Some(id) = view.highlight_request.take() {
        if let Some(position) = filtered.iter().position(|&fid| fid == id) {
            let page = position as u32 / view.page_size.as_u32() + 1;
            view.page = page;
            outcome.jumped_to_page = Some(page);
        }
    }

    // 3. The persisted page goes stale when the filtered set shrinks.
    //    Render-time clamping alone would keep the stale number around and
    //    yank the operator back to it once the set grows again, so it is
    //    reset outright.
    let total_pages = filtered
        .len()
        .div_ceil(view.page_size.as_u32() as usize)
        .max(1) as u32;
    if view.page > total_pages {
        view.page = 1;
        outcome.page_reset = true;
    }

    outcome
}
