use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::domain::error::{AppError, Result};

/// What a page shows: a spinner, its content, or an error with a retry control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum PageState<T> {
    Loading,
    Ready(T),
    Failed(AppError),
}

/// Proof that a load was started. Only the newest ticket may write its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

struct Slot<T> {
    generation: u64,
    disposed: bool,
    state: PageState<T>,
}

/// Owner-side state cell of one page view.
///
/// A load that resolves after a newer load started, or after `dispose`, is
/// dropped instead of overwriting the cell.
pub struct PageCell<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Default for PageCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PageCell<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                generation: 0,
                disposed: false,
                state: PageState::Loading,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks the page as loading. `None` once the page is disposed.
    pub fn begin(&self) -> Option<LoadTicket> {
        let mut slot = self.lock();
        if slot.disposed {
            return None;
        }
        slot.generation += 1;
        slot.state = PageState::Loading;
        Some(LoadTicket {
            generation: slot.generation,
        })
    }

    /// Stores the outcome of the load behind `ticket`. Returns whether it was applied.
    pub fn complete(&self, ticket: LoadTicket, outcome: Result<T>) -> bool {
        let mut slot = self.lock();
        if slot.disposed || slot.generation != ticket.generation {
            debug!(
                ticket = ticket.generation,
                current = slot.generation,
                disposed = slot.disposed,
                "Dropping stale page update"
            );
            return false;
        }
        slot.state = match outcome {
            Ok(value) => PageState::Ready(value),
            Err(err) => PageState::Failed(err),
        };
        true
    }

    pub fn dispose(&self) {
        self.lock().disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }
}

impl<T: Clone> PageCell<T> {
    pub fn snapshot(&self) -> PageState<T> {
        self.lock().state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_load_wins() {
        let cell: PageCell<u32> = PageCell::new();
        let first = cell.begin().unwrap();
        let second = cell.begin().unwrap();

        assert!(cell.complete(second, Ok(2)));
        assert!(!cell.complete(first, Ok(1)));
        assert_eq!(cell.snapshot(), PageState::Ready(2));
    }

    #[test]
    fn writes_after_dispose_are_dropped() {
        let cell: PageCell<u32> = PageCell::new();
        let ticket = cell.begin().unwrap();
        cell.dispose();

        assert!(!cell.complete(ticket, Ok(7)));
        assert_eq!(cell.snapshot(), PageState::Loading);
        assert!(cell.begin().is_none());
    }

    #[test]
    fn failure_replaces_content() {
        let cell: PageCell<u32> = PageCell::new();
        let ticket = cell.begin().unwrap();
        cell.complete(ticket, Ok(1));

        let retry = cell.begin().unwrap();
        assert_eq!(cell.snapshot(), PageState::Loading);
        cell.complete(retry, Err(AppError::TimedOut("GET /api/defects".to_string())));
        assert!(matches!(cell.snapshot(), PageState::Failed(AppError::TimedOut(_))));
    }
}
