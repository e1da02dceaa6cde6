// src/aggregator/board.rs
use crate::aggregator::StatusSnapshot;
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Latest-snapshot cell shared between the watch loop and whatever renders it.
/// Each publish supersedes the previous snapshot wholesale.
pub struct StatusBoard {
    latest: ArcSwapOption<StatusSnapshot>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            latest: ArcSwapOption::from(None),
        }
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.latest.store(Some(Arc::new(snapshot)));
    }

    pub fn latest(&self) -> Option<Arc<StatusSnapshot>> {
        self.latest.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_supersedes() {
        let board = StatusBoard::new();
        assert!(board.latest().is_none());

        board.publish(StatusSnapshot::new(Vec::new()));
        let first = board.latest().unwrap();

        board.publish(StatusSnapshot::new(Vec::new()));
        let second = board.latest().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }
}
