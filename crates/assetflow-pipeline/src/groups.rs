//! Group queue of a pipeline.

use assetflow_core::{Group, GroupSpec};
use std::collections::VecDeque;

/// Pending, current and loaded groups. At most one group is current.
#[derive(Debug, Default)]
pub(crate) struct GroupQueue {
    pending: VecDeque<Group>,
    current: Option<Group>,
    loaded: Vec<Group>,
}

impl GroupQueue {
    pub(crate) fn new(specs: Vec<GroupSpec>) -> Self {
        Self {
            pending: specs.into_iter().map(Group::from).collect(),
            current: None,
            loaded: Vec::new(),
        }
    }

    /// Move the head of `pending` into `current` and reset its counters.
    ///
    /// Returns `None` when nothing is pending or a group is still current.
    pub(crate) fn start_next(&mut self) -> Option<&Group> {
        if self.current.is_some() {
            return None;
        }
        let mut group = self.pending.pop_front()?;
        group.start();
        let current: &Group = self.current.insert(group);
        Some(current)
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Group> {
        self.current.as_mut()
    }

    /// Move `current` into `loaded`.
    pub(crate) fn finish_current(&mut self) -> Option<&Group> {
        let group = self.current.take()?;
        self.loaded.push(group);
        self.loaded.last()
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub(crate) fn loaded_names(&self) -> Vec<&str> {
        self.loaded.iter().map(Group::name).collect()
    }

    pub(crate) fn pending_names(&self) -> Vec<&str> {
        self.pending.iter().map(Group::name).collect()
    }
}
