//! Events published by the sequencer.

use assetflow_core::{Group, LoadError, NamedEvent, Resource};
use assetflow_loader::Asset;

/// Sequencer bus payload.
///
/// | name | when |
/// |---|---|
/// | `progress` | a resource was loaded and stored |
/// | `error` | a resource could not be loaded |
/// | `groupEnd` | every resource of a group is accounted for |
/// | `end` | the last group finished |
///
/// `group` is a snapshot taken when the event was published, so
/// `group.loaded()` counts this completion.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Progress {
        group: Group,
        resource: Resource,
        /// Stored item; `None` when the handler produced no payload
        item: Option<Asset>,
    },
    Failed {
        group: Group,
        resource: Resource,
        error: LoadError,
    },
    GroupEnd {
        group: Group,
    },
    End,
}

impl PipelineEvent {
    /// Group snapshot carried by the event, if any
    pub fn group(&self) -> Option<&Group> {
        match self {
            PipelineEvent::Progress { group, .. }
            | PipelineEvent::Failed { group, .. }
            | PipelineEvent::GroupEnd { group } => Some(group),
            PipelineEvent::End => None,
        }
    }

    pub fn group_name(&self) -> Option<&str> {
        self.group().map(Group::name)
    }

    /// Resource the event belongs to, if any
    pub fn resource(&self) -> Option<&Resource> {
        match self {
            PipelineEvent::Progress { resource, .. } | PipelineEvent::Failed { resource, .. } => {
                Some(resource)
            }
            _ => None,
        }
    }
}

impl NamedEvent for PipelineEvent {
    fn name(&self) -> &'static str {
        match self {
            PipelineEvent::Progress { .. } => "progress",
            PipelineEvent::Failed { .. } => "error",
            PipelineEvent::GroupEnd { .. } => "groupEnd",
            PipelineEvent::End => "end",
        }
    }

    fn description(&self) -> String {
        match self {
            PipelineEvent::Progress {
                group, resource, ..
            } => format!("progress {}/{}", group.name(), resource.name),
            PipelineEvent::Failed {
                group, resource, ..
            } => format!("error {}/{}", group.name(), resource.name),
            PipelineEvent::GroupEnd { group } => format!("groupEnd {}", group.name()),
            PipelineEvent::End => "end".to_string(),
        }
    }
}
