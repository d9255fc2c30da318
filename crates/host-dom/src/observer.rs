use std::collections::BTreeMap;

use crate::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(usize);

/// What an observer registration listens to, mirroring `MutationObserverInit`.
#[derive(Debug, Clone, Default)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub attributes: bool,
    /// Limits attribute records to these names. `None` accepts every attribute.
    pub attribute_filter: Option<Vec<String>>,
    pub character_data: bool,
}

impl ObserveOptions {
    fn accepts(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::CharacterData => self.character_data,
            MutationKind::Attributes { name } => {
                self.attributes
                    && self
                        .attribute_filter
                        .as_ref()
                        .is_none_or(|filter| filter.iter().any(|f| f == name))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes { name: String },
    CharacterData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

#[derive(Debug)]
struct Registration {
    target: NodeId,
    options: ObserveOptions,
    queue: Vec<MutationRecord>,
}

/// Disconnected observers are dropped, so re-attaching observers does not
/// accumulate registrations. Ids are never reused.
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    registrations: BTreeMap<ObserverId, Registration>,
    next_id: usize,
}

impl ObserverRegistry {
    pub(crate) fn register(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.registrations.insert(
            id,
            Registration {
                target,
                options,
                queue: Vec::new(),
            },
        );
        id
    }

    pub(crate) fn disconnect(&mut self, id: ObserverId) {
        self.registrations.remove(&id);
    }

    pub(crate) fn is_connected(&self, id: ObserverId) -> bool {
        self.registrations.contains_key(&id)
    }

    pub(crate) fn take(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.registrations
            .get_mut(&id)
            .map(|r| std::mem::take(&mut r.queue))
            .unwrap_or_default()
    }

    /// `ancestors` holds the inclusive ancestor chain of `record.target`,
    /// starting with the target itself.
    pub(crate) fn deliver(&mut self, record: &MutationRecord, ancestors: &[NodeId]) {
        for reg in self.registrations.values_mut() {
            let in_scope = match ancestors.iter().position(|a| *a == reg.target) {
                Some(0) => true,
                Some(_) => reg.options.subtree,
                None => false,
            };
            if in_scope && reg.options.accepts(&record.kind) {
                reg.queue.push(record.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_drops_registration() {
        let mut registry = ObserverRegistry::default();
        let options = ObserveOptions {
            child_list: true,
            ..Default::default()
        };

        for _ in 0..5 {
            let id = registry.register(NodeId(0), options.clone());
            registry.disconnect(id);
        }
        let live = registry.register(NodeId(0), options);

        assert_eq!(registry.registrations.len(), 1);
        assert!(registry.is_connected(live));
        assert!(!registry.is_connected(ObserverId(0)));

        let record = MutationRecord {
            target: NodeId(0),
            kind: MutationKind::ChildList,
        };
        registry.deliver(&record, &[NodeId(0)]);
        assert_eq!(registry.take(live), vec![record]);
        assert!(registry.take(ObserverId(0)).is_empty());
    }
}
