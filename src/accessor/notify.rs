//! Change notification bridge
//!
//! Every stored property write is bracketed by `will_change` /
//! `did_change`. The closing half lives in [`ChangeScope`]'s `Drop`, so it
//! runs on the error path of the write as well.

use crate::core::{PropertyDescriptor, RowHandle};
use log::trace;
use std::sync::{Arc, Mutex};

/// Observer attached to a session.
pub trait ChangeObserver: Send + Sync {
    fn will_change(&self, row: RowHandle, property: &PropertyDescriptor);

    fn did_change(&self, row: RowHandle, property: &PropertyDescriptor);
}

#[derive(Default, Clone)]
pub struct ChangeNotifier {
    observers: Vec<Arc<dyn ChangeObserver>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    /// Fires `will_change` and returns the scope that fires `did_change`.
    pub fn begin<'n>(&'n self, row: RowHandle, property: &'n PropertyDescriptor) -> ChangeScope<'n> {
        trace!("will_change {} .{}", row, property.name);
        for observer in &self.observers {
            observer.will_change(row, property);
        }
        ChangeScope {
            notifier: self,
            row,
            property,
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Change in progress on one property. Dropping it ends the change.
#[must_use = "dropping the scope immediately ends the change"]
pub struct ChangeScope<'n> {
    notifier: &'n ChangeNotifier,
    row: RowHandle,
    property: &'n PropertyDescriptor,
}

impl ChangeScope<'_> {
    pub fn end(self) {}
}

impl Drop for ChangeScope<'_> {
    fn drop(&mut self) {
        trace!("did_change {} .{}", self.row, self.property.name);
        for observer in self.notifier.observers.iter().rev() {
            observer.did_change(self.row, self.property);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Begin { row: RowHandle, property: String },
    End { row: RowHandle, property: String },
}

/// Observer that records every event, in order.
#[derive(Debug, Default)]
pub struct ChangeLog {
    events: Mutex<Vec<ChangeEvent>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Property names that saw a completed begin/end pair, in order.
    pub fn changed_properties(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ChangeEvent::End { property, .. } => Some(property),
                ChangeEvent::Begin { .. } => None,
            })
            .collect()
    }

    fn push(&self, event: ChangeEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl ChangeObserver for ChangeLog {
    fn will_change(&self, row: RowHandle, property: &PropertyDescriptor) {
        self.push(ChangeEvent::Begin {
            row,
            property: property.name.clone(),
        });
    }

    fn did_change(&self, row: RowHandle, property: &PropertyDescriptor) {
        self.push(ChangeEvent::End {
            row,
            property: property.name.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PrimitiveKind;

    #[test]
    fn test_scope_pairs_events() {
        let log = Arc::new(ChangeLog::new());
        let mut notifier = ChangeNotifier::new();
        notifier.subscribe(log.clone());

        let row = RowHandle::new(0, 0);
        let property = PropertyDescriptor::new("name", PrimitiveKind::String);
        let scope = notifier.begin(row, &property);
        assert_eq!(log.events().len(), 1);
        scope.end();

        assert_eq!(
            log.events(),
            vec![
                ChangeEvent::Begin { row, property: "name".into() },
                ChangeEvent::End { row, property: "name".into() },
            ]
        );
    }

    #[test]
    fn test_scope_ends_on_error_path() {
        fn failing_write(notifier: &ChangeNotifier, property: &PropertyDescriptor) -> Result<(), String> {
            let _scope = notifier.begin(RowHandle::new(0, 1), property);
            Err("engine rejected write".into())
        }

        let log = Arc::new(ChangeLog::new());
        let mut notifier = ChangeNotifier::new();
        notifier.subscribe(log.clone());
        let property = PropertyDescriptor::new("age", PrimitiveKind::Int);

        assert!(failing_write(&notifier, &property).is_err());
        assert_eq!(log.changed_properties(), vec!["age".to_string()]);
        assert_eq!(log.events().len(), 2);
    }
}
