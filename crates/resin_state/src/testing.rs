//! Test support
//!
//! [`RecordingTarget`] is a [`StateTarget`] double that logs every property
//! application so tests can assert on what a binding pushed, how often, and
//! through which setter path.

use std::sync::Mutex;

use serde_json::Value;

use crate::binding::{PropertyAccess, StateTarget};

/// One recorded property application.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySet {
    pub property: String,
    pub value: Option<Value>,
    pub access: PropertyAccess,
}

/// Element double recording everything applied to it.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    log: Mutex<Vec<PropertySet>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every application so far, in order.
    pub fn applied(&self) -> Vec<PropertySet> {
        self.log.lock().unwrap().clone()
    }

    /// The most recent value applied to `property`, if any application
    /// happened.
    pub fn last(&self, property: &str) -> Option<Option<Value>> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|entry| entry.property == property)
            .map(|entry| entry.value.clone())
    }

    /// How many times `property` has been applied.
    pub fn count_for(&self, property: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.property == property)
            .count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl StateTarget for RecordingTarget {
    fn set_property(&self, property: &str, value: Option<Value>) {
        self.log.lock().unwrap().push(PropertySet {
            property: property.to_string(),
            value,
            access: PropertyAccess::Writable,
        });
    }

    fn set_internal(&self, property: &str, value: Option<Value>) {
        self.log.lock().unwrap().push(PropertySet {
            property: property.to_string(),
            value,
            access: PropertyAccess::ReadOnly,
        });
    }
}
