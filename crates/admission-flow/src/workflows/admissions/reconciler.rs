use std::collections::{BTreeMap, BTreeSet};

use super::validation::ValidationResult;

/// Field name to message.
pub type ErrorMap = BTreeMap<String, String>;

/// Ordered priority resolver: the first non-empty source wins.
pub fn resolve_first<'a>(sources: &[Option<&'a str>]) -> Option<&'a str> {
    sources
        .iter()
        .copied()
        .flatten()
        .find(|message| !message.is_empty())
}

/// Display gates for local errors; external errors ignore them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    pub touched: bool,
    pub immediate: bool,
    pub submitted: bool,
}

impl Visibility {
    pub fn reveals_local(self) -> bool {
        self.touched || self.immediate || self.submitted
    }
}

/// Message to show for `field`, if any. External errors take precedence.
pub fn display<'a>(
    field: &str,
    local: &'a ErrorMap,
    external: &'a ErrorMap,
    visibility: Visibility,
) -> Option<&'a str> {
    let local_message = if visibility.reveals_local() {
        local.get(field).map(String::as_str)
    } else {
        None
    };
    resolve_first(&[external.get(field).map(String::as_str), local_message])
}

/// Per-session holder of both error sources and their display state.
#[derive(Debug, Clone, Default)]
pub struct ErrorReconciler {
    local: ErrorMap,
    external: ErrorMap,
    touched: BTreeSet<String>,
    immediate: BTreeSet<String>,
    submitted: bool,
}

impl ErrorReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(&self) -> &ErrorMap {
        &self.local
    }

    pub fn external(&self) -> &ErrorMap {
        &self.external
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn replace_local(&mut self, result: &ValidationResult) {
        self.local = result.messages();
    }

    /// Replace the whole external set.
    pub fn push_external(&mut self, errors: ErrorMap) {
        self.external = errors;
    }

    /// Drop the external error of one field; local errors are untouched.
    pub fn clear(&mut self, field: &str) -> Option<String> {
        self.external.remove(field)
    }

    pub fn clear_external(&mut self) {
        self.external.clear();
    }

    pub fn mark_touched(&mut self, field: impl Into<String>) {
        self.touched.insert(field.into());
    }

    pub fn set_immediate(&mut self, field: impl Into<String>, enabled: bool) {
        let field = field.into();
        if enabled {
            self.immediate.insert(field);
        } else {
            self.immediate.remove(&field);
        }
    }

    pub fn mark_submitted(&mut self, submitted: bool) {
        self.submitted = submitted;
    }

    fn visibility(&self, field: &str) -> Visibility {
        Visibility {
            touched: self.touched.contains(field),
            immediate: self.immediate.contains(field),
            submitted: self.submitted,
        }
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        display(field, &self.local, &self.external, self.visibility(field))
    }

    /// Every field that currently shows a message.
    pub fn visible_errors(&self) -> ErrorMap {
        self.local
            .keys()
            .chain(self.external.keys())
            .filter_map(|field| {
                self.message_for(field)
                    .map(|message| (field.clone(), message.to_string()))
            })
            .collect()
    }
}
