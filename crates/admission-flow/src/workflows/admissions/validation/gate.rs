use std::collections::HashMap;

use super::super::domain::{Category, Step};
use super::super::record::CanonicalRecord;
use super::ValidationResult;

/// Handle for one in-flight validation; carries the record as of `begin`.
#[derive(Debug, Clone)]
pub struct ValidationTicket {
    step: Step,
    category: Category,
    generation: u64,
    snapshot: CanonicalRecord,
}

impl ValidationTicket {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> &CanonicalRecord {
        &self.snapshot
    }
}

/// Latest-wins gate for validations of the same step and category.
#[derive(Debug, Default)]
pub struct ValidationGate {
    generations: HashMap<(Step, Category), u64>,
}

impl ValidationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, step: Step, category: Category, record: &CanonicalRecord) -> ValidationTicket {
        let generation = self.generations.entry((step, category)).or_insert(0);
        *generation += 1;
        ValidationTicket {
            step,
            category,
            generation: *generation,
            snapshot: record.clone(),
        }
    }

    pub fn is_current(&self, ticket: &ValidationTicket) -> bool {
        self.generations.get(&(ticket.step, ticket.category)) == Some(&ticket.generation)
    }

    /// Hand back the result only if no newer validation was started meanwhile.
    pub fn finish(&self, ticket: &ValidationTicket, result: ValidationResult) -> Option<ValidationResult> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::debug!(
                step = ticket.step.label(),
                category = ticket.category.label(),
                generation = ticket.generation,
                "discarding stale validation result"
            );
            None
        }
    }
}
