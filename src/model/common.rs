use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub type Id = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Source of fresh identities for newly inserted rows
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Id;
}

/// Production generator: random UUID v4 strings
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> Id {
        generate_id()
    }
}

/// Deterministic generator yielding `prefix-1`, `prefix-2`, ...
///
/// Useful when tests need to predict the ids a clone will receive.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn new_id(&self) -> Id {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
