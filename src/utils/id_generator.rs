use uuid::Uuid;

/// Mints identifiers for freshly created threads.
///
/// Ids are opaque and collision-resistant; callers that pass their own
/// thread ids bypass this entirely.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A new thread id, e.g. `thread-550e8400-e29b-41d4-a716-446655440000`.
    #[must_use]
    pub fn generate_thread_id(&self) -> String {
        format!("thread-{}", Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_prefixed_and_unique() {
        let ids = IdGenerator::new();
        let a = ids.generate_thread_id();
        let b = ids.generate_thread_id();
        assert!(a.starts_with("thread-"));
        assert_ne!(a, b);
    }
}
