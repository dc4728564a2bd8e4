use uuid::Uuid;

/// Source of attempt identifiers. Drawn exactly once per attempt.
pub trait AttemptIdSource {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs, used for real extraction runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl AttemptIdSource for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `attempt-000001`, `attempt-000002`, ... ids.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptIdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        self.next += 1;
        format!("attempt-{:06}", self.next)
    }
}
