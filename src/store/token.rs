use super::types::LockToken;

/// Source of fresh lock tokens, injected into the [`Store`](super::memory::Store).
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> LockToken;
}

/// Random v4 UUIDs (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokens;

impl TokenGenerator for UuidTokens {
    fn generate(&self) -> LockToken {
        LockToken(uuid::Uuid::new_v4().to_string())
    }
}
