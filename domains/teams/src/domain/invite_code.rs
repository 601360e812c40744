//! Invite code generation
//!
//! Codes are drawn from an alphabet without visually ambiguous characters
//! (no 0/O, 1/I/L) and checked against existing assignments before use.
//! A free code here is not a reservation: team creation still claims the
//! code under a `Missing` precondition.

use std::sync::Arc;

use async_trait::async_trait;
use hackhub_common::{Error, Result};
use rand::Rng;

use crate::domain::validation::INVITE_CODE_LEN;

pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Existence check against currently assigned codes
#[async_trait]
pub trait CodeLookup: Send + Sync {
    async fn code_exists(&self, code: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct InviteCodeGenerator {
    lookup: Arc<dyn CodeLookup>,
    max_attempts: u32,
}

impl InviteCodeGenerator {
    pub fn new(lookup: Arc<dyn CodeLookup>, max_attempts: u32) -> Self {
        Self {
            lookup,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Draw a candidate code
    pub fn candidate() -> String {
        let mut rng = rand::thread_rng();
        (0..INVITE_CODE_LEN)
            .map(|_| INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())] as char)
            .collect()
    }

    /// Produce a code not currently assigned to any team
    pub async fn generate(&self) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let code = Self::candidate();
            if !self.lookup.code_exists(&code).await? {
                return Ok(code);
            }
            tracing::debug!(attempt, "Invite code collision, drawing again");
        }

        tracing::error!(
            attempts = self.max_attempts,
            "Invite code generation exhausted all attempts"
        );
        Err(Error::GenerationExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::is_valid_invite_code;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct SetLookup(HashSet<String>);

    #[async_trait]
    impl CodeLookup for SetLookup {
        async fn code_exists(&self, code: &str) -> Result<bool> {
            Ok(self.0.contains(code))
        }
    }

    /// Reports every code as taken
    struct FullLookup(AtomicU32);

    #[async_trait]
    impl CodeLookup for FullLookup {
        async fn code_exists(&self, _code: &str) -> Result<bool> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    #[test]
    fn test_candidate_format() {
        for _ in 0..200 {
            let code = InviteCodeGenerator::candidate();
            assert!(is_valid_invite_code(&code), "bad code {}", code);
            assert!(!code.contains(['0', '1', 'O', 'I', 'L']));
        }
    }

    #[tokio::test]
    async fn test_never_returns_existing_code() {
        let mut existing = HashSet::new();
        while existing.len() < 500 {
            existing.insert(InviteCodeGenerator::candidate());
        }
        let generator = InviteCodeGenerator::new(Arc::new(SetLookup(existing.clone())), 5);

        for _ in 0..10_000 {
            let code = generator.generate().await.unwrap();
            assert!(!existing.contains(&code));
        }
    }

    #[tokio::test]
    async fn test_exhaustion_is_bounded() {
        let lookup = Arc::new(FullLookup(AtomicU32::new(0)));
        let generator = InviteCodeGenerator::new(lookup.clone(), 5);

        let result = generator.generate().await;
        assert!(matches!(result, Err(Error::GenerationExhausted)));
        assert_eq!(lookup.0.load(Ordering::SeqCst), 5);
    }
}
