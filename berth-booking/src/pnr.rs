use berth_core::booking::Pnr;
use berth_core::repository::LedgerError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Mutex;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MintError {
    #[error("No unique PNR after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error(transparent)]
    Ledger(LedgerError),
}

/// Draws PNR candidates from an injected entropy source and retries when the
/// ledger reports a collision. The ledger's uniqueness constraint is the only
/// authority on whether a code is free.
pub struct PnrMinter {
    rng: Mutex<StdRng>,
    max_attempts: u32,
}

impl PnrMinter {
    pub fn new(rng: StdRng, max_attempts: u32) -> Self {
        Self {
            rng: Mutex::new(rng),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_entropy(max_attempts: u32) -> Self {
        Self::new(StdRng::from_entropy(), max_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn draw(&self) -> Pnr {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Pnr::generate(&mut *rng)
    }

    /// Runs `attempt` with fresh candidates until it stops failing with
    /// `DuplicatePnr`. Any other error ends the loop immediately.
    pub async fn mint<T, F, Fut>(&self, mut attempt: F) -> Result<T, MintError>
    where
        F: FnMut(Pnr) -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        for round in 1..=self.max_attempts {
            let candidate = self.draw();
            match attempt(candidate).await {
                Ok(value) => return Ok(value),
                Err(LedgerError::DuplicatePnr(pnr)) => {
                    tracing::warn!(pnr = %pnr, round, "PNR collision, drawing a new code");
                }
                Err(other) => return Err(MintError::Ledger(other)),
            }
        }
        Err(MintError::Exhausted { attempts: self.max_attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_collision_is_retried_with_a_new_code() {
        let minter = PnrMinter::new(StdRng::seed_from_u64(11), 5);
        let mut seen = Vec::new();

        let minted = minter
            .mint(|pnr| {
                seen.push(pnr.clone());
                let taken = seen.len() < 3;
                async move {
                    if taken {
                        Err(LedgerError::DuplicatePnr(pnr.to_string()))
                    } else {
                        Ok(pnr)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(seen.len(), 3);
        assert_eq!(&minted, seen.last().unwrap());
        let distinct: HashSet<_> = seen.iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let minter = PnrMinter::new(StdRng::seed_from_u64(3), 4);
        let mut calls = 0;

        let err = minter
            .mint(|pnr| {
                calls += 1;
                async move { Err::<(), _>(LedgerError::DuplicatePnr(pnr.to_string())) }
            })
            .await
            .unwrap_err();

        assert_eq!(err, MintError::Exhausted { attempts: 4 });
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn test_other_ledger_errors_are_not_retried() {
        let minter = PnrMinter::new(StdRng::seed_from_u64(3), 4);
        let mut calls = 0;

        let err = minter
            .mint(|_| {
                calls += 1;
                async { Err::<(), _>(LedgerError::Backend("down".to_string())) }
            })
            .await
            .unwrap_err();

        assert_eq!(err, MintError::Ledger(LedgerError::Backend("down".to_string())));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_same_seed_draws_same_sequence() {
        let a = PnrMinter::new(StdRng::seed_from_u64(42), 5);
        let b = PnrMinter::new(StdRng::seed_from_u64(42), 5);
        assert_eq!(a.draw(), b.draw());
        assert_eq!(a.draw(), b.draw());
    }
}
