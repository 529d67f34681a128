use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error as ThisError;

#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum BalanceError {
    #[error("insufficient funds (balance={balance}, required={required})")]
    InsufficientFunds { balance: u64, required: u64 },
    #[error("balance service unavailable: {0}")]
    Unavailable(String),
}

/// External wagering currency. Calls are awaited one at a time by the session task.
#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Add `amount` and return the new balance.
    async fn credit(&self, player: &str, amount: u64) -> Result<u64, BalanceError>;
    /// Remove `amount` and return the new balance, or fail without changing anything.
    async fn debit(&self, player: &str, amount: u64) -> Result<u64, BalanceError>;
    async fn balance(&self, player: &str) -> Result<u64, BalanceError>;
}

/// Process-local bank. Unknown players start at `starting_balance`.
#[derive(Debug)]
pub struct InMemoryBank {
    starting_balance: u64,
    accounts: Mutex<HashMap<String, u64>>,
}

impl InMemoryBank {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            starting_balance,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    fn with_account<T>(
        &self,
        player: &str,
        apply: impl FnOnce(&mut u64) -> Result<T, BalanceError>,
    ) -> Result<T, BalanceError> {
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| BalanceError::Unavailable("bank lock poisoned".to_string()))?;
        let balance = accounts
            .entry(player.to_string())
            .or_insert(self.starting_balance);
        apply(balance)
    }
}

#[async_trait]
impl BalanceService for InMemoryBank {
    async fn credit(&self, player: &str, amount: u64) -> Result<u64, BalanceError> {
        self.with_account(player, |balance| {
            *balance = balance.saturating_add(amount);
            Ok(*balance)
        })
    }

    async fn debit(&self, player: &str, amount: u64) -> Result<u64, BalanceError> {
        self.with_account(player, |balance| {
            if *balance < amount {
                return Err(BalanceError::InsufficientFunds {
                    balance: *balance,
                    required: amount,
                });
            }
            *balance -= amount;
            Ok(*balance)
        })
    }

    async fn balance(&self, player: &str) -> Result<u64, BalanceError> {
        self.with_account(player, |balance| Ok(*balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_debit_and_credit() {
        let bank = InMemoryBank::new(100);
        assert_eq!(bank.balance("alice").await, Ok(100));
        assert_eq!(bank.debit("alice", 40).await, Ok(60));
        assert_eq!(bank.credit("alice", 15).await, Ok(75));
        assert_eq!(bank.balance("bob").await, Ok(100));
    }

    #[tokio::test]
    async fn test_overdraft_is_rejected_without_change() {
        let bank = InMemoryBank::new(10);
        assert_eq!(
            bank.debit("alice", 11).await,
            Err(BalanceError::InsufficientFunds {
                balance: 10,
                required: 11
            })
        );
        assert_eq!(bank.balance("alice").await, Ok(10));
    }
}
