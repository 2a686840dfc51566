//! Consumer deposit/loan ledger

use thiserror::Error;
use tracing::info;

/// Loan limit granted per deposited dollar.
pub const LOAN_MULTIPLIER: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Please enter a valid deposit amount.")]
    InvalidDeposit,
    #[error("Please enter a valid loan amount.")]
    InvalidLoan,
    #[error("Loan request of USD {requested:.2} exceeds the maximum of USD {max:.2}.")]
    LoanLimitExceeded { requested: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConsumerLedger {
    pub deposited_usd: f64,
    pub max_loan_usd: f64,
    pub loan_usd: f64,
}

impl ConsumerLedger {
    /// Adds to the deposit and resets the loan limit to five times this
    /// deposit alone.
    pub fn deposit(&mut self, amount: f64) -> Result<String, LedgerError> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(LedgerError::InvalidDeposit);
        }
        self.deposited_usd += amount;
        self.max_loan_usd = amount * LOAN_MULTIPLIER;
        let message = format!(
            "Deposited USD {:.2}. Total deposited: USD {:.2}, max loan: USD {:.2}",
            amount, self.deposited_usd, self.max_loan_usd
        );
        info!("{}", message);
        Ok(message)
    }

    /// Replaces the outstanding loan.
    pub fn loan(&mut self, amount: f64) -> Result<String, LedgerError> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(LedgerError::InvalidLoan);
        }
        if amount > self.max_loan_usd {
            return Err(LedgerError::LoanLimitExceeded {
                requested: amount,
                max: self.max_loan_usd,
            });
        }
        self.loan_usd = amount;
        let message = format!("Loan of USD {amount:.2} approved.");
        info!("{}", message);
        Ok(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Deposit,
    Loan,
}

/// The single deposit/loan modal of the consumer screen.
#[derive(Debug, Clone, Default)]
pub struct LedgerModal {
    open: Option<RequestKind>,
    amount: String,
}

impl LedgerModal {
    pub fn open(&mut self, kind: RequestKind) {
        self.open = Some(kind);
        self.amount.clear();
    }

    pub fn kind(&self) -> Option<RequestKind> {
        self.open
    }

    pub fn set_amount(&mut self, raw: &str) {
        if self.open.is_some() {
            self.amount = raw.trim().to_string();
        }
    }

    /// Submits the request and closes the modal whatever the outcome.
    /// Unparseable input counts as a non-positive amount.
    pub fn confirm(&mut self, ledger: &mut ConsumerLedger) -> Option<Result<String, LedgerError>> {
        let kind = self.open.take()?;
        let amount = self.amount.parse::<f64>().unwrap_or(0.0);
        self.amount.clear();
        Some(match kind {
            RequestKind::Deposit => ledger.deposit(amount),
            RequestKind::Loan => ledger.loan(amount),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_then_loans() {
        let mut ledger = ConsumerLedger::default();
        assert_eq!(ledger, ConsumerLedger::default());

        ledger.deposit(1000.0).unwrap();
        assert_eq!(
            ledger,
            ConsumerLedger {
                deposited_usd: 1000.0,
                max_loan_usd: 5000.0,
                loan_usd: 0.0
            }
        );

        let err = ledger.loan(6000.0).unwrap_err();
        assert_eq!(
            err,
            LedgerError::LoanLimitExceeded {
                requested: 6000.0,
                max: 5000.0
            }
        );
        assert_eq!(ledger.loan_usd, 0.0);
        assert_eq!(ledger.max_loan_usd, 5000.0);

        let message = ledger.loan(4000.0).unwrap();
        assert_eq!(ledger.loan_usd, 4000.0);
        assert!(message.contains("4000.00"));

        // Loans replace rather than accumulate
        ledger.loan(5000.0).unwrap();
        assert_eq!(ledger.loan_usd, 5000.0);
    }

    #[test]
    fn test_max_loan_follows_latest_deposit() {
        let mut ledger = ConsumerLedger::default();
        ledger.deposit(1000.0).unwrap();
        let message = ledger.deposit(200.0).unwrap();
        assert_eq!(ledger.deposited_usd, 1200.0);
        assert_eq!(ledger.max_loan_usd, 1000.0);
        assert!(message.contains("1200.00"));
        assert!(message.contains("1000.00"));
    }

    #[test]
    fn test_non_positive_amounts_do_not_mutate() {
        let mut ledger = ConsumerLedger::default();
        ledger.deposit(100.0).unwrap();
        let before = ledger;

        for amount in [0.0, -10.0, f64::NAN] {
            assert_eq!(ledger.deposit(amount), Err(LedgerError::InvalidDeposit));
            assert_eq!(ledger.loan(amount), Err(LedgerError::InvalidLoan));
        }
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_modal_closes_after_every_confirm() {
        let mut ledger = ConsumerLedger::default();
        let mut modal = LedgerModal::default();
        assert!(modal.confirm(&mut ledger).is_none());

        modal.open(RequestKind::Loan);
        modal.set_amount("50");
        let result = modal.confirm(&mut ledger).unwrap();
        assert!(matches!(result, Err(LedgerError::LoanLimitExceeded { .. })));
        assert_eq!(modal.kind(), None);

        modal.open(RequestKind::Deposit);
        modal.set_amount("abc");
        assert_eq!(
            modal.confirm(&mut ledger).unwrap(),
            Err(LedgerError::InvalidDeposit)
        );
        assert_eq!(modal.kind(), None);

        modal.open(RequestKind::Deposit);
        modal.set_amount("20");
        assert!(modal.confirm(&mut ledger).unwrap().is_ok());
        assert_eq!(ledger.max_loan_usd, 100.0);
    }
}
