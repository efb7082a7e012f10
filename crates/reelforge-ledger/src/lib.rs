//! Credit ledger boundary and per-run billing guard.
//!
//! The credit balance lives in an external ledger; this crate consults it,
//! never owns it. [`CreditBillingGuard`] layers per-run reservation
//! semantics on top: the first attempt at a shot checks the balance,
//! retries ride the same reservation, and the debit happens exactly once —
//! on the shot's first completion.

pub mod error;
pub mod guard;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use guard::CreditBillingGuard;
pub use ledger::{CreditLedger, CreditTransaction, MemoryLedger};
