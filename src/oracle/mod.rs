//! Oracle update pipeline
//!
//! Scheduler -> DeviationMonitor -> QuotationSource / OracleWriter ->
//! GasEstimator -> ledger. The provisioner resolves the contract handle the
//! writer targets before the loop starts.

mod gas;
mod monitor;
mod provisioner;
mod scheduler;
mod writer;

pub use gas::GasEstimator;
pub use monitor::{exceeds_deviation, CheckOutcome, DeviationMonitor};
pub use provisioner::{await_confirmation, ConfirmationPolicy, ContractProvisioner};
pub use scheduler::{CycleStats, Scheduler};
pub use writer::{OracleWriter, DEFAULT_GAS_LIMIT};
