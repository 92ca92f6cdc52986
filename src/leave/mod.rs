//! Leave core: calendar arithmetic, the request state machine, the balance
//! ledger and the transactional workflows built on top of them.

pub mod admission;
pub mod approval;
pub mod balance;
pub mod calendar;
pub mod entitlement;
pub mod onboarding;
pub mod overlap;
pub mod scope;
pub mod status;
pub mod store;
