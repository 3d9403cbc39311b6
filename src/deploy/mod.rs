//! Deployment orchestration
//!
//! The core of the gateway: coordinates the version store, the
//! deployment ledger, and the upstream sync client inside one local
//! transaction, and decides commit vs. compensate.

pub mod orchestrator;

pub use orchestrator::Deployer;
