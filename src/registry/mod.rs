//! Registry storage layer
//!
//! PostgreSQL-backed components for targets, logical schemas, schema
//! versions, and the deployment ledger. Version-store and ledger
//! operations run on any `GenericClient` so the orchestrator can compose
//! them inside one transaction.

pub mod ledger;
pub mod schema_store;
pub mod targets;

pub use ledger::DeploymentLedger;
pub use schema_store::SchemaStore;
pub use targets::TargetService;
