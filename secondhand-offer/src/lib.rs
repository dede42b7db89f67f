pub mod models;
pub mod rules;
pub mod events;
pub mod ledger;
pub mod memory;

pub use models::{AcceptanceChange, NewOffer, OfferStatus};
pub use events::OfferTelemetry;
pub use ledger::OfferLedger;
pub use memory::{MemoryStore, ProfileRecord};
