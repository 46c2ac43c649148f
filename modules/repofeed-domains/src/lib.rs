pub mod directory;
pub mod enrichment;
pub mod ledger;
pub mod orchestrator;
pub mod ranking;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use directory::{RepositoryDirectory, UserDirectory};
pub use enrichment::{EnrichmentError, Geocoder, Location, OpenMeteo, Weather, WeatherService};
pub use ledger::VoteLedger;
pub use orchestrator::MutationOrchestrator;
pub use ranking::{hot_score, FeedRanker};
pub use store::{MemoryStore, PersistentStore, PgStore};
