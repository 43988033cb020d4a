pub mod connectors;
pub mod coordinator;

pub use connectors::{DocumentConnector, MessageConnector};
pub use coordinator::{ChunkRequest, IngestionCoordinator};
