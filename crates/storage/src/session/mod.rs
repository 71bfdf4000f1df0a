mod memory;
mod neo4j;
mod traits;

pub use memory::MemoryGraph;
pub use neo4j::Neo4jSession;
pub use traits::GraphSession;
