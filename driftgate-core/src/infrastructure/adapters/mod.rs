pub mod chroma;
pub mod duckdb;

pub use self::chroma::ChromaStore;
pub use self::duckdb::DuckDBWarehouse;
