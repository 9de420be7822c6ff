pub mod error;
pub mod traits;
pub mod tmdb;

pub use error::CatalogError;
pub use traits::CatalogGateway;
pub use tmdb::TmdbClient;
