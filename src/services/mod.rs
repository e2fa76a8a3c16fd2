pub mod error;
pub mod import;
pub mod lifecycle;
pub mod mutation;
pub mod query;
pub mod recovery;
pub mod validation;

pub use error::ServiceError;
pub use import::SheetImporter;
pub use mutation::MutationService;
pub use query::QueryService;
pub use recovery::RecoveryService;
