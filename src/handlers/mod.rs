// handlers/mod.rs - one handler per finance endpoint
//
// Every mutating endpoint follows the same sequence:
// parse JSON body → resolve session → decode the action → call the service.
// Session failures return before any storage access.
pub mod auth;
pub mod data;
pub mod migrate;
pub mod mutate;
pub mod recover;
pub mod system;
pub mod utils;

pub use auth::auth_post;
pub use data::data_get;
pub use migrate::migrate_post;
pub use mutate::mutate;
pub use recover::recover;
pub use system::{health, method_not_allowed, preflight, root};
