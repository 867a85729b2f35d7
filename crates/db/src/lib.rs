pub mod connection;
pub mod migrations;
pub mod state;

pub use connection::{connect_existing, connect_with_settings, DbPool};
pub use state::SqlStateStorage;
