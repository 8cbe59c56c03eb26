pub mod analysis;
pub mod auth;
pub mod credentials;
pub mod error;
pub mod led;
pub mod middleware;
pub mod plants;
pub mod registry;
pub mod router;
pub mod token;

pub use error::{Error, Result};
