pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod matchsearch;
pub mod model;
pub mod store;

pub use config::Config;
pub use error::{KinmatchError, Result};
pub use matchsearch::{find_matches, MatchRequest, MatchResponse};
pub use model::{Gender, Person, RelationshipLabel};
