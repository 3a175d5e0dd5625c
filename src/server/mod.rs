pub mod request;

pub use request::{MatchRequest, VersionSource};
