mod config;
mod ranking;
mod storage;
mod user;

pub use config::*;
pub use ranking::*;
pub use storage::*;
pub use user::*;

pub type GithubHandle = String;
pub type RegionCode = String;
pub type CategoryId = String;

/// Region code used for records that were stored without one.
pub const UNKNOWN_REGION: &str = "00";
