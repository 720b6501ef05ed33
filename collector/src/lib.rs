pub mod api;
pub mod collector;
pub mod quota;

pub use collector::Collector;
