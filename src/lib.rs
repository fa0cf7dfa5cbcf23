pub mod clock;
mod error;
pub mod learning;
pub mod schedule;
pub mod stats;
pub mod store;

pub use error::Error;
pub use learning::Learning;
pub use store::Store;
