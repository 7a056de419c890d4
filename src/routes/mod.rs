pub mod analysis;
pub mod collection;
pub mod health;
pub mod snapshot;
