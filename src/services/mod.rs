pub mod analysis;
pub mod collector;
pub mod hh_client;
pub mod normalizer;
pub mod snapshot;
