pub mod analysis;
pub mod filter;
pub mod vacancy;
