pub mod extra;
pub mod market;
pub mod upload;
