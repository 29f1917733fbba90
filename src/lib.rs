pub mod catalog;
pub mod codec;
pub mod collision;
pub mod config;
pub mod dump;
pub mod error;
pub mod kdtree;
pub mod level;
pub mod manager;
pub mod math;
pub mod parser;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
