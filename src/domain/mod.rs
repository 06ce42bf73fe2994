pub mod account;
pub mod board;
pub mod filter;
pub mod listing;
pub mod stats;
pub mod vocabulary;
