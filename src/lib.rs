pub mod account;
pub mod cli;
pub mod config;
pub mod imap;
pub mod jobs;
pub mod logging;
pub mod repository;
pub mod storage;

#[cfg(test)]
mod fixtures;
