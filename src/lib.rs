// src/lib.rs

//! Listing watch library
//!
//! Crawls real-estate agency sites, detects listings not seen before and
//! announces them on a Telegram channel.

pub mod adapters;
pub mod error;
pub mod fetch;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod utils;
