// src/lib.rs

//! perm-watch library
//!
//! Watches the DOL FLAG processing-times page and emails a distribution list
//! when the published PERM update date changes.

pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
