//! # Domain Entities Module

pub mod accounts;

pub use accounts::*;
