// src/services/mod.rs

pub mod archive;
pub mod quiz;
pub mod results;
