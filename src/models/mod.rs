// src/models/mod.rs

pub mod lab_result;
pub mod quiz;
pub mod user;
