// src/lib.rs

pub mod concurrent;
pub mod debug;
pub mod heatmap;
pub mod math;
