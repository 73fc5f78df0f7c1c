// src/lib.rs

pub mod config;
pub mod effective_field;
pub mod energy;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod initial_states;
pub mod material;
pub mod minimize;
pub mod ovf;
pub mod sweep;
pub mod temperature;
pub mod vec3;
pub mod vector_field;
pub mod visualisation;
