//! Hairstyle Studio
//!
//! Takes a portrait, asks Google Gemini to analyze the face and propose a set
//! of hairstyles, then renders every proposal onto the portrait in small
//! concurrent waves while publishing per-style progress.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
