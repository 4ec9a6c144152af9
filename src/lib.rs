//! Local HTTP control surface for a kiosk media display.
//!
//! Accepts video/image uploads, serves file listings, and drives an
//! external VLC process for fullscreen playback and slideshows.

pub mod config;
pub mod error;
pub mod paths;
pub mod player;
pub mod storage;
pub mod web;
