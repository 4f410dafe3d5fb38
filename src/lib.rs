//! vibescope library - audio-reactive shader gallery with generative music

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod input;
pub mod logging;
pub mod music;
pub mod params;
pub mod rendering;
pub mod shaders;

pub use error::{Error, Result};
