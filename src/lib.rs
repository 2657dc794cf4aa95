pub mod app;
pub mod audio;
pub mod color;
pub mod config;
pub mod geometry;
pub mod painter;
pub mod raster;
pub mod render;
pub mod sample;
pub mod scheduler;
pub mod settings;
pub mod surface;
pub mod synth;
pub mod terminal;
