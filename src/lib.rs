//! Vector shape editor that scan-converts its shapes into a BGRA buffer.

pub mod canvas;
pub mod controller;
pub mod geometry;
pub mod logging;
pub mod model;
pub mod persist;
pub mod raster;
pub mod scene;
pub mod settings;
pub mod texture;
