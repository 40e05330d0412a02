pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod logging;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod selection;
pub mod session;
pub mod stamp;
pub mod surface;
pub mod thumbnail;
