pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod fonts;
pub mod format;
pub mod pipeline;
pub mod raster;
pub mod resolve;
pub mod server;
pub mod svg;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::Config;
pub use error::Error;
pub use format::ImageFormat;
pub use pipeline::Pipeline;
pub use resolve::{resolve, ImageSpec, RawRequest};
