//! # asygeo-render
//!
//! Thin adapter around the Asymptote (`asy`) command-line renderer.
//!
//! Each call to [`Renderer::render`] gets its own scratch directory: the
//! geometry code is written there, `asy` is run once against it, and the
//! resulting SVG or PNG is read back. The directory is removed before the
//! call returns, whether the render succeeded or not.
//!
//! ## Example
//!
//! ```ignore
//! use asygeo_render::{OutputFormat, RenderOptions, Renderer, RendererConfig};
//!
//! let renderer = Renderer::new(RendererConfig::default());
//! let output = renderer
//!     .render("draw(unitcircle);", RenderOptions::new(OutputFormat::Png, Some(4)))
//!     .await?;
//!
//! println!("{} bytes of {}", output.bytes.len(), output.format.mime_type());
//! ```

pub mod format;
pub mod log;
pub mod renderer;

mod error;

pub use error::{RenderError, Result};
pub use format::{DEFAULT_RENDER_LEVEL, OutputFormat, RenderOptions};
pub use log::{LogSource, RenderLog};
pub use renderer::{DEFAULT_PROGRAM, DEFAULT_TIMEOUT, RenderOutput, Renderer, RendererConfig};
