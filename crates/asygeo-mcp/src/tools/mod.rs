//! MCP tool implementations for asygeo
//!
//! The server exposes exactly one tool:
//! - Rendering (renderGeometricImage)

pub mod render;
