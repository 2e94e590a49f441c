//! asygeo MCP Server - Model Context Protocol server for Asymptote geometry rendering
//!
//! This crate provides an MCP server that lets AI agents draw precise
//! geometric figures. Agents submit Asymptote code and get back the rendered
//! image as an MCP image content block.
//!
//! ## Workflow
//!
//! 1. `renderGeometricImage` - Render Asymptote code to SVG (default) or PNG
//! 2. Read any compiler output in the attached log block
//! 3. Fix the code and render again

pub mod tools;

use asygeo_render::Renderer;
use rmcp::{
    ErrorData as McpError,
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use tracing::{info, warn};

use crate::tools::render::{self, RenderGeometricImageRequest};

// Re-export for binary
pub use asygeo_render;
pub use rmcp;

/// The asygeo MCP service
///
/// Holds no per-request state: every tool call spawns its own renderer
/// process in its own scratch directory, so the service is freely cloned
/// across concurrent calls.
#[derive(Clone)]
pub struct GeoMcpService {
    renderer: Renderer,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GeoMcpService {
    /// Create a new MCP service backed by the given renderer
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            tool_router: Self::tool_router(),
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[tool(
        name = "renderGeometricImage",
        description = "Renders an image from Asymptote code. Returns the image (SVG by default, or PNG) as base64 data, followed by Asymptote's log output when it printed anything."
    )]
    async fn render_geometric_image(
        &self,
        params: Parameters<RenderGeometricImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.render(params.0).await
    }

    /// Run one render request end to end
    pub async fn render(
        &self,
        request: RenderGeometricImageRequest,
    ) -> Result<CallToolResult, McpError> {
        let options = request.options();

        match self.renderer.render(&request.asy_code, options).await {
            Ok(output) => {
                info!(format = %output.format, bytes = output.bytes.len(), "Rendered image");
                Ok(render::render_result(&output))
            }
            Err(e) => {
                warn!(format = %options.format, error = %e, "Render failed");
                Err(render::render_error(&e))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for GeoMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "asygeo-mcp".to_string(),
                title: Some("Asymptote Geometry Renderer".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: Some("https://asymptote.sourceforge.io/".to_string()),
            },
            instructions: Some(
                "Renders precise geometric images using Asymptote code. \
                 \n\nCall renderGeometricImage(asyCode, outputParams?) with a complete Asymptote program.\n\
                 outputParams.format is \"svg\" (default) or \"png\"; outputParams.renderLevel sets PNG antialiasing (default 4).\n\
                 If the code fails to compile, the error carries Asymptote's log in data.logs."
                    .to_string(),
            ),
        }
    }
}
