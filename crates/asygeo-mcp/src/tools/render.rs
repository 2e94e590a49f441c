//! Rendering tool for the MCP server
//!
//! Request shape for `renderGeometricImage` and the mapping from renderer
//! results to MCP content blocks and JSON-RPC errors.

use asygeo_render::{LogSource, OutputFormat, RenderError, RenderOptions, RenderOutput};
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

/// Image format requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Svg,
    Png,
}

impl From<ImageFormat> for OutputFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Svg => OutputFormat::Svg,
            ImageFormat::Png => OutputFormat::Png,
        }
    }
}

/// Optional output settings
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputParams {
    /// Output format (svg or png). Default: svg.
    pub format: Option<ImageFormat>,

    /// Render level for PNG (e.g., 4 for 4x antialiasing). Default: 4.
    pub render_level: Option<u32>,
}

/// Request for rendering Asymptote code to an image
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenderGeometricImageRequest {
    /// The Asymptote code to execute.
    ///
    /// Example:
    /// ```asy
    /// size(200);
    /// pair A=(0,0), B=(1,0), C=(0.3,0.8);
    /// draw(A--B--C--cycle);
    /// ```
    pub asy_code: String,

    /// Output format and PNG antialiasing level
    pub output_params: Option<OutputParams>,
}

impl RenderGeometricImageRequest {
    /// Renderer options with defaults applied
    pub fn options(&self) -> RenderOptions {
        let params = self.output_params.as_ref();
        let format = params
            .and_then(|p| p.format)
            .map(OutputFormat::from)
            .unwrap_or_default();
        RenderOptions::new(format, params.and_then(|p| p.render_level))
    }
}

/// Image block, followed by a log block when `asy` printed anything
pub fn render_result(output: &RenderOutput) -> CallToolResult {
    let mut contents = vec![Content::image(output.to_base64(), output.format.mime_type())];

    if !output.log.is_empty() {
        contents.push(Content::text(format!("Asymptote Logs:\n{}", output.log)));
    }

    CallToolResult::success(contents)
}

/// JSON-RPC error for a failed render
///
/// Caller mistakes become invalid-params errors. Everything else is an
/// internal error whose `data.logs` holds the renderer output.
pub fn render_error(err: &RenderError) -> McpError {
    let message = err.to_string();

    if err.is_invalid_input() {
        return McpError::invalid_params(message, None);
    }

    let mut log = err.log().cloned().unwrap_or_default();
    log.push(LogSource::Server, &message);

    McpError::internal_error(message, Some(json!({ "logs": log.as_str() })))
}
