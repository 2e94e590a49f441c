//! Output formats and per-request render options

/// Antialiasing factor passed to `asy -render` when none is requested
pub const DEFAULT_RENDER_LEVEL: u32 = 4;

/// Image formats the renderer is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Scalable vector graphics
    #[default]
    Svg,

    /// Raster PNG, antialiased according to the render level
    Png,
}

impl OutputFormat {
    /// File extension `asy` appends to the output path
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }

    /// MIME type used for the image content block
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Png => "image/png",
        }
    }

    /// Parse a format name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "svg" => Some(OutputFormat::Svg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| format!("Unknown output format '{}'. Valid options: svg, png", s))
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Options for a single render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub render_level: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            render_level: DEFAULT_RENDER_LEVEL,
        }
    }
}

impl RenderOptions {
    /// Build options from request values; a missing or zero render level
    /// falls back to [`DEFAULT_RENDER_LEVEL`]
    pub fn new(format: OutputFormat, render_level: Option<u32>) -> Self {
        Self {
            format,
            render_level: render_level
                .filter(|&level| level > 0)
                .unwrap_or(DEFAULT_RENDER_LEVEL),
        }
    }

    /// Format-dependent arguments placed before `-o` on the `asy` command line
    pub fn renderer_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.format.extension().to_string()];
        if self.format == OutputFormat::Png {
            args.push(format!("-render={}", self.render_level));
        }
        args
    }
}
