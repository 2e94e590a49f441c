//! Subprocess driver for `asy`
//!
//! One render is one process. The code is written to a scratch directory,
//! `asy` is pointed at it with an explicit output path, and the image it
//! leaves behind is read back into memory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use base64::Engine as _;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{RenderError, Result};
use crate::format::{OutputFormat, RenderOptions};
use crate::log::{LogSource, RenderLog};

/// Renderer binary looked up on `PATH` when none is configured
pub const DEFAULT_PROGRAM: &str = "asy";

/// Upper bound on a single render
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// File stem shared by the input script and the image `asy` writes
const FIGURE_STEM: &str = "figure";

/// Renderer settings, fixed for the lifetime of the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Path or name of the `asy` executable
    pub program: PathBuf,

    /// Parent of the per-request scratch directories (OS temp dir when unset)
    pub temp_root: Option<PathBuf>,

    /// Kill the renderer after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            temp_root: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// A successfully produced image
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Format the image was rendered in
    pub format: OutputFormat,
    /// Raw file contents
    pub bytes: Vec<u8>,
    /// Everything `asy` printed, plus its exit code when non-zero
    pub log: RenderLog,
    /// Exit code of the renderer; an image can survive a non-zero exit
    pub exit_code: Option<i32>,
}

impl RenderOutput {
    /// Image bytes encoded with the standard base64 alphabet
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

impl std::fmt::Display for RenderOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rendered {} ({} bytes)", self.format, self.bytes.len())
    }
}

/// Stateless handle that runs `asy`; cheap to clone and share between calls
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Render `code` to an image
    ///
    /// The scratch directory is removed before returning on every path.
    pub async fn render(&self, code: &str, options: RenderOptions) -> Result<RenderOutput> {
        if code.trim().is_empty() {
            return Err(RenderError::EmptyCode);
        }

        let workdir = self.create_workdir()?;
        let result = self.render_in(workdir.path(), code, options).await;

        let path = workdir.path().to_path_buf();
        if let Err(e) = workdir.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove render directory");
        }

        result
    }

    /// Run `asy -version` and return its banner
    pub async fn check_installation(&self) -> Result<String> {
        let mut command = Command::new(&self.config.program);
        command
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut log = RenderLog::default();
        let output = self.run(command, &mut log).await?;

        log.push_output(LogSource::Stdout, &output.stdout);
        log.push_output(LogSource::Stderr, &output.stderr);

        if !output.status.success() {
            return Err(RenderError::VersionCheck {
                program: self.config.program.clone(),
                status: describe_status(output.status),
                log,
            });
        }

        // asy prints its banner on stderr
        let banner = if output.stdout.iter().all(u8::is_ascii_whitespace) {
            String::from_utf8_lossy(&output.stderr)
        } else {
            String::from_utf8_lossy(&output.stdout)
        };
        Ok(banner.trim().to_string())
    }

    fn create_workdir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("asygeo-");
        let created = match &self.config.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        created.map_err(|source| RenderError::Io {
            source,
            log: RenderLog::default(),
        })
    }

    async fn render_in(
        &self,
        dir: &Path,
        code: &str,
        options: RenderOptions,
    ) -> Result<RenderOutput> {
        let input_path = dir.join(format!("{FIGURE_STEM}.asy"));
        let output_base = dir.join(FIGURE_STEM);
        let output_path = output_base.with_extension(options.format.extension());

        let mut log = RenderLog::default();

        if let Err(source) = tokio::fs::write(&input_path, code).await {
            return Err(RenderError::Io { source, log });
        }

        let mut command = Command::new(&self.config.program);
        command
            .args(options.renderer_args())
            .arg("-o")
            .arg(&output_base)
            .arg(&input_path)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            program = %self.config.program.display(),
            format = %options.format,
            render_level = options.render_level,
            dir = %dir.display(),
            "Running renderer"
        );

        let output = self.run(command, &mut log).await?;

        log.push_output(LogSource::Stdout, &output.stdout);
        log.push_output(LogSource::Stderr, &output.stderr);

        let exit_code = output.status.code();
        if !output.status.success() {
            let exit = exit_code
                .map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string());
            log.push(LogSource::ExitCode, exit);
        }

        let bytes = match tokio::fs::read(&output_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(if output.status.success() {
                    RenderError::MissingOutput {
                        file: format!("{FIGURE_STEM}.{}", options.format.extension()),
                        log,
                    }
                } else {
                    RenderError::ExitFailure {
                        status: describe_status(output.status),
                        log,
                    }
                });
            }
            Err(source) => return Err(RenderError::Io { source, log }),
        };

        if !output.status.success() {
            warn!(
                status = %describe_status(output.status),
                "Renderer failed but left an image behind"
            );
        }

        Ok(RenderOutput {
            format: options.format,
            bytes,
            log,
            exit_code,
        })
    }

    /// Spawn `command` and collect its output, honouring the timeout
    ///
    /// On timeout the child is killed and whatever it printed so far is
    /// kept in `log` ahead of the `[PROCESS ERROR]` entry.
    async fn run(&self, mut command: Command, log: &mut RenderLog) -> Result<Output> {
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                log.push(
                    LogSource::Process,
                    format!("Failed to start Asymptote process: {source}"),
                );
                return Err(RenderError::Spawn {
                    program: self.config.program.clone(),
                    source,
                    log: std::mem::take(log),
                });
            }
        };

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let finished = {
            let collect = async {
                tokio::join!(
                    child.wait(),
                    drain(stdout_pipe, &mut stdout),
                    drain(stderr_pipe, &mut stderr),
                )
            };
            match self.config.timeout {
                Some(limit) => tokio::time::timeout(limit, collect)
                    .await
                    .map_err(|_| limit),
                None => Ok(collect.await),
            }
        };

        let (status, stdout_read, stderr_read) = match finished {
            Ok(collected) => collected,
            Err(limit) => {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed out renderer");
                }

                log.push_output(LogSource::Stdout, &stdout);
                log.push_output(LogSource::Stderr, &stderr);
                log.push(
                    LogSource::Process,
                    format!("Killed after {}s without exiting", limit.as_secs_f32()),
                );
                return Err(RenderError::Timeout {
                    limit,
                    log: std::mem::take(log),
                });
            }
        };

        let collected = status.and_then(|status| {
            stdout_read?;
            stderr_read?;
            Ok(status)
        });

        match collected {
            Ok(status) => Ok(Output {
                status,
                stdout,
                stderr,
            }),
            Err(source) => Err(RenderError::Io {
                source,
                log: std::mem::take(log),
            }),
        }
    }
}

/// Read a child pipe to the end; bytes already read stay in `buf` if the
/// future is dropped part way
async fn drain<R>(pipe: Option<R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    match pipe {
        Some(mut pipe) => pipe.read_to_end(buf).await.map(|_| ()),
        None => Ok(()),
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RendererConfig::default();
        assert_eq!(config.program, PathBuf::from("asy"));
        assert_eq!(config.temp_root, None);
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_output_base64() {
        let output = RenderOutput {
            format: OutputFormat::Svg,
            bytes: b"<svg/>".to_vec(),
            log: RenderLog::default(),
            exit_code: Some(0),
        };
        assert_eq!(output.to_base64(), "PHN2Zy8+");
        assert_eq!(output.to_string(), "Rendered svg (6 bytes)");
    }

    #[tokio::test]
    async fn test_empty_code_never_spawns() {
        // A program that cannot exist proves nothing was spawned
        let renderer = Renderer::new(RendererConfig {
            program: PathBuf::from("/nonexistent/asy"),
            ..RendererConfig::default()
        });

        let err = renderer
            .render("   \n\t", RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyCode));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let root = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(RendererConfig {
            program: PathBuf::from("/nonexistent/asy"),
            temp_root: Some(root.path().to_path_buf()),
            timeout: Some(Duration::from_secs(5)),
        });

        let err = renderer
            .render("draw(unitcircle);", RenderOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::Spawn { .. }));
        assert!(err.log().is_some_and(|log| log.as_str().starts_with("[PROCESS ERROR]")));

        // Scratch directory is gone even though the render failed
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
