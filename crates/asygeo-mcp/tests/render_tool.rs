//! End-to-end tests for the renderGeometricImage tool against a stand-in `asy`

#![cfg(unix)]
// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use asygeo_mcp::GeoMcpService;
use asygeo_mcp::tools::render::RenderGeometricImageRequest;
use asygeo_render::{Renderer, RendererConfig};
use rmcp::model::{ErrorCode, RawContent};
use serde_json::json;
use tempfile::TempDir;

// Writes the input back out as the "image"; `@broken` simulates a compile error
const FAKE_ASY: &str = r#"#!/bin/sh
fmt=""
out=""
input=""
while [ $# -gt 0 ]; do
    case "$1" in
        -f) fmt="$2"; shift 2 ;;
        -o) out="$2"; shift 2 ;;
        -*) shift ;;
        *) input="$1"; shift ;;
    esac
done
if grep -q "@broken" "$input"; then echo "figure.asy: 2.1: syntax error" >&2; exit 1; fi
cp "$input" "$out.$fmt"
"#;

fn service() -> (TempDir, GeoMcpService) {
    let dir = tempfile::tempdir().unwrap();
    let program = dir.path().join("asy");
    std::fs::write(&program, FAKE_ASY).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

    let scratch = dir.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let renderer = Renderer::new(RendererConfig {
        program,
        temp_root: Some(scratch),
        timeout: Some(Duration::from_secs(10)),
    });

    (dir, GeoMcpService::new(renderer))
}

fn request(value: serde_json::Value) -> RenderGeometricImageRequest {
    serde_json::from_value(value).expect("valid request")
}

#[tokio::test]
async fn renders_png_image_block() {
    let (_dir, service) = service();

    let result = service
        .render(request(json!({
            "asyCode": "unitsize(1cm); draw(unitcircle);",
            "outputParams": { "format": "png", "renderLevel": 2 }
        })))
        .await
        .expect("render should succeed");

    assert_eq!(result.content.len(), 1);
    match &result.content[0].raw {
        RawContent::Image(image) => {
            assert_eq!(image.mime_type, "image/png");
            // base64("unitsize(1cm); draw(unitcircle);")
            assert_eq!(image.data, "dW5pdHNpemUoMWNtKTsgZHJhdyh1bml0Y2lyY2xlKTs=");
        }
        other => panic!("expected image content, got {other:?}"),
    }
}

#[tokio::test]
async fn compile_error_is_internal_error_with_logs() {
    let (dir, service) = service();

    let err = service
        .render(request(json!({ "asyCode": "// @broken\ndraw(" })))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    let data = err.data.expect("error data");
    let logs = data["logs"].as_str().unwrap();
    assert!(logs.contains("[ASY STDERR]: figure.asy: 2.1: syntax error"));
    assert!(logs.contains("[ASY EXIT CODE]: 1"));
    assert!(logs.contains("[SERVER ERROR]:"));

    assert_eq!(std::fs::read_dir(dir.path().join("scratch")).unwrap().count(), 0);
}

#[tokio::test]
async fn blank_code_is_invalid_params() {
    let (_dir, service) = service();

    let err = service
        .render(request(json!({ "asyCode": "  \n " })))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
}
