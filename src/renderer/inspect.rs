//! Built-in renderer exposing generic views of any file.
//!
//! The file is read once at build time and every view serves that snapshot,
//! so a cached handler set always describes one consistent revision.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::response::escape_html;
use crate::renderer::{HandlerSet, RenderError, Renderer, ViewHandler};

/// Bytes shown by the `/hex` view.
const HEX_PREVIEW_BYTES: usize = 4096;

/// Renderer producing overview, metadata, hex and raw views.
#[derive(Debug, Clone)]
pub struct InspectRenderer {
    max_file_bytes: u64,
}

impl InspectRenderer {
    pub fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }
}

impl Renderer for InspectRenderer {
    fn build(&self, resource: &Path) -> Result<HandlerSet, RenderError> {
        let metadata = std::fs::metadata(resource)?;
        if !metadata.is_file() {
            return Err(RenderError::Unsupported("not a regular file".to_string()));
        }
        if metadata.len() > self.max_file_bytes {
            return Err(RenderError::TooLarge {
                size: metadata.len(),
                limit: self.max_file_bytes,
            });
        }

        let bytes = Bytes::from(std::fs::read(resource)?);
        let snapshot = Arc::new(Snapshot {
            name: resource
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            modified: metadata.modified().ok(),
            bytes,
        });

        tracing::debug!(
            resource = %resource.display(),
            size = snapshot.bytes.len(),
            "Built inspect views"
        );

        Ok(HandlerSet::new()
            .with("/", OverviewView(snapshot.clone()))
            .with("/meta", MetaView(snapshot.clone()))
            .with("/hex", HexView(snapshot.clone()))
            .with("/raw", RawView(snapshot)))
    }
}

/// File contents captured at build time.
struct Snapshot {
    name: String,
    modified: Option<SystemTime>,
    bytes: Bytes,
}

impl Snapshot {
    fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    fn modified_rfc3339(&self) -> Option<String> {
        self.modified
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
    }
}

#[derive(Debug, Serialize)]
struct ResourceMeta<'a> {
    name: &'a str,
    size: usize,
    modified: Option<String>,
    utf8: bool,
    lines: Option<usize>,
}

struct OverviewView(Arc<Snapshot>);

impl ViewHandler for OverviewView {
    fn serve(&self, request: &Request<Body>) -> Response {
        let snapshot = &self.0;
        // Links are relative to the view root, which always ends in `/ui/`.
        let base = escape_html(request.uri().path().trim_end_matches('/'));
        let name = escape_html(&snapshot.name);

        let mut page = String::new();
        let _ = write!(
            page,
            "<!DOCTYPE html>\n<html>\n<head><title>{name}</title></head>\n<body>\n<h1>{name}</h1>\n<table>\n"
        );
        let _ = writeln!(page, "<tr><th>Size</th><td>{} bytes</td></tr>", snapshot.bytes.len());
        if let Some(modified) = snapshot.modified_rfc3339() {
            let _ = writeln!(page, "<tr><th>Modified</th><td>{modified}</td></tr>");
        }
        if let Some(text) = snapshot.text() {
            let _ = writeln!(page, "<tr><th>Lines</th><td>{}</td></tr>", text.lines().count());
        }
        page.push_str("</table>\n<ul>\n");
        for view in ["meta", "hex", "raw"] {
            let _ = writeln!(page, "<li><a href=\"{base}/{view}\">{view}</a></li>");
        }
        page.push_str("</ul>\n</body>\n</html>\n");

        Html(page).into_response()
    }
}

struct MetaView(Arc<Snapshot>);

impl ViewHandler for MetaView {
    fn serve(&self, _request: &Request<Body>) -> Response {
        let snapshot = &self.0;
        let text = snapshot.text();
        Json(ResourceMeta {
            name: &snapshot.name,
            size: snapshot.bytes.len(),
            modified: snapshot.modified_rfc3339(),
            utf8: text.is_some(),
            lines: text.map(|t| t.lines().count()),
        })
        .into_response()
    }
}

struct HexView(Arc<Snapshot>);

impl ViewHandler for HexView {
    fn serve(&self, _request: &Request<Body>) -> Response {
        let head = &self.0.bytes[..self.0.bytes.len().min(HEX_PREVIEW_BYTES)];
        hex_dump(head).into_response()
    }
}

struct RawView(Arc<Snapshot>);

impl ViewHandler for RawView {
    fn serve(&self, _request: &Request<Body>) -> Response {
        let mut response = Body::from(self.0.bytes.clone()).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        let disposition = format!(
            "attachment; filename=\"{}\"",
            self.0.name.replace(['"', '\\'], "_")
        );
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        response
    }
}

/// Classic `offset  hex  |ascii|` dump, 16 bytes per line.
fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4 + 16);
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:08x} ", line * 16);
        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => {
                    let _ = write!(out, " {b:02x}");
                }
                None => out.push_str("   "),
            }
        }
        out.push_str("  |");
        for &b in chunk {
            out.push(if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' });
        }
        out.push_str("|\n");
    }
    out
}
