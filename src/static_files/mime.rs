//! Content-Type lookup by file extension.

use std::path::Path;

pub const FALLBACK: &str = "application/octet-stream";

pub fn content_type_for(path: &Path) -> &'static str {
  let extension = path
    .extension()
    .and_then(|extension| extension.to_str())
    .map(str::to_ascii_lowercase);

  match extension.as_deref() {
    // Text
    Some("html" | "htm") => "text/html; charset=utf-8",
    Some("css") => "text/css",
    Some("txt" | "md") => "text/plain; charset=utf-8",
    Some("csv") => "text/csv",
    Some("xml") => "application/xml",

    // Scripts and data
    Some("js" | "mjs") => "text/javascript",
    Some("json" | "map") => "application/json",
    Some("wasm") => "application/wasm",

    // Images
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("svg") => "image/svg+xml",
    Some("ico") => "image/x-icon",
    Some("webp") => "image/webp",
    Some("avif") => "image/avif",

    // Media
    Some("mp4") => "video/mp4",
    Some("webm") => "video/webm",
    Some("mp3") => "audio/mpeg",
    Some("wav") => "audio/wav",
    Some("ogg") => "audio/ogg",
    Some("flac") => "audio/flac",
    Some("m4a") => "audio/mp4",

    // Fonts
    Some("woff") => "font/woff",
    Some("woff2") => "font/woff2",
    Some("ttf") => "font/ttf",
    Some("otf") => "font/otf",

    // Archives and documents
    Some("pdf") => "application/pdf",
    Some("zip") => "application/zip",
    Some("gz") => "application/gzip",

    _ => FALLBACK,
  }
}
