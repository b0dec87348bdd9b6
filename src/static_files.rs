//! Directory tree serving for every path outside `/proxy/`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use actix_web::http::header::{self, HttpDate, LastModified};
use actix_web::http::{Method, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use log::{debug, error, warn};
use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::static_files::listing::ListingEntry;

pub mod listing;
pub mod mime;

const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Canonical root of the served tree, shared by every worker.
#[derive(Debug, Clone)]
pub struct StaticRoot(pub Arc<Path>);

#[derive(Debug, Error)]
pub enum StaticFileError {
  #[error("File not found")]
  NotFound,

  #[error("{0}")]
  Forbidden(&'static str),

  #[error("Unsupported method ('{0}')")]
  UnsupportedMethod(Method),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl ResponseError for StaticFileError {
  fn status_code(&self) -> StatusCode {
    match self {
      StaticFileError::NotFound => StatusCode::NOT_FOUND,
      StaticFileError::Forbidden(_) => StatusCode::FORBIDDEN,
      StaticFileError::UnsupportedMethod(_) => StatusCode::NOT_IMPLEMENTED,
      StaticFileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code())
      .content_type(TEXT_PLAIN)
      .body(self.to_string())
  }
}

#[derive(Debug)]
enum Resolved {
  File {
    contents: Vec<u8>,
    content_type: &'static str,
    modified: Option<SystemTime>,
  },
  Listing(String),
  Redirect(String),
}

/// Default service: `GET`/`HEAD` are answered from the tree, every other
/// method is refused.
pub async fn serve(req: HttpRequest, root: web::Data<StaticRoot>) -> HttpResponse {
  if *req.method() != Method::GET && *req.method() != Method::HEAD {
    return StaticFileError::UnsupportedMethod(req.method().clone()).error_response();
  }

  let request_path = req.path().to_owned();
  let query = req.query_string().to_owned();
  let root = root.0.clone();

  let resolved = web::block(move || resolve(&root, &request_path, &query))
    .await
    .map_err(|err| StaticFileError::Internal(err.to_string()))
    .and_then(|resolved| resolved);

  match resolved {
    Ok(Resolved::File {
      contents,
      content_type,
      modified,
    }) => {
      let mut response = HttpResponse::Ok();
      response.content_type(content_type);
      if let Some(modified) = modified {
        response.insert_header(LastModified(HttpDate::from(modified)));
      }
      response.body(contents)
    }
    Ok(Resolved::Listing(page)) => HttpResponse::Ok()
      .content_type(TEXT_HTML)
      .body(page),
    Ok(Resolved::Redirect(location)) => HttpResponse::MovedPermanently()
      .insert_header((header::LOCATION, location))
      .finish(),
    Err(err) => {
      match &err {
        StaticFileError::NotFound => debug!("{} {}: {}", req.method(), req.path(), err),
        StaticFileError::Internal(_) => error!("{} {}: {}", req.method(), req.path(), err),
        _ => warn!("{} {}: {}", req.method(), req.path(), err),
      }
      err.error_response()
    }
  }
}

fn resolve(root: &Path, request_path: &str, query: &str) -> Result<Resolved, StaticFileError> {
  let decoded = percent_decode_str(request_path).decode_utf8_lossy();
  let path = root.join(relative_path(&decoded));

  // Symlinks may still point outside the root.
  let canonical = path.canonicalize().map_err(|_| StaticFileError::NotFound)?;
  if !canonical.starts_with(root) {
    warn!("Path traversal attempt blocked: {} -> {}", request_path, canonical.display());
    return Err(StaticFileError::NotFound);
  }

  if canonical.is_dir() {
    if !request_path.ends_with('/') {
      let location = if query.is_empty() {
        format!("{request_path}/")
      } else {
        format!("{request_path}/?{query}")
      };
      return Ok(Resolved::Redirect(location));
    }

    return match INDEX_FILES.iter().map(|name| canonical.join(name)).find(|index| index.is_file()) {
      Some(index) => read_file(&index),
      None => list_directory(&canonical, &decoded),
    };
  }

  if request_path.ends_with('/') {
    return Err(StaticFileError::NotFound);
  }

  read_file(&canonical)
}

/// Keeps only plain path segments, dropping `.` and `..` entirely.
fn relative_path(decoded: &str) -> PathBuf {
  decoded
    .split('/')
    .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
    .filter(|segment| !segment.contains('\\'))
    .collect()
}

fn read_file(path: &Path) -> Result<Resolved, StaticFileError> {
  let contents = std::fs::read(path).map_err(|err| match err.kind() {
    ErrorKind::PermissionDenied => StaticFileError::Forbidden("Permission denied"),
    _ => StaticFileError::NotFound,
  })?;
  let modified = std::fs::metadata(path).and_then(|metadata| metadata.modified()).ok();

  Ok(Resolved::File {
    contents,
    content_type: mime::content_type_for(path),
    modified,
  })
}

fn list_directory(dir: &Path, display_path: &str) -> Result<Resolved, StaticFileError> {
  let entries = std::fs::read_dir(dir)
    .map_err(|_| StaticFileError::Forbidden("No permission to list directory"))?
    .flatten()
    .map(|entry| {
      let is_symlink = entry.file_type().map(|kind| kind.is_symlink()).unwrap_or(false);
      ListingEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        is_dir: entry.path().is_dir(),
        is_symlink,
      }
    })
    .collect();

  Ok(Resolved::Listing(listing::render(display_path, entries)))
}

#[cfg(test)]
mod tests {
  use std::fs;

  use actix_web::{test, App};
  use bytes::Bytes;
  use tempfile::TempDir;

  use super::*;

  fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    fs::write(dir.path().join("songs.json"), "[1,2]").unwrap();
    fs::create_dir(dir.path().join("JS")).unwrap();
    fs::write(dir.path().join("JS").join("typewriter.js"), "let a = 1;").unwrap();
    fs::create_dir(dir.path().join("empty dir")).unwrap();
    dir
  }

  async fn get(dir: &TempDir, method: Method, uri: &str) -> actix_web::dev::ServiceResponse {
    let root = StaticRoot(Arc::from(dir.path().canonicalize().unwrap()));
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(root))
        .default_service(web::to(serve)),
    )
    .await;

    test::call_service(&app, test::TestRequest::default().method(method).uri(uri).to_request()).await
  }

  #[actix_web::test]
  async fn file_is_served_with_inferred_content_type() {
    let dir = site();
    let response = get(&dir, Method::GET, "/JS/typewriter.js?v=3").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/javascript");
    assert!(response.headers().get(header::LAST_MODIFIED).is_some());
    assert_eq!(test::read_body(response).await, Bytes::from_static(b"let a = 1;"));
  }

  #[actix_web::test]
  async fn root_serves_index_file() {
    let dir = site();
    let response = get(&dir, Method::GET, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test::read_body(response).await, Bytes::from_static(b"<h1>home</h1>"));
  }

  #[actix_web::test]
  async fn directory_without_index_is_listed() {
    let dir = site();
    let response = get(&dir, Method::GET, "/JS/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = test::read_body(response).await;
    let page = String::from_utf8_lossy(&body);
    assert!(page.contains("Directory listing for /JS/"));
    assert!(page.contains("<a href=\"typewriter.js\">typewriter.js</a>"));
  }

  #[actix_web::test]
  async fn encoded_directory_name_is_decoded() {
    let dir = site();
    let response = get(&dir, Method::GET, "/empty%20dir/").await;

    assert_eq!(response.status(), StatusCode::OK);
  }

  #[actix_web::test]
  async fn directory_without_slash_redirects() {
    let dir = site();
    let response = get(&dir, Method::GET, "/JS?x=1").await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/JS/?x=1");
  }

  #[actix_web::test]
  async fn missing_file_and_trailing_slash_on_file_are_not_found() {
    let dir = site();

    assert_eq!(get(&dir, Method::GET, "/nope.txt").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&dir, Method::GET, "/songs.json/").await.status(), StatusCode::NOT_FOUND);
  }

  #[actix_web::test]
  async fn traversal_stays_inside_root() {
    let dir = site();
    let outside = dir.path().parent().unwrap().join("outside-secret.txt");
    let _ = fs::write(&outside, "secret");

    let response = get(&dir, Method::GET, "/..%2Foutside-secret.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&dir, Method::GET, "/../songs.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let _ = fs::remove_file(outside);
  }

  #[actix_web::test]
  async fn other_methods_are_not_implemented() {
    let dir = site();
    let response = get(&dir, Method::POST, "/songs.json").await;

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(
      test::read_body(response).await,
      Bytes::from_static(b"Unsupported method ('POST')")
    );
  }

  // Plain `#[test]` here: the parent module's `actix_web::test` import is not
  // visible in this one.
  mod paths {
    use std::path::PathBuf;

    use super::super::relative_path;

    #[test]
    fn relative_path_drops_dot_segments() {
      assert_eq!(relative_path("/a/./b/../c"), PathBuf::from("a/b/c"));
      assert_eq!(relative_path("/"), PathBuf::new());
    }
  }
}
