//! Static file server for previewing a generated site.
//!
//! Serves the output directory over plain HTTP with `tiny_http`. There is no
//! rebuild or reload: run `build` again and refresh.
//!
//! Request resolution order:
//! 1. Exact file match → serve file
//! 2. Directory with `index.html` → serve `index.html`
//! 3. Anything else → 404
//!
//! The URL path is percent-decoded after the query string is stripped. Paths
//! containing a `..` segment are never resolved.

use std::fs;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Ports tried after the requested one is taken.
const MAX_PORT_RETRIES: u16 = 10;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to bind: {0}")]
    Bind(String),
    #[error("Output directory not found: {0} (run `build` first)")]
    MissingRoot(PathBuf),
}

/// A response decided without touching the network.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    File {
        path: PathBuf,
        content_type: &'static str,
    },
    NotFound,
}

/// Serve `root` until the process is stopped.
pub fn serve(root: &Path, bind: IpAddr, port: u16) -> Result<(), ServeError> {
    if !root.is_dir() {
        return Err(ServeError::MissingRoot(root.to_path_buf()));
    }
    let (server, addr) = try_bind_port(bind, port, MAX_PORT_RETRIES)?;
    println!("Serving {} at http://{}", root.display(), addr);

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, root) {
            println!("request error: {}", e);
        }
    }
    Ok(())
}

/// Bind to `base_port`, moving up one port at a time while it is in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr), ServeError> {
    let mut last_error = String::from("no ports tried");
    for offset in 0..max_retries.max(1) {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    println!("port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(ServeError::Bind(format!(
        "no free port in {}-{}: {}",
        base_port,
        base_port.saturating_add(max_retries.max(1) - 1),
        last_error
    )))
}

fn handle_request(request: Request, root: &Path) -> Result<(), ServeError> {
    let reply = resolve(root, request.url());
    let status = match &reply {
        Reply::File { .. } => 200,
        Reply::NotFound => 404,
    };
    println!("{} {} {}", request.method(), request.url(), status);

    match reply {
        Reply::File { path, content_type } => {
            let mut response = Response::from_data(fs::read(&path)?);
            if let Ok(header) = Header::from_bytes("Content-Type", content_type) {
                response.add_header(header);
            }
            request.respond(response)?;
        }
        Reply::NotFound => {
            let mut response =
                Response::from_string("404 Not Found").with_status_code(StatusCode(404));
            if let Ok(header) = Header::from_bytes("Content-Type", "text/plain; charset=utf-8") {
                response.add_header(header);
            }
            request.respond(response)?;
        }
    }
    Ok(())
}

/// Decide how to answer a request for `url` under `root`.
pub fn resolve(root: &Path, url: &str) -> Reply {
    match resolve_request_path(root, url) {
        Some(path) => {
            let content_type = guess_content_type(&path);
            Reply::File { path, content_type }
        }
        None => Reply::NotFound,
    }
}

/// Map a request URL to a file under `root`, if one should be served.
pub fn resolve_request_path(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = urlencoding::decode(path).ok()?;

    let mut local = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') => return None,
            s => local.push(s),
        }
    }

    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    if local.is_dir() && index.is_file() {
        return Some(index);
    }
    None
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
pub fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",

        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
