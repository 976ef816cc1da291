// ABOUTME: Local HTTP file server for the slidedecks application
// ABOUTME: Serves a built deck on an ephemeral port while the browser prints it

use crate::errors::{DeckError, Result};
use crate::layout::INDEX_HTML;
use log::{debug, error, info};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// An HTTP server rooted at one directory. Dropping it stops the server
/// and joins its thread.
pub struct FileServer {
    server: Arc<Server>,
    addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl FileServer {
    /// Bind to an OS-assigned port on localhost and start serving `root`
    pub fn start(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(DeckError::PathNotFoundError(root.to_path_buf()));
        }

        let server = Server::http("127.0.0.1:0")
            .map_err(|e| DeckError::ServerError(format!("Failed to start HTTP server: {}", e)))?;
        let addr = server.server_addr().to_ip().ok_or_else(|| {
            DeckError::ServerError("HTTP server is not bound to an IP address".to_string())
        })?;

        let server = Arc::new(server);
        let server_thread = server.clone();
        let root = root.to_path_buf();

        let handle = thread::spawn(move || {
            for request in server_thread.incoming_requests() {
                handle_request(&root, request);
            }
            debug!("HTTP server on {} stopped", addr);
        });

        info!("HTTP server listening on http://{}", addr);
        Ok(Self {
            server,
            addr,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.addr.port())
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("HTTP server thread panicked");
            }
        }
        info!("HTTP server on {} shut down", self.addr);
    }
}

fn handle_request(root: &Path, request: Request) {
    let file_path = resolve_request_path(root, request.url());
    debug!("Request for {:?} -> {:?}", request.url(), file_path);

    let result = match file_path {
        Some(path) if path.is_file() => match fs::read(&path) {
            Ok(content) => {
                let mut response = Response::from_data(content);
                if let Ok(header) =
                    Header::from_bytes(&b"Content-Type"[..], content_type(&path).as_bytes())
                {
                    response = response.with_header(header);
                }
                if let Ok(header) = Header::from_bytes(&b"Cache-Control"[..], &b"no-cache"[..]) {
                    response = response.with_header(header);
                }
                request.respond(response)
            }
            Err(e) => {
                error!("Failed to read file {:?}: {}", path, e);
                request.respond(
                    Response::from_string("Internal Server Error")
                        .with_status_code(StatusCode(500)),
                )
            }
        },
        _ => request.respond(Response::from_string("File not found").with_status_code(StatusCode(404))),
    };

    if let Err(e) = result {
        error!("Failed to send response: {}", e);
    }
}

/// Map a request URL to a file under `root`.
/// The query string is ignored and `/` maps to the index document.
/// Returns `None` for paths that would escape the root.
pub fn resolve_request_path(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or("/");
    let path = percent_decode(path)?;

    let mut resolved = root.to_path_buf();
    let mut segments = 0;
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." || segment.contains('\\') {
            return None;
        }
        resolved.push(segment);
        segments += 1;
    }

    if segments == 0 {
        resolved.push(INDEX_HTML);
    }
    Some(resolved)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

/// Content type inferred from the file extension
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html",
        "js" => "text/javascript",
        "css" => "text/css",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        _ => "application/octet-stream",
    }
}
