//! Static front-end served from `gateway.static_dir`.
//!
//! Mounted as the router fallback, so API routes always win. Paths that
//! match no file get `index.html`, which lets the single-page app handle
//! `/web+gen:...` links itself.

use std::path::Path;

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tower_http::services::{ServeDir, ServeFile};

/// Extensions the browser must load as JavaScript modules.
const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "ts", "tsx", "jsx"];

const JAVASCRIPT: &str = "application/javascript; charset=utf-8";

/// File service over `root` with SPA fallback to `root/index.html`.
pub fn serve_dir(root: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(root).fallback(ServeFile::new(root.join("index.html")))
}

/// Force a JavaScript content type on script sources.
///
/// `.ts`/`.tsx` would otherwise be guessed as video or plain text and
/// refused by the browser's module loader.
pub async fn script_content_type(req: Request, next: Next) -> Response {
    let is_script = is_script_path(req.uri().path());
    let mut response = next.run(req).await;

    // A missing script falls back to index.html, which keeps its own type
    if is_script && response.status().is_success() && !is_html(&response) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(JAVASCRIPT));
    }

    response
}

fn is_script_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_extensions() {
        assert!(is_script_path("/app.js"));
        assert!(is_script_path("/index.tsx"));
        assert!(is_script_path("/lib/util.mjs"));
        assert!(is_script_path("/a/b.jsx"));
        assert!(is_script_path("/types.ts"));
        assert!(!is_script_path("/index.html"));
        assert!(!is_script_path("/manifest.json"));
        assert!(!is_script_path("/"));
        assert!(!is_script_path("/tsx"));
    }
}
