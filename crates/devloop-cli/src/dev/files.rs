//! Static file responses built on [`LiveReloadDir`].
//!
//! Everything here is blocking I/O; callers run it on the blocking pool.

use crate::dev::live_dir::{escape_html, inject_script, LiveReloadDir, ServedEntry, HTML_CONTENT_TYPE};
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use std::io::{self, Seek, SeekFrom};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use std::time::SystemTime;

/// Outcome of interpreting a `Range` header against a body length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range: serve the whole body.
    Full,
    /// Inclusive byte span.
    Partial { start: u64, end: u64 },
    Unsatisfiable,
}

/// Parse a single-range `bytes=` header.
///
/// Malformed headers and multi-range requests fall back to [`ByteRange::Full`].
pub fn parse_range(header: &str, len: u64) -> ByteRange {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = spec.trim().split_once('-') else {
        return ByteRange::Full;
    };

    match (first.trim(), last.trim()) {
        ("", "") => ByteRange::Full,
        // Suffix: the final n bytes.
        ("", suffix) => match suffix.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if len == 0 => ByteRange::Unsatisfiable,
            Ok(n) => ByteRange::Partial {
                start: len.saturating_sub(n),
                end: len - 1,
            },
            Err(_) => ByteRange::Full,
        },
        (start, "") => match start.parse::<u64>() {
            Ok(start) if start >= len => ByteRange::Unsatisfiable,
            Ok(start) => ByteRange::Partial {
                start,
                end: len - 1,
            },
            Err(_) => ByteRange::Full,
        },
        (start, end) => match (start.parse::<u64>(), end.parse::<u64>()) {
            (Ok(start), Ok(end)) if start > end => ByteRange::Full,
            (Ok(start), Ok(_)) if start >= len => ByteRange::Unsatisfiable,
            (Ok(start), Ok(end)) => ByteRange::Partial {
                start,
                end: end.min(len - 1),
            },
            _ => ByteRange::Full,
        },
    }
}

/// Format a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Build the response for `rel` (decoded, relative to the served root).
///
/// `raw_path` is the request path as received and is only used to build
/// redirects. With `head` set the body is left empty but headers describe the
/// full response.
pub fn respond(
    dir: &LiveReloadDir,
    rel: &str,
    raw_path: &str,
    range: Option<&str>,
    head: bool,
) -> Response {
    let mut entry = match dir.open(rel) {
        Ok(entry) => entry,
        Err(err) => return error_response(&err, rel),
    };

    if entry.is_dir() {
        if !rel.is_empty() && !rel.ends_with('/') {
            return (
                StatusCode::MOVED_PERMANENTLY,
                [(header::LOCATION, format!("{raw_path}/"))],
            )
                .into_response();
        }

        let index = format!("{rel}index.html");
        match dir.open(&index) {
            Ok(found) if !found.is_dir() => entry = found,
            Ok(_) => return listing(dir, &entry, rel, head),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return listing(dir, &entry, rel, head);
            }
            Err(err) => return error_response(&err, &index),
        }
    }

    match serve_entry(entry, range, head) {
        Ok(response) => response,
        Err(err) => error_response(&err, rel),
    }
}

fn serve_entry(mut entry: ServedEntry, range: Option<&str>, head: bool) -> io::Result<Response> {
    let len = entry.len();
    let (status, start, count) = match range.map_or(ByteRange::Full, |r| parse_range(r, len)) {
        ByteRange::Full => (StatusCode::OK, 0, len),
        ByteRange::Partial { start, end } => (StatusCode::PARTIAL_CONTENT, start, end - start + 1),
        ByteRange::Unsatisfiable => {
            return Ok((
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(header::CONTENT_RANGE, format!("bytes */{len}"))],
            )
                .into_response());
        }
    };

    let content_type = entry.content_type();
    let modified = entry.modified();
    let body = if head {
        Body::empty()
    } else {
        entry_body(entry, start, count)?
    };

    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(count));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(value) = modified
        .and_then(|time| HeaderValue::from_str(&http_date(time)).ok())
    {
        headers.insert(header::LAST_MODIFIED, value);
    }
    if status == StatusCode::PARTIAL_CONTENT {
        let range = format!("bytes {start}-{}/{len}", start + count - 1);
        if let Ok(value) = HeaderValue::from_str(&range) {
            headers.insert(header::CONTENT_RANGE, value);
        }
    }
    Ok(response)
}

/// Body for `count` bytes from `start`.
///
/// Files on disk are streamed from the open handle; only synthesized pages
/// are already in memory.
fn entry_body(entry: ServedEntry, start: u64, count: u64) -> io::Result<Body> {
    match entry {
        ServedEntry::Passthrough { mut file, .. } => {
            file.seek(SeekFrom::Start(start))?;
            let reader = tokio::fs::File::from_std(file).take(count);
            Ok(Body::from_stream(ReaderStream::new(reader)))
        }
        ServedEntry::Virtual(page) => {
            let mut data = page.into_bytes();
            let end = (start + count).min(data.len() as u64) as usize;
            data.truncate(end);
            data.drain(..(start as usize).min(end));
            Ok(Body::from(data))
        }
        ServedEntry::Directory { path, .. } => Err(io::Error::new(
            io::ErrorKind::IsADirectory,
            format!("{} is a directory", path.display()),
        )),
    }
}

/// Minimal HTML index of a directory without `index.html`.
fn listing(dir: &LiveReloadDir, entry: &ServedEntry, rel: &str, head: bool) -> Response {
    let Some(path) = entry.dir_path() else {
        return error_response(&io::Error::from(io::ErrorKind::NotFound), rel);
    };

    let mut names = match read_names(path) {
        Ok(names) => names,
        Err(err) => return error_response(&err, rel),
    };
    names.sort();

    let title = escape_html(&format!("/{rel}"));
    let mut html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Index of {title}</title></head><body>\n<h1>Index of {title}</h1>\n<ul>\n"
    );
    for name in &names {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(&encode_href(name)),
            escape_html(name)
        ));
    }
    html.push_str("</ul>\n</body></html>\n");

    let mut body = html.into_bytes();
    if dir.injects() {
        body = inject_script(body);
    }

    let len = body.len() as u64;
    let body = if head { Body::empty() } else { Body::from(body) };
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}

/// Entry names of a directory, directories suffixed with `/`.
fn read_names(path: &std::path::Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    Ok(names)
}

/// Percent-encode the characters that would break a relative link.
fn encode_href(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            c => out.push(c),
        }
    }
    out
}

fn error_response(err: &io::Error, name: &str) -> Response {
    let status = match err.kind() {
        io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        io::ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::warn!(%err, name, "failed to serve file");
    } else {
        tracing::debug!(%err, name, %status, "static request rejected");
    }

    let message = match status {
        StatusCode::NOT_FOUND => "404 page not found".to_string(),
        other => format!(
            "{} {}",
            other.as_u16(),
            other.canonical_reason().unwrap_or("error").to_lowercase()
        ),
    };
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{message}\n"),
    )
        .into_response()
}
