//! A served directory that injects the live-reload client into pages.
//!
//! Every [`LiveReloadDir::open`] re-reads and re-sniffs the file, so the
//! result always reflects what is on disk right now.

use crate::dev::sniff::{classify, ContentKind, SNIFF_LEN};
use crate::dev::virtual_file::VirtualFile;
use std::fs::{self, File, Metadata, Permissions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Path of the server-sent events endpoint the reload client listens on.
pub const LIVE_PATH: &str = "/.live";

/// Client appended to HTML pages: reload on any message from [`LIVE_PATH`].
pub const RELOAD_SCRIPT: &str = "\n<script>\nvar es = new EventSource('/.live');\nes.onmessage = function(e) { window.location.reload(); }\n</script>\n";

/// Extensions served as-is even when live reload is on.
const ASSET_EXTENSIONS: &[&str] = &[
    "css",
    "js",
    "mjs",
    "json",
    "map",
    "svg",
    "xml",
    "wasm",
    "webmanifest",
];

/// Extensions always treated as HTML, fragments included.
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// Content type of every synthesized page.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A directory exposed to the HTTP layer.
#[derive(Debug, Clone)]
pub struct LiveReloadDir {
    root: PathBuf,
    inject: bool,
}

impl LiveReloadDir {
    /// `inject` off turns the adapter into a plain file server.
    pub fn new(root: impl Into<PathBuf>, inject: bool) -> Self {
        Self {
            root: root.into(),
            inject,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn injects(&self) -> bool {
        self.inject
    }

    /// Map a URL-style name (`/docs/a.html`, `docs/`) onto the filesystem.
    ///
    /// Any `..` component is rejected with `InvalidInput`.
    pub fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let mut path = self.root.clone();
        for part in name.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("path escapes the served directory: {name}"),
                    ));
                }
                part => {
                    // Reject anything the platform would read as more than
                    // one plain component (drive prefixes, backslashes).
                    let mut components = Path::new(part).components();
                    match (components.next(), components.next()) {
                        (Some(Component::Normal(_)), None) => path.push(part),
                        _ => {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidInput,
                                format!("invalid path component: {part}"),
                            ));
                        }
                    }
                }
            }
        }
        Ok(path)
    }

    /// Open `name` for serving.
    ///
    /// Directories come back as [`ServedEntry::Directory`]. HTML files get the
    /// reload script appended, other ASCII text is wrapped in an HTML page, and
    /// everything else is handed through untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` for missing files, `InvalidInput` for traversal attempts,
    /// and any I/O error from reading the file.
    pub fn open(&self, name: &str) -> io::Result<ServedEntry> {
        let path = self.resolve(name)?;
        let metadata = fs::metadata(&path)?;
        let display_name = name.trim_start_matches('/').to_string();

        if metadata.is_dir() {
            return Ok(ServedEntry::Directory {
                name: display_name,
                path,
                metadata,
            });
        }

        let mut file = File::open(&path)?;
        // Lengths come from the handle that will be read.
        let metadata = file.metadata()?;
        let mut data = Vec::with_capacity(SNIFF_LEN);
        file.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut data)?;
        let kind = if is_html_page(&path) {
            ContentKind::Html
        } else {
            classify(&data)
        };

        if !self.inject || kind == ContentKind::Binary || is_asset(&path) {
            file.rewind()?;
            return Ok(ServedEntry::Passthrough {
                name: display_name,
                file,
                metadata,
                kind,
            });
        }

        file.read_to_end(&mut data)?;
        let page = match kind {
            ContentKind::Html => inject_script(data),
            _ => wrap_text(&data),
        };
        tracing::trace!(name = %display_name, ?kind, "serving injected page");

        let virtual_file = VirtualFile::new(display_name, page)
            .with_metadata(Some(metadata.permissions()), metadata.modified().ok());
        Ok(ServedEntry::Virtual(virtual_file))
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn is_asset(path: &Path) -> bool {
    has_extension(path, ASSET_EXTENSIONS)
}

/// Pages named as HTML are injected whatever their first tag is.
fn is_html_page(path: &Path) -> bool {
    has_extension(path, HTML_EXTENSIONS)
}

/// Append the reload client to an HTML document or fragment.
pub fn inject_script(mut html: Vec<u8>) -> Vec<u8> {
    html.extend_from_slice(RELOAD_SCRIPT.as_bytes());
    html
}

/// Wrap plain text in a minimal page that also carries the reload client.
pub fn wrap_text(text: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(text);
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"></head><body><pre>{}</pre>{RELOAD_SCRIPT}</body></html>",
        escape_html(&text)
    )
    .into_bytes()
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// One opened entry, ready for the HTTP layer.
///
/// Whatever the variant, it reads and seeks like a regular file.
#[derive(Debug)]
pub enum ServedEntry {
    Directory {
        name: String,
        path: PathBuf,
        metadata: Metadata,
    },
    Passthrough {
        name: String,
        file: File,
        metadata: Metadata,
        kind: ContentKind,
    },
    Virtual(VirtualFile),
}

impl ServedEntry {
    /// Name relative to the served root.
    pub fn name(&self) -> &str {
        match self {
            ServedEntry::Directory { name, .. } | ServedEntry::Passthrough { name, .. } => name,
            ServedEntry::Virtual(file) => file.path(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, ServedEntry::Directory { .. })
    }

    pub fn is_injected(&self) -> bool {
        matches!(self, ServedEntry::Virtual(_))
    }

    /// Size in bytes of what reading the entry yields.
    pub fn len(&self) -> u64 {
        match self {
            ServedEntry::Directory { metadata, .. } | ServedEntry::Passthrough { metadata, .. } => {
                metadata.len()
            }
            ServedEntry::Virtual(file) => file.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn modified(&self) -> Option<SystemTime> {
        match self {
            ServedEntry::Directory { metadata, .. } | ServedEntry::Passthrough { metadata, .. } => {
                metadata.modified().ok()
            }
            ServedEntry::Virtual(file) => file.modified(),
        }
    }

    pub fn permissions(&self) -> Option<Permissions> {
        match self {
            ServedEntry::Directory { metadata, .. } | ServedEntry::Passthrough { metadata, .. } => {
                Some(metadata.permissions())
            }
            ServedEntry::Virtual(file) => file.permissions().cloned(),
        }
    }

    /// Filesystem path of a directory entry.
    pub fn dir_path(&self) -> Option<&Path> {
        match self {
            ServedEntry::Directory { path, .. } => Some(path),
            _ => None,
        }
    }

    /// `Content-Type` to serve the entry with.
    pub fn content_type(&self) -> String {
        match self {
            ServedEntry::Directory { .. } | ServedEntry::Virtual(_) => HTML_CONTENT_TYPE.to_string(),
            ServedEntry::Passthrough { name, kind, .. } => match mime_guess::from_path(name).first() {
                Some(mime) if mime.type_() == mime_guess::mime::TEXT => {
                    format!("{}; charset=utf-8", mime.essence_str())
                }
                Some(mime) => mime.essence_str().to_string(),
                None => match kind {
                    ContentKind::Html => HTML_CONTENT_TYPE.to_string(),
                    ContentKind::Text => "text/plain; charset=utf-8".to_string(),
                    ContentKind::Binary => "application/octet-stream".to_string(),
                },
            },
        }
    }

    fn is_a_directory(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::IsADirectory,
            format!("{} is a directory", self.name()),
        )
    }
}

impl Read for ServedEntry {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ServedEntry::Directory { .. } => Err(self.is_a_directory()),
            ServedEntry::Passthrough { file, .. } => file.read(buf),
            ServedEntry::Virtual(file) => file.read(buf),
        }
    }
}

impl Seek for ServedEntry {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ServedEntry::Directory { .. } => Err(self.is_a_directory()),
            ServedEntry::Passthrough { file, .. } => file.seek(pos),
            ServedEntry::Virtual(file) => file.seek(pos),
        }
    }
}
