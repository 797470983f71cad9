//! Filename sanitization and collision resolution for downloaded images.
//!
//! Names come from two untrusted places (a text-generation endpoint and the
//! last segment of a scraped URL), so they are sanitized before being joined
//! onto the output directory. When the name is already taken, a timestamp
//! token is inserted between stem and extension: `foo.jpg` becomes
//! `foo-20240501_134501_123456.jpg`.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, Utc};

/// Name used when sanitization leaves nothing usable.
const EMPTY_NAME_FALLBACK: &str = "image.bin";

/// Longest sanitized name in bytes; leaves room for a disambiguation token
/// under the usual 255-byte filesystem limit.
pub(crate) const MAX_FILENAME_BYTES: usize = 200;

/// Extensions longer than this are treated as part of the stem when capping.
const MAX_EXTENSION_BYTES: usize = 16;

/// Byte length of a `timestamp_token`.
const TOKEN_LEN: usize = 22;

/// Last microsecond timestamp handed out, keeps tokens strictly increasing.
static LAST_TOKEN_MICROS: AtomicI64 = AtomicI64::new(0);

/// Returns a local-time token formatted `YYYYMMDD_HHMMSS_ffffff`.
///
/// Tokens are strictly increasing within the process: two calls in the same
/// microsecond still produce distinct values.
pub(crate) fn timestamp_token() -> String {
    let now = Utc::now().timestamp_micros();
    let micros = match LAST_TOKEN_MICROS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now.max(last + 1))
    }) {
        Ok(previous) | Err(previous) => now.max(previous + 1),
    };

    DateTime::<Utc>::from_timestamp_micros(micros)
        .unwrap_or_else(Utc::now)
        .with_timezone(&Local)
        .format("%Y%m%d_%H%M%S_%6f")
        .to_string()
}

/// Sanitizes a filename for filesystem safety.
///
/// Path separators and characters invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters become `_`. Surrounding
/// whitespace is trimmed. Dot-only names are rewritten so the result always
/// stays inside the output directory. Names longer than
/// [`MAX_FILENAME_BYTES`] are cut on a char boundary, keeping the extension.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return String::new();
    }

    let sanitized = if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    };
    cap_length(sanitized)
}

fn cap_length(name: String) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name;
    }

    let (stem, ext) = match split_extension(&name) {
        (stem, Some(ext)) if ext.len() <= MAX_EXTENSION_BYTES => (stem, Some(ext)),
        _ => (name.as_str(), None),
    };
    let budget = MAX_FILENAME_BYTES - ext.map_or(0, |ext| ext.len() + 1);
    let mut end = budget.min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    match ext {
        Some(ext) => format!("{}.{ext}", &stem[..end]),
        None => stem[..end].to_string(),
    }
}

/// Like [`sanitize_filename`], substituting a fixed name for empty input.
pub(crate) fn sanitize_or_default(name: &str) -> String {
    let sanitized = sanitize_filename(name);
    if sanitized.is_empty() {
        EMPTY_NAME_FALLBACK.to_string()
    } else {
        sanitized
    }
}

/// Inserts a timestamp token between stem and extension.
///
/// `photo.tar.gz` keeps only the last extension (`photo.tar-<token>.gz`);
/// names without an extension get the token appended. A token left by an
/// earlier disambiguation is replaced, not stacked.
#[must_use]
pub(crate) fn disambiguate(filename: &str) -> String {
    let token = timestamp_token();
    let (stem, ext) = split_extension(filename);
    let stem = strip_token(stem);
    match (stem, ext) {
        (stem, Some(ext)) => format!("{stem}-{token}.{ext}"),
        (stem, None) => format!("{stem}-{token}"),
    }
}

/// Picks the name to write under `dir`: `filename` if free, else a
/// disambiguated variant.
///
/// This is a single existence check. The write itself uses exclusive
/// creation (see [`super::HttpClient::download_to_new_file`]), which
/// catches the case where another task claims the same name in between.
pub(crate) fn resolve_collision(dir: &Path, filename: &str) -> (String, PathBuf) {
    let path = dir.join(filename);
    if !path.exists() {
        return (filename.to_string(), path);
    }

    let renamed = disambiguate(filename);
    let renamed_path = dir.join(&renamed);
    (renamed, renamed_path)
}

/// Removes a trailing `-<token>` from `stem`, if present.
fn strip_token(stem: &str) -> &str {
    let Some(cut) = stem.len().checked_sub(TOKEN_LEN + 1) else {
        return stem;
    };
    if !stem.is_char_boundary(cut) {
        return stem;
    }
    let (head, tail) = stem.split_at(cut);
    let Some(token) = tail.strip_prefix('-') else {
        return stem;
    };
    let is_token = token.bytes().enumerate().all(|(i, b)| match i {
        8 | 15 => b == b'_',
        _ => b.is_ascii_digit(),
    });
    if is_token && !head.is_empty() { head } else { stem }
}

fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < filename.len() => {
            (&filename[..pos], Some(&filename[pos + 1..]))
        }
        _ => (filename, None),
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
