//! Package specs and app names
//!
//! A `PackageSpec` is whatever `pip install` accepts: a requirement string
//! with optional extras/pins/markers, a remote URL, or a local path. The
//! spec is opaque to the rest of vapp except for deriving a default
//! `AppName`, the filesystem-safe key a cache entry lives under.
//!
//! The derivation rule is deliberately simple and documented here rather
//! than a replica of pip's grammar: take the base distribution token, then
//! normalize it PEP-503 style (lowercase, runs of `-_.` collapse to `-`).
//! Two specs that derive the same name share one cache entry; pass an
//! explicit `--name` to keep them apart.

use crate::error::{VappError, VappResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Archive suffixes stripped when deriving a name from a URL or path.
const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tar.bz2", ".tgz", ".zip", ".whl", ".git"];

/// A package identifier as understood by the installer.
///
/// Stored in normalized form: local path specs are absolutized at parse
/// time so the recorded spec stays stable across working directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageSpec(String);

impl PackageSpec {
    /// Parse and normalize a raw spec string.
    pub fn parse(raw: &str) -> VappResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VappError::InvalidPackageSpec {
                spec: raw.to_string(),
                reason: "empty spec".to_string(),
            });
        }

        if looks_like_local_path(trimmed) {
            let absolute = absolutize(Path::new(&expand_user(trimmed)))?;
            return Ok(Self(absolute.to_string_lossy().into_owned()));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The normalized spec string, as handed to the installer.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filesystem-safe key identifying one cached app environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppName(String);

impl AppName {
    /// Accept a caller-supplied name, normalizing it for filesystem safety.
    ///
    /// Path separators and other unsafe bytes map to `-`; leading dots are
    /// stripped so a name can never traverse or hide the entry directory.
    pub fn parse(explicit: &str) -> VappResult<Self> {
        let mut cleaned: String = explicit
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        while cleaned.starts_with('.') {
            cleaned.remove(0);
        }

        if cleaned.is_empty() || !cleaned.bytes().any(|b| b.is_ascii_alphanumeric()) {
            return Err(VappError::InvalidAppName {
                name: explicit.to_string(),
                reason: "no usable characters".to_string(),
            });
        }
        Ok(Self(cleaned))
    }

    /// Derive the default name from a package spec.
    ///
    /// Requirement strings are cut at the first extras/version/marker
    /// character; URLs and paths use the final segment minus archive
    /// suffixes and any trailing `-<version>` part.
    pub fn derive(spec: &PackageSpec) -> VappResult<Self> {
        let raw = spec.as_str();

        // A direct reference ("name @ https://...") names the package before
        // the URL, so the URL branch only applies when the scheme comes first.
        let token = if raw.starts_with('/') {
            path_token(raw)
        } else if let Some(scheme_pos) = raw.find("://") {
            let ref_cut = raw
                .find(|c: char| c == '@' || c.is_whitespace())
                .unwrap_or(raw.len());
            if scheme_pos < ref_cut {
                url_token(raw)
            } else {
                requirement_token(raw)
            }
        } else {
            requirement_token(raw)
        };

        let normalized = normalize_dist_name(&token);
        if normalized.is_empty() {
            return Err(VappError::InvalidPackageSpec {
                spec: raw.to_string(),
                reason: "cannot derive an app name; pass --name".to_string(),
            });
        }
        Ok(Self(normalized))
    }

    /// Resolve the name for a spec, preferring an explicit one if given.
    pub fn resolve(spec: &PackageSpec, explicit: Option<&str>) -> VappResult<Self> {
        match explicit {
            Some(name) if !name.trim().is_empty() => Self::parse(name),
            _ => Self::derive(spec),
        }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base token of a PEP 508-style requirement: everything up to the first
/// extras bracket, version operator, marker, direct reference, or space.
fn requirement_token(raw: &str) -> String {
    let end = raw
        .find(|c| matches!(c, '[' | '=' | '<' | '>' | '!' | '~' | ';' | '@') || c.is_whitespace())
        .unwrap_or(raw.len());
    raw[..end].to_string()
}

/// Final path segment of a URL, minus query/fragment/ref decoration.
fn url_token(raw: &str) -> String {
    let no_fragment = raw.split(['#', '?']).next().unwrap_or(raw);
    let segment = no_fragment
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("");
    // git refs may ride on the segment as repo.git@v1.0
    let segment = segment.split('@').next().unwrap_or(segment);
    strip_version_suffix(&strip_archive_suffix(segment))
}

/// Final component of a filesystem path.
fn path_token(raw: &str) -> String {
    let segment = Path::new(raw)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_version_suffix(&strip_archive_suffix(&segment))
}

fn strip_archive_suffix(segment: &str) -> String {
    for suffix in ARCHIVE_SUFFIXES {
        if let Some(stripped) = segment
            .to_ascii_lowercase()
            .strip_suffix(suffix)
            .map(|s| segment[..s.len()].to_string())
        {
            return stripped;
        }
    }
    segment.to_string()
}

/// Cut a `name-1.2...` segment at the first `-` that introduces a digit,
/// which covers both sdist (`tool-1.2`) and wheel (`tool-1.2-py3-...`)
/// naming.
fn strip_version_suffix(segment: &str) -> String {
    let bytes = segment.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'-' && bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
            return segment[..i].to_string();
        }
    }
    segment.to_string()
}

/// PEP-503-style normalization: lowercase, runs of `-_.` become one `-`,
/// anything else unsafe becomes `-`, edges trimmed.
fn normalize_dist_name(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut dash_pending = false;
    for c in token.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if dash_pending && !out.is_empty() {
                out.push('-');
            }
            dash_pending = false;
            out.push(c);
        } else {
            dash_pending = true;
        }
    }
    out
}

/// Whether a spec string is a local path rather than a requirement or URL.
fn looks_like_local_path(raw: &str) -> bool {
    if raw.contains("://") {
        return false;
    }
    raw.starts_with('/')
        || raw.starts_with("./")
        || raw.starts_with("../")
        || raw.starts_with("~/")
        || (raw.contains('/') && Path::new(raw).exists())
}

fn expand_user(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    raw.to_string()
}

/// Make a path absolute and drop `.`/`..` components lexically, without
/// requiring the target to exist yet.
fn absolutize(path: &Path) -> VappResult<PathBuf> {
    let base = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().map_err(|e| VappError::io("getting current directory", e))?
    };

    let mut out = base;
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}
