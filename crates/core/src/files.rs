//! The virtual file store: an in-memory map from path to content.
//!
//! This stands in for a filesystem during one agent run. Paths are
//! relative, forward-slash separated, and never start with `/`. A path is
//! either present with content or absent; there is no "empty but exists"
//! state distinct from an empty string.
//!
//! The map is owned by exactly one run at a time and is only mutated by
//! tool execution.

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum matching lines listed per file in a search report.
pub const MAX_MATCHES_PER_FILE: usize = 10;

/// Maximum number of files listed in a search report.
pub const MAX_SEARCH_FILES: usize = 50;

/// Whether a write created a new path or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

/// In-memory file set, sorted by full path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct VirtualFileMap {
    files: BTreeMap<String, String>,
}

/// Normalize a caller- or LLM-supplied path.
///
/// Backslashes become `/`; leading `./` and `/` are stripped. Whitespace
/// is significant, so `"a.js "` and `"a.js"` are different files.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        } else {
            break;
        }
    }
    rest.to_string()
}

impl VirtualFileMap {
    /// Create an empty file map.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    /// Read a file's full content.
    pub fn read(&self, path: &str) -> Result<&str, ToolError> {
        let key = normalize_path(path);
        self.files
            .get(&key)
            .map(String::as_str)
            .ok_or(ToolError::FileNotFound(key))
    }

    /// Create or replace a file.
    pub fn write(&mut self, path: &str, content: impl Into<String>) -> Result<WriteOutcome, ToolError> {
        let key = normalize_path(path);
        if key.trim().is_empty() {
            return Err(ToolError::InvalidArguments(format!("Invalid file path: '{path}'")));
        }
        match self.files.insert(key, content.into()) {
            Some(_) => Ok(WriteOutcome::Updated),
            None => Ok(WriteOutcome::Created),
        }
    }

    /// Remove a file, returning its last content.
    pub fn delete(&mut self, path: &str) -> Result<String, ToolError> {
        let key = normalize_path(path);
        self.files.remove(&key).ok_or(ToolError::FileNotFound(key))
    }

    /// All paths in alphabetical order of the full path.
    pub fn paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render the paths as an indentation tree.
    ///
    /// One line per file, in full-path order: the file name indented two
    /// spaces per directory level. Directories do not get their own line.
    pub fn tree(&self) -> String {
        self.files
            .keys()
            .map(|path| {
                let depth = path.matches('/').count();
                let name = path.rsplit('/').next().unwrap_or(path);
                format!("{}{}", "  ".repeat(depth), name)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Case-insensitive line search across files.
    ///
    /// `query` is tried as a regex first; if it does not compile it is
    /// matched as a plain substring. `file_pattern` is a glob over the full
    /// path in which `*` also matches `/`.
    pub fn search(&self, query: &str, file_pattern: Option<&str>) -> SearchReport {
        let matcher = LineMatcher::new(query);
        let filter = file_pattern.map(PathFilter::new);

        let mut report = SearchReport::default();
        for (path, content) in &self.files {
            if let Some(filter) = &filter
                && !filter.matches(path)
            {
                continue;
            }

            let mut file = FileMatches {
                path: path.clone(),
                matches: Vec::new(),
                total: 0,
            };
            for (idx, line) in content.lines().enumerate() {
                if matcher.is_match(line) {
                    file.total += 1;
                    if file.matches.len() < MAX_MATCHES_PER_FILE {
                        file.matches.push(LineMatch {
                            line: idx + 1,
                            text: line.trim().to_string(),
                        });
                    }
                }
            }

            if file.total == 0 {
                continue;
            }
            report.total_matches += file.total;
            if report.files.len() < MAX_SEARCH_FILES {
                report.files.push(file);
            } else {
                report.omitted_files += 1;
            }
        }
        report
    }

    /// Heuristic: does this file set look like a fullstack (server) app?
    pub fn is_fullstack(&self) -> bool {
        self.files.contains_key("server.js")
            || self.files.contains_key("package.json")
            || self
                .files
                .keys()
                .any(|p| p.starts_with("routes/") || p.starts_with("middleware/"))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.files
    }
}

impl From<BTreeMap<String, String>> for VirtualFileMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<VirtualFileMap> for BTreeMap<String, String> {
    fn from(map: VirtualFileMap) -> Self {
        map.files
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for VirtualFileMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut files = BTreeMap::new();
        for (path, content) in iter {
            let key = normalize_path(path.as_ref());
            if !key.trim().is_empty() {
                files.insert(key, content.into());
            }
        }
        Self { files }
    }
}

enum LineMatcher {
    Regex(regex_lite::Regex),
    Literal(String),
}

impl LineMatcher {
    fn new(query: &str) -> Self {
        match regex_lite::Regex::new(&format!("(?i){query}")) {
            Ok(re) => Self::Regex(re),
            Err(_) => Self::Literal(query.to_lowercase()),
        }
    }

    fn is_match(&self, line: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(line),
            Self::Literal(needle) => line.to_lowercase().contains(needle),
        }
    }
}

enum PathFilter {
    Glob(glob::Pattern),
    Exact(String),
}

impl PathFilter {
    fn new(pattern: &str) -> Self {
        match glob::Pattern::new(pattern) {
            Ok(p) => Self::Glob(p),
            Err(_) => Self::Exact(pattern.to_string()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Glob(p) => p.matches(path),
            Self::Exact(s) => s == path,
        }
    }
}

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    /// 1-based line number
    pub line: usize,
    /// The line, trimmed
    pub text: String,
}

/// Matches within a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatches {
    pub path: String,
    /// At most [`MAX_MATCHES_PER_FILE`] listed matches
    pub matches: Vec<LineMatch>,
    /// Total number of matching lines in the file
    pub total: usize,
}

/// The result of [`VirtualFileMap::search`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    /// At most [`MAX_SEARCH_FILES`] files, in path order
    pub files: Vec<FileMatches>,
    /// Matching lines across all files, listed or not
    pub total_matches: usize,
    /// Files that matched but were cut from `files`
    pub omitted_files: usize,
}

impl SearchReport {
    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    /// Render the report as text for the LLM.
    pub fn render(&self, query: &str) -> String {
        if self.is_empty() {
            return format!("No matches found for \"{query}\"");
        }

        let mut lines = Vec::new();
        for file in &self.files {
            lines.push(format!("\n{}:", file.path));
            for m in &file.matches {
                lines.push(format!("  Line {}: {}", m.line, m.text));
            }
            if file.total > file.matches.len() {
                lines.push(format!("  ... and {} more matches", file.total - file.matches.len()));
            }
        }
        if self.omitted_files > 0 {
            lines.push(format!("\n... and {} more files with matches", self.omitted_files));
        }
        lines.join("\n")
    }
}
