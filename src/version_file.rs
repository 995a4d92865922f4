//! Version declaration file parsing and rewriting.
//!
//! A version file holds exactly one declaration of the form
//! `<words> version <words> (:= | =) "<literal>"`, for example:
//!
//! ```text
//! version := "1.0.0"
//! ThisBuild / version := "1.0.0"
//! val version = "0.9.0-SNAPSHOT"
//! ```
//!
//! The file is parsed before it is touched. Only the bytes of the quoted
//! literal are replaced; a missing, duplicated or malformed declaration is an
//! error and the file is left alone.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ReleaseError, Result};

/// Lines that mention `version` before an assignment operator.
fn candidate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^[^"=]*\bversion\b[^"=]*="#).expect("candidate pattern is valid")
    })
}

/// A well-formed declaration: one literal after the operator, optional trailing comment.
fn declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^[^"=]*\bversion\b[^"=]*(?::=|=)\s*"(?P<value>[^"\\]*)"\s*(?://[^"]*)?$"#,
        )
        .expect("declaration pattern is valid")
    })
}

/// Location of the version literal inside the file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// 1-based line number
    pub line: usize,
    /// Byte range of the literal's contents, quotes excluded
    pub value_range: Range<usize>,
}

/// A parsed version file ready to be rewritten.
#[derive(Debug, Clone)]
pub struct VersionFile {
    path: PathBuf,
    contents: String,
    declaration: Declaration,
}

impl VersionFile {
    /// Reads and parses the version file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ReleaseError::version_file(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::parse(path, contents)
    }

    /// Parses already loaded contents. `path` is used for messages and [`save`](Self::save).
    pub fn parse(path: impl Into<PathBuf>, contents: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let contents = contents.into();
        let declaration = locate_declaration(&path, &contents)?;
        Ok(VersionFile {
            path,
            contents,
            declaration,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    /// The version currently declared
    pub fn version(&self) -> &str {
        &self.contents[self.declaration.value_range.clone()]
    }

    /// Replaces the declared literal in memory.
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        validate_version(version)?;

        let range = self.declaration.value_range.clone();
        self.contents.replace_range(range.clone(), version);
        self.declaration.value_range = range.start..range.start + version.len();
        Ok(())
    }

    /// Writes the current contents back to [`path`](Self::path).
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.contents).map_err(|e| {
            ReleaseError::version_file(format!("cannot write '{}': {}", self.path.display(), e))
        })
    }
}

/// Loads `path`, replaces its version with `version` and saves it.
///
/// Returns the version that was declared before the rewrite.
pub fn write_version(path: impl AsRef<Path>, version: &str) -> Result<String> {
    let mut file = VersionFile::load(path)?;
    let previous = file.version().to_string();
    file.set_version(version)?;
    file.save()?;
    tracing::debug!(
        path = %file.path().display(),
        line = file.declaration().line,
        from = %previous,
        to = %version,
        "rewrote version declaration"
    );
    Ok(previous)
}

/// Checks that `version` can live inside a double-quoted literal.
///
/// Nothing else is checked: the release tooling treats versions as opaque text.
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(ReleaseError::invalid_version(version, "version is empty"));
    }
    if let Some(c) = version.chars().find(|c| is_forbidden_char(*c)) {
        return Err(ReleaseError::invalid_version(
            version,
            format!("contains forbidden character {:?}", c),
        ));
    }
    Ok(())
}

/// Characters that cannot appear inside an unescaped double-quoted literal.
pub fn is_forbidden_char(c: char) -> bool {
    matches!(c, '"' | '\\') || c.is_control()
}

fn locate_declaration(path: &Path, contents: &str) -> Result<Declaration> {
    let mut found: Vec<Declaration> = Vec::new();
    let mut offset = 0;

    for (index, raw_line) in contents.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw_line.len();

        let line = raw_line.trim_end_matches('\n').trim_end_matches('\r');
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
            continue;
        }
        if !candidate_regex().is_match(line) {
            continue;
        }

        let line_no = index + 1;
        let captures = declaration_regex().captures(line).ok_or_else(|| {
            ReleaseError::version_file(format!(
                "{}:{}: version declaration must hold exactly one quoted literal: {}",
                path.display(),
                line_no,
                line.trim()
            ))
        })?;
        let value = captures
            .name("value")
            .ok_or_else(|| ReleaseError::version_file("declaration has no literal"))?;

        found.push(Declaration {
            line: line_no,
            value_range: line_start + value.start()..line_start + value.end(),
        });
    }

    match found.len() {
        0 => Err(ReleaseError::version_file(format!(
            "{}: no version declaration found",
            path.display()
        ))),
        1 => Ok(found.remove(0)),
        _ => {
            let lines: Vec<String> = found.iter().map(|d| d.line.to_string()).collect();
            Err(ReleaseError::version_file(format!(
                "{}: ambiguous version declarations on lines {}",
                path.display(),
                lines.join(", ")
            )))
        }
    }
}
