//! Include resolution and the per-compile cache of parsed translation units.
//!
//! A [`CompileContext`] owns all mutable state of one compile: the include
//! search path, the cache of finished units keyed by absolute path, and the
//! stack of files currently being parsed. Each physical file is parsed at
//! most once per context; units enter the cache only when complete, and an
//! include of a file that is still in flight is reported as a cycle.

use crate::ast::{FileType, Loc, TranslationUnit};
use crate::error::PdlError;
use crate::parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
struct InFlight {
    path: PathBuf,
    /// The `include` statement that pulled this file in; `None` for the root.
    included_at: Option<Loc>,
}

#[derive(Debug, Default)]
pub struct CompileContext {
    include_dirs: Vec<PathBuf>,
    parsed: HashMap<PathBuf, Arc<TranslationUnit>>,
    in_flight: Vec<InFlight>,
}

impl CompileContext {
    /// `include_dirs` are searched in order, then the working directory.
    pub fn new<I, P>(include_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        CompileContext {
            include_dirs: include_dirs.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    /// Parse a root file from disk.
    pub fn parse_file(
        &mut self,
        path: impl AsRef<Path>,
        filetype: FileType,
    ) -> Result<Arc<TranslationUnit>, PdlError> {
        let path = path.as_ref();
        let abs = path.canonicalize().map_err(|e| {
            self.error(
                Loc::whole_file(path.display().to_string()),
                format!("can't read `{}': {}", path.display(), e),
            )
        })?;
        self.parse_at(abs, filetype, None, None)
    }

    /// Parse a root file whose source is already in memory. `path` names the
    /// file in diagnostics and is the base for nothing else.
    pub fn parse_source(
        &mut self,
        source: &str,
        path: impl AsRef<Path>,
        filetype: FileType,
    ) -> Result<Arc<TranslationUnit>, PdlError> {
        let path = path.as_ref();
        let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        self.parse_at(abs, filetype, None, Some(source))
    }

    /// The unit cached for `path`, if it has been parsed.
    pub fn cached(&self, path: &Path) -> Option<&Arc<TranslationUnit>> {
        self.parsed.get(path)
    }

    pub fn parsed_files(&self) -> impl Iterator<Item = &Path> {
        self.parsed.keys().map(PathBuf::as_path)
    }

    /// Build a diagnostic decorated with the current include trail.
    pub fn error(&self, loc: Loc, message: impl Into<String>) -> PdlError {
        PdlError::new(loc, message).with_include_trail(self.include_trail())
    }

    /// Locations of the enclosing `include` statements, innermost first.
    pub(crate) fn include_trail(&self) -> Vec<Loc> {
        self.in_flight
            .iter()
            .rev()
            .filter_map(|frame| frame.included_at.clone())
            .collect()
    }

    /// First existing match for `file` in the include directories, then in
    /// the working directory.
    pub(crate) fn resolve_include_path(&self, file: &str) -> Option<PathBuf> {
        let found = self
            .include_dirs
            .iter()
            .map(|dir| dir.join(file))
            .chain(std::iter::once(PathBuf::from(file)))
            .find(|candidate| candidate.is_file())?;
        tracing::trace!(file, resolved = %found.display(), "resolved include");
        found.canonicalize().ok()
    }

    pub(crate) fn parse_included(
        &mut self,
        path: PathBuf,
        filetype: FileType,
        included_at: Loc,
    ) -> Result<Arc<TranslationUnit>, PdlError> {
        self.parse_at(path, filetype, Some(included_at), None)
    }

    fn parse_at(
        &mut self,
        path: PathBuf,
        filetype: FileType,
        included_at: Option<Loc>,
        source: Option<&str>,
    ) -> Result<Arc<TranslationUnit>, PdlError> {
        if let Some(tu) = self.parsed.get(&path) {
            tracing::trace!(file = %path.display(), "already parsed");
            return Ok(tu.clone());
        }
        let at = included_at
            .clone()
            .unwrap_or_else(|| Loc::whole_file(path.display().to_string()));
        if self.in_flight.iter().any(|frame| frame.path == path) {
            return Err(self.error(at, format!("cyclic include of `{}'", path.display())));
        }
        let source = match source {
            Some(source) => source.to_string(),
            None => std::fs::read_to_string(&path).map_err(|e| {
                self.error(at, format!("can't read `{}': {}", path.display(), e))
            })?,
        };

        tracing::debug!(
            file = %path.display(),
            %filetype,
            depth = self.in_flight.len(),
            "parsing"
        );
        self.in_flight.push(InFlight {
            path: path.clone(),
            included_at,
        });
        let result = parser::parse_unit(self, &source, &path, filetype);
        self.in_flight.pop();

        let tu = Arc::new(result?);
        tracing::debug!(file = %path.display(), "parsed");
        self.parsed.insert(path, tu.clone());
        Ok(tu)
    }
}
