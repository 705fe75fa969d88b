//! Template Sources
//!
//! Where template text comes from.

use crate::TemplateError;
use smol::future::{BoxedLocal, FutureExt};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Provider of raw template text
pub trait TemplateSource {
    /// Fetch a template, blocking the caller
    fn fetch_blocking(&self, path: &str) -> Result<String, TemplateError>;

    /// Fetch a template asynchronously
    fn fetch(&self, path: &str) -> BoxedLocal<Result<String, TemplateError>>;
}

/// Templates held in memory
#[derive(Debug, Default)]
pub struct MemorySource {
    templates: RefCell<HashMap<String, String>>,
    fetches: Cell<usize>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template
    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        self.templates.borrow_mut().insert(path.into(), text.into());
    }

    /// Builder-style [`Self::insert`]
    pub fn with(self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Number of fetches served so far
    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }

    fn lookup(&self, path: &str) -> Result<String, TemplateError> {
        self.fetches.set(self.fetches.get() + 1);
        self.templates
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(path.to_string()))
    }
}

impl TemplateSource for MemorySource {
    fn fetch_blocking(&self, path: &str) -> Result<String, TemplateError> {
        self.lookup(path)
    }

    fn fetch(&self, path: &str) -> BoxedLocal<Result<String, TemplateError>> {
        let result = self.lookup(path);
        async move { result }.boxed_local()
    }
}

/// Templates read from files below a root directory
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Serve templates from `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// File backing a template path
    pub fn file_for(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl TemplateSource for DirSource {
    fn fetch_blocking(&self, path: &str) -> Result<String, TemplateError> {
        std::fs::read_to_string(self.file_for(path)).map_err(|e| io_error(path, e))
    }

    fn fetch(&self, path: &str) -> BoxedLocal<Result<String, TemplateError>> {
        let file = self.file_for(path);
        let path = path.to_string();
        async move {
            smol::fs::read_to_string(&file)
                .await
                .map_err(|e| io_error(&path, e))
        }
        .boxed_local()
    }
}

fn io_error(path: &str, e: io::Error) -> TemplateError {
    if e.kind() == io::ErrorKind::NotFound {
        TemplateError::NotFound(path.to_string())
    } else {
        TemplateError::Io {
            path: path.to_string(),
            source: e,
        }
    }
}
