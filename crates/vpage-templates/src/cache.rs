//! Template Cache
//!
//! Compiled templates keyed by path. Pages preload templates with
//! [`TemplateCache::load`]; [`TemplateCache::get`] falls back to a blocking
//! fetch for anything not loaded yet.

use crate::source::TemplateSource;
use crate::template::Template;
use crate::TemplateError;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Path -> compiled template
#[derive(Debug)]
pub struct TemplateCache<S> {
    source: S,
    cached: RefCell<HashMap<String, Rc<Template>>>,
}

impl<S: TemplateSource> TemplateCache<S> {
    /// Create an empty cache over `source`
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: RefCell::new(HashMap::new()),
        }
    }

    /// Render the template at `path` with `data`
    pub fn get(&self, path: &str, data: &Value) -> Result<String, TemplateError> {
        check_path(path)?;

        let cached = self.cached.borrow().get(path).cloned();
        let template = match cached {
            Some(template) => template,
            None => {
                let text = self.source.fetch_blocking(path)?;
                let template = self.insert(path, &text)?;
                tracing::warn!("Template '{}' needed to be loaded synchronously.", path);
                template
            }
        };

        Ok(template.render(data))
    }

    /// Fetch and compile the template at `path` unless already cached
    pub async fn load(&self, path: &str) -> Result<(), TemplateError> {
        check_path(path)?;
        if self.is_cached(path) {
            return Ok(());
        }

        let text = self.source.fetch(path).await?;
        self.insert(path, &text)?;
        tracing::debug!("Template '{}' loaded", path);
        Ok(())
    }

    /// Is the template at `path` cached
    pub fn is_cached(&self, path: &str) -> bool {
        self.cached.borrow().contains_key(path)
    }

    /// Number of cached templates
    pub fn len(&self) -> usize {
        self.cached.borrow().len()
    }

    /// Is the cache empty
    pub fn is_empty(&self) -> bool {
        self.cached.borrow().is_empty()
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    fn insert(&self, path: &str, text: &str) -> Result<Rc<Template>, TemplateError> {
        let template = Rc::new(Template::compile(text)?);
        self.cached
            .borrow_mut()
            .insert(path.to_string(), template.clone());
        Ok(template)
    }
}

fn check_path(path: &str) -> Result<(), TemplateError> {
    if path.trim().is_empty() {
        Err(TemplateError::BlankPath)
    } else {
        Ok(())
    }
}
