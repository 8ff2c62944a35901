//! Page driver over captured HTML documents.
//!
//! Serves one or more snapshots keyed by URL through the same interface as a
//! live browser, so field strategies can be run offline.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use super::driver::{MarkerContext, PageDriver};
use crate::error::DriverError;

const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];
const MAX_MARKER_CONTEXTS: usize = 20;

/// Captured HTML served as if it were a loaded page
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    pages: HashMap<String, String>,
    fallback: Option<String>,
    current: Option<String>,
}

impl StaticPage {
    /// Serve `html` for every URL without a dedicated snapshot
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            fallback: Some(html.into()),
            ..Default::default()
        }
    }

    /// Serve `html` when `url` is navigated to
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    fn source(&self) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .or(self.fallback.as_ref())
            .map(String::as_str)
    }

    fn with_document<T>(&self, f: impl FnOnce(&Html) -> T) -> Option<T> {
        self.source().map(|html| f(&Html::parse_document(html)))
    }

    fn first_match<T>(
        &self,
        selector: &str,
        f: impl FnOnce(ElementRef<'_>) -> Option<T>,
    ) -> Result<Option<T>, DriverError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .with_document(|doc| doc.select(&selector).next().and_then(f))
            .flatten())
    }
}

fn parse_selector(selector: &str) -> Result<Selector, DriverError> {
    Selector::parse(selector).map_err(|e| DriverError::Script(format!("{selector}: {e}")))
}

/// Text content of `element`, skipping script-like subtrees
fn visible_text(element: ElementRef<'_>) -> String {
    let mut words: Vec<&str> = Vec::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| HIDDEN_TAGS.contains(&el.value().name()));
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ")
}

/// Text of the element's direct text children only
fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect::<String>()
}

fn collect_marker_contexts(doc: &Html, markers: &[&str]) -> Vec<MarkerContext> {
    let Ok(all) = Selector::parse("body *") else {
        return Vec::new();
    };
    doc.select(&all)
        .filter(|el| !HIDDEN_TAGS.contains(&el.value().name()))
        .filter(|el| {
            let own = own_text(*el).to_ascii_lowercase();
            markers.iter().any(|m| own.contains(m))
        })
        .map(|el| MarkerContext {
            label: visible_text(el),
            context: el
                .parent()
                .and_then(ElementRef::wrap)
                .map(visible_text)
                .unwrap_or_default(),
        })
        .take(MAX_MARKER_CONTEXTS)
        .collect()
}

#[async_trait]
impl PageDriver for StaticPage {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        if !self.pages.contains_key(url) && self.fallback.is_none() {
            return Err(DriverError::Protocol(format!("no snapshot for {url}")));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self
            .current
            .clone()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn ready_state(&self) -> Result<String, DriverError> {
        Ok("complete".to_string())
    }

    async fn element_text(&self, selector: &str) -> Result<Option<String>, DriverError> {
        self.first_match(selector, |el| Some(visible_text(el)))
    }

    async fn element_attr(
        &self,
        selector: &str,
        attr: &str,
    ) -> Result<Option<String>, DriverError> {
        self.first_match(selector, |el| el.value().attr(attr).map(str::to_string))
    }

    async fn count(&self, selector: &str) -> Result<usize, DriverError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .with_document(|doc| doc.select(&selector).count())
            .unwrap_or(0))
    }

    async fn body_text(&self) -> Result<String, DriverError> {
        let selector = parse_selector("body")?;
        Ok(self
            .with_document(|doc| doc.select(&selector).next().map(visible_text))
            .flatten()
            .unwrap_or_default())
    }

    async fn marker_contexts(&self, markers: &[&str]) -> Result<Vec<MarkerContext>, DriverError> {
        Ok(self
            .with_document(|doc| collect_marker_contexts(doc, markers))
            .unwrap_or_default())
    }

    async fn close(self) -> Result<(), DriverError> {
        Ok(())
    }
}
