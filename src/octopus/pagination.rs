//! Bounded, restartable walk over `next` links

use crate::error::{OctologError, Result};
use crate::octopus::client::OctopusClient;
use crate::octopus::types::Page;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::marker::PhantomData;

/// Lazy sequence of pages of a paged endpoint
///
/// Nothing is fetched until [`Pages::next_page`] is called. The walk stops
/// when a page has no `next` link, fails once `max_pages` pages were fetched
/// and more are announced, and fails when a `next` link points back at a
/// page already visited.
pub struct Pages<'a, T> {
    client: &'a OctopusClient,
    endpoint_name: &'static str,
    api_key: Option<&'a str>,
    first: Url,
    next: Option<Url>,
    fetched: u32,
    max_pages: u32,
    visited: HashSet<String>,
    _marker: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Pages<'a, T> {
    pub(crate) fn new(
        client: &'a OctopusClient,
        endpoint_name: &'static str,
        api_key: Option<&'a str>,
        first: Url,
        max_pages: u32,
    ) -> Self {
        Self {
            client,
            endpoint_name,
            api_key,
            next: Some(first.clone()),
            first,
            fetched: 0,
            max_pages,
            visited: HashSet::new(),
            _marker: PhantomData,
        }
    }

    /// Fetch the next page; `Ok(None)` once the chain has ended
    pub async fn next_page(&mut self) -> Result<Option<Page<T>>> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };

        if self.fetched >= self.max_pages {
            return Err(OctologError::pagination(format!(
                "{} returned more than {} pages",
                self.endpoint_name, self.max_pages
            )));
        }
        if !self.visited.insert(url.as_str().to_string()) {
            return Err(OctologError::pagination(format!(
                "{} links back to already visited page {}",
                self.endpoint_name, url
            )));
        }

        let page: Page<T> = self.client.get_json(url, self.api_key).await?;
        self.fetched += 1;

        self.next = match page.next.as_deref() {
            Some(link) if !link.trim().is_empty() => Some(Url::parse(link).map_err(|e| {
                OctologError::api(format!("Invalid next link '{}': {}", link, e))
            })?),
            _ => None,
        };
        Ok(Some(page))
    }

    /// Go back to the first page
    pub fn restart(&mut self) {
        self.next = Some(self.first.clone());
        self.fetched = 0;
        self.visited.clear();
    }

    pub fn pages_fetched(&self) -> u32 {
        self.fetched
    }

    /// Concatenate the results of every remaining page
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page.results);
        }
        Ok(all)
    }
}
