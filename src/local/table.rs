use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::id::{base36_id, unix_millis};

use super::{is_local_id, LocalStoreError};

const UNTITLED: &str = "Untitled Diagram";

/// A document persisted on the client only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDocument {
    pub id: String,
    pub content: Vec<u8>,
    pub created_at: SystemTime,
    pub updated_at: Option<SystemTime>,
}

/// Listing entry for a local document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSummary {
    pub id: String,
    pub title: String,
    pub created_at: SystemTime,
    /// Last update, or creation time if never updated.
    pub last_modified: SystemTime,
}

/// Search and pagination for [`LocalStore::list`](super::LocalStore::list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFilter {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: usize,
    /// Page size; 0 returns every match on one page.
    pub limit: usize,
}

impl Default for LocalFilter {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            limit: 10,
        }
    }
}

impl LocalFilter {
    pub fn all() -> Self {
        Self {
            limit: 0,
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn page(mut self, page: usize, limit: usize) -> Self {
        self.page = page.max(1);
        self.limit = limit;
        self
    }
}

/// One page of local summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPage {
    pub items: Vec<LocalSummary>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Title shown in listings: the `title` field of JSON content, if any.
fn title_of(content: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(content)
        .ok()
        .and_then(|value| {
            value
                .get("title")
                .and_then(|t| t.as_str())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Ordered local documents, shared by the in-memory and file stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct LocalTable {
    documents: Vec<LocalDocument>,
}

impl LocalTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create(&mut self, prefix: &str, content: Vec<u8>, now: SystemTime) -> String {
        let id = format!("{}{}{}", prefix, base36_id(9), unix_millis(now));
        self.documents.push(LocalDocument {
            id: id.clone(),
            content,
            created_at: now,
            updated_at: None,
        });
        id
    }

    pub(crate) fn update(
        &mut self,
        prefix: &str,
        id: &str,
        content: Vec<u8>,
        now: SystemTime,
    ) -> Result<(), LocalStoreError> {
        if !is_local_id(id, prefix) {
            return Err(LocalStoreError::NotLocal(id.to_string()));
        }
        match self.documents.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                doc.content = content;
                doc.updated_at = Some(now);
            }
            None => {
                tracing::warn!(id, "local document missing on update; re-inserting");
                self.documents.push(LocalDocument {
                    id: id.to_string(),
                    content,
                    created_at: now,
                    updated_at: Some(now),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn read(&self, id: &str) -> Result<Vec<u8>, LocalStoreError> {
        self.documents
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.content.clone())
            .ok_or_else(|| LocalStoreError::NotFound(id.to_string()))
    }

    /// Returns true if the document existed.
    pub(crate) fn delete(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        self.documents.len() != before
    }

    pub(crate) fn list(&self, filter: &LocalFilter) -> LocalPage {
        let needle = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let matches: Vec<LocalSummary> = self
            .documents
            .iter()
            .map(|d| LocalSummary {
                id: d.id.clone(),
                title: title_of(&d.content),
                created_at: d.created_at,
                last_modified: d.updated_at.unwrap_or(d.created_at),
            })
            .filter(|s| match &needle {
                Some(needle) => s.title.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        let total = matches.len();
        let page = filter.page.max(1);
        let (items, total_pages) = if filter.limit == 0 {
            (matches, usize::from(total > 0))
        } else {
            let start = (page - 1).saturating_mul(filter.limit);
            let items = matches
                .into_iter()
                .skip(start)
                .take(filter.limit)
                .collect();
            (items, total.div_ceil(filter.limit))
        };

        LocalPage {
            items,
            total,
            page,
            limit: filter.limit,
            total_pages,
        }
    }
}
