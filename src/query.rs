//! List-view query state, round-tripped through the URL query string.
//!
//! The blog listing persists `page`, `category` and `search` in the URL, so
//! the view can be rebuilt from a link alone.
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            category: None,
            search: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ListQuery {
    /// Parse `page=2&category=Kitchen&search=oak`. Accepts an optional
    /// leading `?`. Unknown keys are ignored; a missing or malformed page
    /// means page 1.
    pub fn from_url_query(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut query = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "page" => query.page = value.trim().parse::<u32>().unwrap_or(1).max(1),
                "category" => query.category = non_blank(Some(value.into_owned())),
                "search" => query.search = non_blank(Some(value.into_owned())),
                _ => {}
            }
        }
        query
    }

    /// Encode back to a query string. Page 1 and empty filters are omitted,
    /// so the unfiltered first page encodes to "".
    pub fn to_url_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if self.page > 1 {
            out.append_pair("page", &self.page.to_string());
        }
        if let Some(category) = &self.category {
            out.append_pair("category", category);
        }
        if let Some(search) = &self.search {
            out.append_pair("search", search);
        }
        out.finish()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Changing a filter always returns to the first page.
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = non_blank(category);
        self.page = 1;
        self
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = non_blank(search);
        self.page = 1;
        self
    }

    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_filtered(&self) -> bool {
        self.category.is_some() || self.search.is_some()
    }
}
