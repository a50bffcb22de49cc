use chrono::{DateTime, Utc};
use dashmap::DashMap;
use crate::report::{INDEX_PAGE, Page};
// app's shared state

pub struct AppState {
    pub pages: DashMap<String, String>, // page name -> html
    pub generated_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages: pages.into_iter().map(|p| (p.name, p.html)).collect(),
            generated_at: Utc::now(),
        }
    }

    pub fn page(&self, name: &str) -> Option<String> {
        let name = if name.is_empty() { INDEX_PAGE } else { name };
        self.pages.get(name).map(|html| html.clone())
    }
}
