use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::info;
use crate::error::Result;
use crate::github::{GithubClient, Repository};
use crate::models::FontMetadata;

pub const DEFAULT_AXIS: &str = "wght";
pub const DEFAULT_STYLE: &str = "normal";

/// `{id}-{subset}-{axis}-{style}.woff2`, subset falling back to the font's
/// default subset.
pub fn derive_filename(meta: &FontMetadata, subset: Option<&str>, axis: &str, style: &str) -> String {
    let subset = subset.unwrap_or(&meta.def_subset);
    format!("{}-{}-{}-{}.woff2", meta.id, subset, axis, style)
}

// "sans-serif" -> "sans", anything else as is
pub fn normalize_category(category: &str) -> String {
    if category.starts_with("sans") {
        "sans".to_string()
    } else {
        category.to_string()
    }
}

/// One font folder: its metadata plus the sizes of every generated file.
#[derive(Clone, Debug)]
pub struct Font {
    pub metadata: FontMetadata,
    pub file_sizes: HashMap<String, u64>,
}

impl Font {
    pub fn file_size(&self, subset: Option<&str>, axis: &str, style: &str) -> Option<u64> {
        let filename = derive_filename(&self.metadata, subset, axis, style);
        self.file_sizes.get(&filename).copied()
    }

    async fn fetch(client: &GithubClient, repo: &Repository, root: &str, id: &str) -> Result<Self> {
        let folder = format!("{}/{}", root.trim_end_matches('/'), id);
        let metadata = client
            .file_json::<FontMetadata>(repo, &format!("{folder}/metadata.json"))
            .await?;
        let file_sizes = client.file_sizes(repo, &format!("{folder}/files")).await?;
        Ok(Self {
            metadata,
            file_sizes,
        })
    }
}

/// Fetch every font folder under `root` concurrently.
///
/// All tasks run to completion; if any failed, the first failure in folder
/// order is returned.
pub async fn collect_fonts(
    client: Arc<GithubClient>,
    repo: &Repository,
    root: &str,
    limit: Option<usize>,
) -> Result<Vec<Font>> {
    let mut names = client.folder_names(repo, root).await?;
    names.sort();
    if let Some(limit) = limit {
        names.truncate(limit);
    }
    info!(fonts = names.len(), root, "Collecting font metadata");

    let mut tasks = JoinSet::new();
    for (index, name) in names.into_iter().enumerate() {
        let client = Arc::clone(&client);
        let repo = repo.clone();
        let root = root.to_string();
        tasks.spawn(async move { (index, Font::fetch(&client, &repo, &root, &name).await) });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(index, _)| *index);

    let fonts = results
        .into_iter()
        .map(|(_, font)| font)
        .collect::<Result<Vec<_>>>()?;
    info!(fonts = fonts.len(), "Font metadata collected");
    Ok(fonts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn meta(id: &str, def_subset: &str) -> FontMetadata {
        FontMetadata {
            id: id.to_string(),
            def_subset: def_subset.to_string(),
            family: id.to_string(),
            category: "serif".to_string(),
            subsets: vec![def_subset.to_string()],
            styles: vec!["normal".to_string()],
            variable: BTreeMap::new(),
        }
    }

    #[test]
    fn derives_filename_with_defaults() {
        let m = meta("abc123", "latin");
        assert_eq!(
            derive_filename(&m, None, DEFAULT_AXIS, DEFAULT_STYLE),
            "abc123-latin-wght-normal.woff2"
        );
        assert_eq!(
            derive_filename(&m, Some("greek"), "opsz", "italic"),
            "abc123-greek-opsz-italic.woff2"
        );
    }

    #[test]
    fn derived_filename_uses_declared_default_subset() {
        let m = meta("noto-sans-jp", "japanese");
        assert_eq!(
            derive_filename(&m, None, "wght", "normal"),
            "noto-sans-jp-japanese-wght-normal.woff2"
        );
    }

    #[test]
    fn normalizes_category() {
        assert_eq!(normalize_category("sans-serif"), "sans");
        assert_eq!(normalize_category("serif"), "serif");
        assert_eq!(normalize_category("monospace"), "monospace");
    }

    #[test]
    fn looks_up_size_of_derived_file() {
        let font = Font {
            metadata: meta("inter", "latin"),
            file_sizes: HashMap::from([("inter-latin-wght-normal.woff2".to_string(), 12345)]),
        };
        assert_eq!(font.file_size(None, "wght", "normal"), Some(12345));
        assert_eq!(font.file_size(None, "wght", "italic"), None);
    }
}
