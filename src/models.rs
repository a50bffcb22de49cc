use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use crate::font::normalize_category;

// One entry of a GitHub contents listing
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ContentEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

// The contents API answers with a list for directories and a single object for files
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum Contents {
    Listing(Vec<ContentEntry>),
    Single(ContentEntry),
}

/// Per-font `metadata.json` document.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct FontMetadata {
    pub id: String,
    #[serde(rename = "defSubset")]
    pub def_subset: String,
    pub family: String,
    #[serde(deserialize_with = "category")]
    pub category: String,
    #[serde(default)]
    pub subsets: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default, deserialize_with = "axes")]
    pub variable: BTreeMap<String, AxisRange>,
}

impl FontMetadata {
    pub fn supports_subset(&self, subset: &str) -> bool {
        self.subsets.iter().any(|s| s == subset)
    }

    pub fn axis(&self, axis: &str) -> Option<&AxisRange> {
        self.variable.get(axis)
    }
}

// fontsource writes axis values as strings ("100"), accept numbers too
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisRange {
    #[serde(default, deserialize_with = "number")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub default: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub step: Option<f64>,
}

fn category<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_category(&raw))
}

fn axes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, AxisRange>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Variable {
        Axes(BTreeMap<String, AxisRange>),
        // non-variable fonts carry `"variable": false`
        Flag(bool),
    }

    Ok(match Option::<Variable>::deserialize(deserializer)? {
        Some(Variable::Axes(axes)) => axes,
        Some(Variable::Flag(_)) | None => BTreeMap::new(),
    })
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Number>::deserialize(deserializer)? {
        Some(Number::Float(n)) => Some(n),
        Some(Number::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fontsource_metadata() {
        let json = r#"{
            "id": "roboto-flex",
            "family": "Roboto Flex",
            "subsets": ["cyrillic", "latin", "latin-ext"],
            "weights": [100, 1000],
            "styles": ["normal"],
            "defSubset": "latin",
            "variable": {
                "opsz": {"default": "14", "min": "8", "max": "144", "step": "1"},
                "wght": {"default": 400, "min": 100, "max": 1000, "step": 1}
            },
            "category": "sans-serif"
        }"#;

        let meta: FontMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.id, "roboto-flex");
        assert_eq!(meta.def_subset, "latin");
        assert_eq!(meta.category, "sans");
        assert!(meta.supports_subset("latin"));
        assert_eq!(meta.axis("opsz").unwrap().max, Some(144.0));
        assert_eq!(meta.axis("wght").unwrap().min, Some(100.0));
        assert!(meta.axis("wdth").is_none());
    }

    #[test]
    fn non_variable_font_has_no_axes() {
        let json = r#"{"id":"abc","family":"Abc","category":"serif","defSubset":"latin","variable":false}"#;
        let meta: FontMetadata = serde_json::from_str(json).unwrap();
        assert!(meta.variable.is_empty());
        assert_eq!(meta.category, "serif");
    }

    #[test]
    fn contents_distinguishes_listing_from_file() {
        let listing = r#"[{"name":"inter","path":"fonts/variable/inter","type":"dir","size":0,"download_url":null}]"#;
        let single = r#"{"name":"metadata.json","path":"x/metadata.json","type":"file","size":10,"download_url":"https://raw/x"}"#;

        assert!(matches!(serde_json::from_str::<Contents>(listing).unwrap(), Contents::Listing(v) if v[0].kind == EntryKind::Dir));
        assert!(matches!(serde_json::from_str::<Contents>(single).unwrap(), Contents::Single(e) if e.size == 10));
    }
}
