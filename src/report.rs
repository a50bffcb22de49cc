use clap::ValueEnum;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::path::Path;
use tracing::info;
use crate::error::{Error, Result};
use crate::font::Font;
use crate::models::AxisRange;

// Fonts without this subset are left out of every table
pub const REPORT_SUBSET: &str = "latin";
pub const INDEX_PAGE: &str = "index.html";

/// Variable-font axes a report can be ranked along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Axis {
    #[value(name = "wght")]
    Weight,
    #[value(name = "wdth")]
    Width,
    #[value(name = "opsz")]
    OpticalSize,
    #[value(name = "ital")]
    Italic,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Weight, Axis::Width, Axis::OpticalSize, Axis::Italic];

    pub fn tag(self) -> &'static str {
        match self {
            Axis::Weight => "wght",
            Axis::Width => "wdth",
            Axis::OpticalSize => "opsz",
            Axis::Italic => "ital",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::Weight => "Weight",
            Axis::Width => "Width",
            Axis::OpticalSize => "Optical size",
            Axis::Italic => "Italic",
        }
    }

    pub fn page_name(self) -> String {
        format!("{}.html", self.tag())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub id: String,
    pub family: String,
    pub category: String,
    pub range: AxisRange,
    pub size: u64,
}

// A rendered html document and the file name it is published under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub name: String,
    pub html: String,
}

/// Fonts that support latin, declare `axis` and ship the derived file for it
/// (default subset), smallest first.
pub fn build_rows(fonts: &[Font], axis: Axis, style: &str) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = fonts
        .iter()
        .filter(|font| font.metadata.supports_subset(REPORT_SUBSET))
        .filter_map(|font| {
            let range = *font.metadata.axis(axis.tag())?;
            let size = font.file_size(None, axis.tag(), style)?;
            Some(ReportRow {
                id: font.metadata.id.clone(),
                family: font.metadata.family.clone(),
                category: font.metadata.category.clone(),
                range,
                size,
            })
        })
        .collect();

    rows.sort_by(|a, b| a.size.cmp(&b.size).then_with(|| a.id.cmp(&b.id)));
    rows
}

pub fn render_table(axis: Axis, style: &str, rows: &[ReportRow]) -> String {
    let title = format!("Variable fonts by file size: {} ({})", axis.label(), axis.tag());
    let mut body = String::new();

    body.push_str(&format!(
        "<p>{} fonts supporting <code>{}</code>, default subset files, style <code>{}</code>. <a href=\"{}\">All axes</a></p>\n",
        rows.len(),
        REPORT_SUBSET,
        encode_text(style),
        INDEX_PAGE
    ));
    body.push_str("<table>\n<thead><tr><th>#</th><th>Family</th><th>Id</th><th>Category</th><th>Range</th><th>Bytes</th><th>Size</th></tr></thead>\n<tbody>\n");
    for (i, row) in rows.iter().enumerate() {
        body.push_str(&format!(
            "<tr><td>{}</td><td><a href=\"https://fontsource.org/fonts/{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            i + 1,
            encode_double_quoted_attribute(&row.id),
            encode_text(&row.family),
            encode_text(&row.id),
            encode_text(&row.category),
            format_range(&row.range),
            row.size,
            format_size(row.size),
        ));
    }
    body.push_str("</tbody>\n</table>\n");

    document(&title, &body)
}

pub fn render_index(pages: &[(Axis, usize)]) -> String {
    let mut body = String::from("<ul>\n");
    for (axis, count) in pages {
        body.push_str(&format!(
            "<li><a href=\"{}\">{} ({})</a>: {} fonts</li>\n",
            axis.page_name(),
            axis.label(),
            axis.tag(),
            count
        ));
    }
    body.push_str("</ul>\n");
    document("Variable fonts by file size", &body)
}

/// Render one page per axis plus the index.
pub fn render_pages(fonts: &[Font], axes: &[Axis], style: &str) -> Vec<Page> {
    let mut pages = Vec::with_capacity(axes.len() + 1);
    let mut counts = Vec::with_capacity(axes.len());

    for &axis in axes {
        let rows = build_rows(fonts, axis, style);
        info!(axis = axis.tag(), rows = rows.len(), "Rendered table");
        counts.push((axis, rows.len()));
        pages.push(Page {
            name: axis.page_name(),
            html: render_table(axis, style, &rows),
        });
    }

    pages.push(Page {
        name: INDEX_PAGE.to_string(),
        html: render_index(&counts),
    });
    pages
}

pub async fn write_pages(dir: &Path, pages: &[Page]) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for page in pages {
        let path = dir.join(&page.name);
        tokio::fs::write(&path, &page.html)
            .await
            .map_err(|source| Error::Io { path, source })?;
    }
    info!(dir = %dir.display(), pages = pages.len(), "Reports written");
    Ok(())
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\ntable {{ border-collapse: collapse; }}\nth, td {{ padding: 0.25em 0.75em; border-bottom: 1px solid #ddd; text-align: left; }}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = encode_text(title),
    )
}

fn format_range(range: &AxisRange) -> String {
    match (range.min, range.max) {
        (Some(min), Some(max)) => format!("{min}&ndash;{max}"),
        _ => String::new(),
    }
}

fn format_size(bytes: u64) -> String {
    format!("{:.1} kB", bytes as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FontMetadata;
    use std::collections::{BTreeMap, HashMap};

    fn font(id: &str, subsets: &[&str], axes: &[&str], files: &[(&str, u64)]) -> Font {
        Font {
            metadata: FontMetadata {
                id: id.to_string(),
                def_subset: "latin".to_string(),
                family: id.to_uppercase(),
                category: "sans".to_string(),
                subsets: subsets.iter().map(|s| s.to_string()).collect(),
                styles: vec!["normal".to_string()],
                variable: axes
                    .iter()
                    .map(|a| {
                        (
                            a.to_string(),
                            AxisRange {
                                min: Some(100.0),
                                max: Some(900.0),
                                default: Some(400.0),
                                step: Some(1.0),
                            },
                        )
                    })
                    .collect::<BTreeMap<_, _>>(),
            },
            file_sizes: files
                .iter()
                .map(|(name, size)| (name.to_string(), *size))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn includes_latin_font_with_axis_and_size() {
        let fonts = [font(
            "abc",
            &["latin", "greek"],
            &["wght"],
            &[("abc-latin-wght-normal.woff2", 12345)],
        )];
        let rows = build_rows(&fonts, Axis::Weight, "normal");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size, 12345);
        assert_eq!(rows[0].family, "ABC");
    }

    #[test]
    fn excludes_font_without_latin() {
        let fonts = [font(
            "abc",
            &["greek"],
            &["wght"],
            &[("abc-latin-wght-normal.woff2", 1)],
        )];
        assert!(build_rows(&fonts, Axis::Weight, "normal").is_empty());
    }

    #[test]
    fn excludes_font_without_file_for_axis() {
        let fonts = [font("abc", &["latin"], &["wght", "wdth"], &[("abc-latin-wght-normal.woff2", 1)])];
        assert!(build_rows(&fonts, Axis::Width, "normal").is_empty());
        assert_eq!(build_rows(&fonts, Axis::Weight, "normal").len(), 1);
    }

    #[test]
    fn rows_ascend_by_size_and_skip_ineligible_fonts() {
        let fonts = [
            font("big", &["latin"], &["wght"], &[("big-latin-wght-normal.woff2", 90_000)]),
            font("small", &["latin"], &["wght"], &[("small-latin-wght-normal.woff2", 10_000)]),
            font("mid", &["latin"], &["wght"], &[("mid-latin-wght-normal.woff2", 40_000)]),
            font("no-axis", &["latin"], &["wdth"], &[("no-axis-latin-wght-normal.woff2", 5)]),
            font("no-latin", &["cyrillic"], &["wght"], &[("no-latin-latin-wght-normal.woff2", 6)]),
        ];

        let rows = build_rows(&fonts, Axis::Weight, "normal");
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["small", "mid", "big"]);
        assert!(rows.windows(2).all(|w| w[0].size < w[1].size));
    }

    #[test]
    fn measures_file_in_default_subset() {
        let mut f = font("noto", &["cyrillic", "latin"], &["wght"], &[("noto-cyrillic-wght-normal.woff2", 777)]);
        f.metadata.def_subset = "cyrillic".to_string();

        let rows = build_rows(&[f], Axis::Weight, "normal");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size, 777);
    }

    #[test]
    fn default_subset_size_wins_over_latin_file() {
        let mut f = font(
            "noto",
            &["cyrillic", "latin"],
            &["wght"],
            &[("noto-cyrillic-wght-normal.woff2", 900), ("noto-latin-wght-normal.woff2", 300)],
        );
        f.metadata.def_subset = "cyrillic".to_string();

        let rows = build_rows(&[f], Axis::Weight, "normal");
        assert_eq!(rows[0].size, 900);
    }

    #[test]
    fn table_escapes_and_ranks() {
        let mut f = font("a", &["latin"], &["wght"], &[("a-latin-wght-normal.woff2", 2048)]);
        f.metadata.family = "A <b>".to_string();
        let rows = build_rows(&[f], Axis::Weight, "normal");
        let html = render_table(Axis::Weight, "normal", &rows);

        assert!(html.contains("A &lt;b&gt;"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("2.0 kB"));
        assert!(html.contains("100&ndash;900"));
    }

    #[test]
    fn index_links_every_axis() {
        let pages = render_pages(&[], &Axis::ALL, "normal");
        assert_eq!(pages.len(), 5);
        let index = pages.iter().find(|p| p.name == INDEX_PAGE).unwrap();
        for axis in Axis::ALL {
            assert!(index.html.contains(&format!("href=\"{}\"", axis.page_name())));
        }
    }

    #[tokio::test]
    async fn writes_pages_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let pages = render_pages(&[], &[Axis::Weight], "normal");

        write_pages(&out, &pages).await.unwrap();

        assert!(out.join("wght.html").exists());
        assert!(out.join(INDEX_PAGE).exists());
    }
}
