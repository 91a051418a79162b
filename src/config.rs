use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::{ExtractorError, Result};

/// Page selection and file defaults read from the YAML config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(rename = "file", default)]
    pub source_file: Option<PathBuf>,
    #[serde(rename = "output", default)]
    pub output_file: Option<PathBuf>,
    #[serde(rename = "appendFirstPage", default)]
    pub append_markdown: Option<PathBuf>,
    #[serde(default)]
    pub pages: Vec<PageSelector>,
}

/// One entry of the `pages` list.
///
/// The YAML may spell the page number as `pageIndex`, `page` or `pageNumber`;
/// the first non-null one in that order becomes [`PageSelector::index`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "PageEntryYaml")]
pub struct PageSelector {
    pub name: Option<String>,
    pub index: Option<u32>,
}

#[derive(Deserialize)]
struct PageEntryYaml {
    #[serde(default)]
    name: Option<serde_yaml::Value>,
    #[serde(rename = "pageIndex", default)]
    page_index: Option<u32>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(rename = "pageNumber", default)]
    page_number: Option<u32>,
}

impl From<PageEntryYaml> for PageSelector {
    fn from(entry: PageEntryYaml) -> Self {
        Self {
            name: entry.name.and_then(scalar_name),
            index: entry.page_index.or(entry.page).or(entry.page_number),
        }
    }
}

/// Names are labels only; numbers and booleans are kept as their text.
fn scalar_name(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Config {
    /// Unique page numbers in first-occurrence order. Entries without an
    /// index are skipped.
    pub fn selected_pages(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for selector in &self.pages {
            let Some(index) = selector.index else {
                debug!(name = ?selector.name, "Page entry has no index, skipping");
                continue;
            };
            if seen.insert(index) {
                selected.push(index);
            } else {
                debug!(page = index, name = ?selector.name, "Duplicate page entry ignored");
            }
        }

        selected
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    info!(config_path = %path.display(), "Loading configuration from file");

    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = %path.display(), "Failed to read config file");
        ExtractorError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    let config: Config = serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = %path.display(), "Failed to parse config YAML");
        ExtractorError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    info!(
        file = ?config.source_file,
        output = ?config.output_file,
        pages = config.pages.len(),
        "Loaded config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).expect("valid config")
    }

    #[test]
    fn reads_all_top_level_keys() {
        let config = parse(
            r#"
file: input/plan.pdf
output: output/plan.pdf
appendFirstPage: intro.md
pages:
  - name: Warmup
    pageIndex: 2
"#,
        );

        assert_eq!(config.source_file, Some(PathBuf::from("input/plan.pdf")));
        assert_eq!(config.output_file, Some(PathBuf::from("output/plan.pdf")));
        assert_eq!(config.append_markdown, Some(PathBuf::from("intro.md")));
        assert_eq!(
            config.pages,
            vec![PageSelector {
                name: Some("Warmup".into()),
                index: Some(2)
            }]
        );
    }

    #[test]
    fn page_index_takes_precedence_over_other_keys() {
        let config = parse(
            r#"
pages:
  - pageIndex: 3
    page: 5
    pageNumber: 7
  - page: 9
    pageNumber: 11
  - pageNumber: 13
"#,
        );

        let indices: Vec<_> = config.pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![Some(3), Some(9), Some(13)]);
    }

    #[test]
    fn scalar_names_are_accepted_as_text() {
        let config = parse("pages:\n  - name: 5\n    pageIndex: 1\n  - name: true\n    page: 2\n  - name: [a]\n    page: 3\n");

        let names: Vec<_> = config.pages.iter().map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec![Some("5"), Some("true"), None]);
        assert_eq!(config.selected_pages(), vec![1, 2, 3]);
    }

    #[test]
    fn null_primary_key_falls_through() {
        let config = parse("pages:\n  - pageIndex: null\n    page: 4\n");
        assert_eq!(config.pages[0].index, Some(4));
    }

    #[test]
    fn selected_pages_are_unique_in_first_occurrence_order() {
        let config = parse(
            r#"
pages:
  - pageIndex: 5
  - name: no index here
  - page: 1
  - pageIndex: 5
  - pageNumber: 3
  - page: 1
"#,
        );

        assert_eq!(config.selected_pages(), vec![5, 1, 3]);
    }

    #[test]
    fn missing_pages_key_means_no_selection() {
        let config = parse("file: a.pdf\noutput: b.pdf\n");
        assert!(config.pages.is_empty());
        assert!(config.selected_pages().is_empty());
    }

    #[test]
    fn load_config_reads_file_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "file: plan.pdf\npages:\n  - pageIndex: 1").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.source_file, Some(PathBuf::from("plan.pdf")));
        assert_eq!(config.selected_pages(), vec![1]);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ExtractorError::ConfigRead { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pages: [\n  - pageIndex: -2").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ExtractorError::ConfigParse { .. }));
    }

    #[test]
    fn negative_page_index_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pages:\n  - pageIndex: -2").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ExtractorError::ConfigParse { .. }));
    }
}
