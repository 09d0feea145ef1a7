//! Classification and export settings.

use crate::core::classifier::DEFAULT_BATCH_SIZE;
use crate::core::consolidate::DuplicatePolicy;
use crate::core::export::LinkMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Appended to output folder names
pub const DEFAULT_SUFFIX: &str = "classified";

/// Settings for the classify pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOptions {
    /// Where sorted folders go. Empty means next to the input root.
    pub output_dir: PathBuf,
    pub suffix: String,
    /// Model handed to the classifier factory
    pub model_path: Option<PathBuf>,
    pub batch_size: usize,
    /// Label vocabulary, also the order of output folders
    pub labels: Vec<String>,
    /// Label whole trigger events by their most confident image
    pub aggregate_events: bool,
    pub link_mode: LinkMode,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ClassificationOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            suffix: DEFAULT_SUFFIX.to_string(),
            model_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
            labels: Vec::new(),
            aggregate_events: false,
            link_mode: LinkMode::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl ClassificationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn aggregate_events(mut self, aggregate: bool) -> Self {
        self.aggregate_events = aggregate;
        self
    }

    pub fn link_mode(mut self, mode: LinkMode) -> Self {
        self.link_mode = mode;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Output folder for a work item.
    ///
    /// - root leaf `/in/site` -> `<out>/site_classified`
    /// - child `/in/site/cam1` -> `<out>/site_classified/cam1`
    pub fn output_path_for(&self, item: &Path, parent: Option<&Path>) -> PathBuf {
        let root = parent.unwrap_or(item);
        let base = if self.output_dir.as_os_str().is_empty() {
            root.parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        } else {
            self.output_dir.clone()
        };

        let root_dir = base.join(format!("{}_{}", dir_name(root), self.suffix));
        match parent {
            Some(_) => root_dir.join(dir_name(item)),
            None => root_dir,
        }
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_leaf_gets_suffixed_folder() {
        let options = ClassificationOptions::new().output_dir("/out");
        assert_eq!(
            options.output_path_for(Path::new("/in/site"), None),
            PathBuf::from("/out/site_classified")
        );
    }

    #[test]
    fn child_nests_under_parent_folder() {
        let options = ClassificationOptions::new().output_dir("/out").suffix("sorted");
        assert_eq!(
            options.output_path_for(Path::new("/in/site/cam1"), Some(Path::new("/in/site"))),
            PathBuf::from("/out/site_sorted/cam1")
        );
    }

    #[test]
    fn empty_output_dir_writes_next_to_input() {
        let options = ClassificationOptions::new();
        assert_eq!(
            options.output_path_for(Path::new("/in/site/cam1"), Some(Path::new("/in/site"))),
            PathBuf::from("/in/site_classified/cam1")
        );
    }

    #[test]
    fn defaults_match_documented_values() {
        let options = ClassificationOptions::default();
        assert_eq!(options.suffix, "classified");
        assert_eq!(options.batch_size, 32);
        assert_eq!(options.link_mode, LinkMode::Symlink);
        assert_eq!(options.duplicate_policy, DuplicatePolicy::KeepAll);
    }
}
