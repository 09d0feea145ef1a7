//! Decides which directory entries are candidate camera-trap images.

use std::collections::HashSet;
use std::path::Path;

/// Extensions written by camera traps
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// Filters directory entries down to candidate images
#[derive(Debug, Clone)]
pub struct ImageFilter {
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl ImageFilter {
    /// Accept `.jpg` / `.jpeg` in any letter case, skip hidden files
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include dot-files such as `._IMG_0001.JPG` resource forks
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the accepted extensions (compared case-insensitively)
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Check a file name against the filter
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_jpeg_in_any_case() {
        let filter = ImageFilter::new();
        assert!(filter.should_include(Path::new("/traps/IMG_0001.JPG")));
        assert!(filter.should_include(Path::new("/traps/img_0001.jpeg")));
        assert!(filter.should_include(Path::new("/traps/img_0001.JpEg")));
    }

    #[test]
    fn rejects_other_formats() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/traps/IMG_0001.PNG")));
        assert!(!filter.should_include(Path::new("/traps/notes.txt")));
        assert!(!filter.should_include(Path::new("/traps/no_extension")));
    }

    #[test]
    fn hidden_resource_forks_are_skipped() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/traps/._IMG_0001.JPG")));
        assert!(ImageFilter::new()
            .with_hidden(true)
            .should_include(Path::new("/traps/._IMG_0001.JPG")));
    }

    #[test]
    fn custom_extensions_are_case_insensitive() {
        let filter = ImageFilter::new().with_extensions(vec!["JPE".to_string()]);
        assert!(filter.should_include(Path::new("a.jpe")));
        assert!(!filter.should_include(Path::new("a.jpg")));
    }
}
