//! Where rendered clips land on disk.

use std::path::{Path, PathBuf};

use clipforge_core::VariantSpec;

/// Maps (source, variant) pairs to output paths.
///
/// Outputs go to `<output_root>/<folder>/<relative dir>/<stem><suffix><ext>`,
/// where the relative dir is the source's directory under the input root.
/// Sources outside the input root keep only their file name.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    input_root: Option<PathBuf>,
    output_root: PathBuf,
}

impl OutputLayout {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: Some(input_root.into()),
            output_root: output_root.into(),
        }
    }

    /// Layout for single-file runs with no input tree to mirror.
    pub fn flat(output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: None,
            output_root: output_root.into(),
        }
    }

    /// Final output path for `source` rendered as `spec`.
    pub fn output_path(&self, source: &Path, spec: &VariantSpec) -> PathBuf {
        let mut dir = self.output_root.join(&spec.output_folder);
        if let Some(rel) = self.relative_dir(source) {
            dir.push(rel);
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = match source.extension() {
            Some(ext) => format!("{stem}{}.{}", spec.output_suffix, ext.to_string_lossy()),
            None => format!("{stem}{}", spec.output_suffix),
        };
        dir.join(file_name)
    }

    fn relative_dir<'a>(&self, source: &'a Path) -> Option<&'a Path> {
        let root = self.input_root.as_deref()?;
        let parent = source.parent()?;
        parent
            .strip_prefix(root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
    }
}
