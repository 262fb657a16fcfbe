use std::path::PathBuf;

use crate::core::types::Language;

/// Locations of the on-disk artifacts inside one data directory.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    pub base_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        ArtifactLayout {
            base_dir: base_dir.into(),
        }
    }

    pub fn dictionary_path(&self, lang: Language) -> PathBuf {
        self.base_dir.join(format!("dict_{}.dat", lang.as_str()))
    }

    pub fn char_index_path(&self, lang: Language) -> PathBuf {
        self.base_dir.join(format!("index_{}.dat", lang.as_str()))
    }

    pub fn webpages_path(&self) -> PathBuf {
        self.base_dir.join("webpages.dat")
    }

    pub fn offsets_path(&self) -> PathBuf {
        self.base_dir.join("offsets.dat")
    }

    pub fn inverted_index_path(&self) -> PathBuf {
        self.base_dir.join("inverted_index.dat")
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_naming_scheme() {
        let layout = ArtifactLayout::new("data");
        assert_eq!(
            layout.dictionary_path(Language::Chinese),
            PathBuf::from("data/dict_cn.dat")
        );
        assert_eq!(
            layout.char_index_path(Language::English),
            PathBuf::from("data/index_en.dat")
        );
        assert_eq!(layout.webpages_path(), PathBuf::from("data/webpages.dat"));
        assert_eq!(layout.offsets_path(), PathBuf::from("data/offsets.dat"));
        assert_eq!(
            layout.inverted_index_path(),
            PathBuf::from("data/inverted_index.dat")
        );
    }
}
