use std::path::{Path, PathBuf};

/// Ordered list of candidate paths; the first existing file wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    candidates: Vec<PathBuf>,
}

impl Locator {
    pub fn new<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Locator {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// `file_name` inside each of `dirs`, in order.
    pub fn in_dirs(dirs: &[PathBuf], file_name: &str) -> Self {
        Locator::new(dirs.iter().map(|d| d.join(file_name)))
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn find(&self) -> Option<&Path> {
        let found = self.candidates.iter().find(|p| p.is_file()).map(PathBuf::as_path);
        match found {
            Some(p) => log::debug!("Resolved {}", p.display()),
            None => log::debug!("No candidate exists among {:?}", self.candidates),
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(b.join("model.json"), "{}").unwrap();

        let locator = Locator::in_dirs(&[a.clone(), b.clone()], "model.json");
        assert_eq!(locator.find(), Some(b.join("model.json").as_path()));

        std::fs::write(a.join("model.json"), "{}").unwrap();
        assert_eq!(locator.find(), Some(a.join("model.json").as_path()));
    }

    #[test]
    fn nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let locator = Locator::new([dir.path().join("missing.csv")]);
        assert_eq!(locator.find(), None);
        assert_eq!(locator.candidates().len(), 1);
    }

    #[test]
    fn directories_do_not_count_as_files() {
        let dir = tempfile::tempdir().unwrap();
        let locator = Locator::new([dir.path().to_path_buf()]);
        assert_eq!(locator.find(), None);
    }
}
