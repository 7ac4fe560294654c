// Coverage attachments of a replay, looked up by repository and file.

use std::collections::BTreeMap;

use super::types::CoverageAttachment;

/// Coverage attachments indexed by `(repository, path)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageRepo {
    files: BTreeMap<(String, String), CoverageAttachment>,
}

impl CoverageRepo {
    /// A later attachment for the same file replaces an earlier one.
    pub fn new(attachments: Vec<CoverageAttachment>) -> Self {
        let files = attachments
            .into_iter()
            .map(|attachment| {
                (
                    (attachment.repository.clone(), attachment.path.clone()),
                    attachment,
                )
            })
            .collect();
        Self { files }
    }

    pub fn get(&self, repository: &str, path: &str) -> Option<&CoverageAttachment> {
        self.files
            .get(&(repository.to_string(), path.to_string()))
    }

    /// First attachment for `path` in any repository.
    pub fn find_path(&self, path: &str) -> Option<&CoverageAttachment> {
        self.files.values().find(|attachment| attachment.path == path)
    }

    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        let mut seen: Vec<&str> = self.files.keys().map(|(repo, _)| repo.as_str()).collect();
        seen.dedup();
        seen.into_iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoverageAttachment> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
