//! Flattening of project files and change sets into delimited text blobs.
//!
//! The blobs are both the stored session payload and the fingerprint input,
//! so their layout is part of the cache-key format: changing it invalidates
//! every existing review entry.

use crate::types::{ChangeSet, ProjectFile};

/// Flatten project files, in order, into a single context blob.
pub fn build_project_context(files: &[ProjectFile]) -> String {
    let mut blob = String::with_capacity(
        files
            .iter()
            .map(|f| f.content.len() + 2 * f.path.len() + 32)
            .sum(),
    );
    for file in files {
        blob.push_str(&format!("\n--- FILE: {} ---\n", file.path));
        blob.push_str(&file.content);
        blob.push_str(&format!("\n--- END FILE: {} ---\n", file.path));
    }
    blob
}

/// Flatten a change set, in order, into a single changes blob.
pub fn build_changes_content(changes: &ChangeSet) -> String {
    let mut blob = String::new();
    for change in &changes.changes {
        if change.is_diff {
            blob.push_str("\n--- DIFF ---\n");
            blob.push_str(&change.content);
            blob.push_str("\n--- END DIFF ---\n");
        } else {
            blob.push_str(&format!("\n--- CHANGED FILE: {} ---\n", change.path));
            blob.push_str(&change.content);
            blob.push_str(&format!("\n--- END CHANGED FILE: {} ---\n", change.path));
        }
    }
    blob
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangedFile;

    #[test]
    fn test_project_context_layout() {
        let blob = build_project_context(&[ProjectFile::new("a.ts", "const x=1;")]);
        assert_eq!(blob, "\n--- FILE: a.ts ---\nconst x=1;\n--- END FILE: a.ts ---\n");
    }

    #[test]
    fn test_project_context_preserves_order() {
        let a = ProjectFile::new("a.ts", "A");
        let b = ProjectFile::new("b.ts", "B");
        let ab = build_project_context(&[a.clone(), b.clone()]);
        let ba = build_project_context(&[b, a]);
        assert_ne!(ab, ba);
        assert!(ab.find("a.ts").unwrap() < ab.find("b.ts").unwrap());
    }

    #[test]
    fn test_empty_inputs_give_empty_blobs() {
        assert_eq!(build_project_context(&[]), "");
        assert_eq!(build_changes_content(&ChangeSet::default()), "");
    }

    #[test]
    fn test_changes_layout() {
        let changes = ChangeSet {
            changes: vec![
                ChangedFile {
                    path: "a.ts".into(),
                    content: "+const x=2;".into(),
                    is_diff: true,
                },
                ChangedFile {
                    path: "b.ts".into(),
                    content: "export {}".into(),
                    is_diff: false,
                },
            ],
        };
        assert_eq!(
            build_changes_content(&changes),
            "\n--- DIFF ---\n+const x=2;\n--- END DIFF ---\n\
             \n--- CHANGED FILE: b.ts ---\nexport {}\n--- END CHANGED FILE: b.ts ---\n"
        );
    }
}
