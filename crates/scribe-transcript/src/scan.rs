use std::path::{Path, PathBuf};

/// List every `*.jsonl` transcript directly inside the per-project
/// subdirectories of `root` (`root/<project>/<session>.jsonl`).
///
/// A missing or unreadable root yields an empty list. Unreadable project
/// directories are skipped one by one. The result is sorted so downstream
/// tie-breaks are stable across runs.
pub fn discover_transcripts(root: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(root) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "transcript root not readable");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let project_dir = entry.path();
        if !project_dir.is_dir() {
            continue;
        }
        let inner = match std::fs::read_dir(&project_dir) {
            Ok(i) => i,
            Err(e) => {
                tracing::debug!(dir = %project_dir.display(), error = %e, "skipping project dir");
                continue;
            }
        };
        for file in inner.flatten() {
            let path = file.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_root_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover_transcripts(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn finds_jsonl_one_level_below_projects() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("-home-dev-repo");
        let b = tmp.path().join("-home-dev-other");
        fs::create_dir_all(a.join("nested")).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("s1.jsonl"), "").unwrap();
        fs::write(a.join("notes.txt"), "").unwrap();
        fs::write(a.join("nested").join("deep.jsonl"), "").unwrap();
        fs::write(b.join("s2.jsonl"), "").unwrap();
        fs::write(tmp.path().join("top.jsonl"), "").unwrap();

        let found = discover_transcripts(tmp.path());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(found.len(), 2);
        assert!(names.contains(&"s1.jsonl".to_string()));
        assert!(names.contains(&"s2.jsonl".to_string()));
    }

    #[test]
    fn output_is_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("proj");
        fs::create_dir_all(&p).unwrap();
        for name in ["c.jsonl", "a.jsonl", "b.jsonl"] {
            fs::write(p.join(name), "").unwrap();
        }
        let found = discover_transcripts(tmp.path());
        let mut sorted = found.clone();
        sorted.sort();
        assert_eq!(found, sorted);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_project_dir_does_not_hide_others() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let locked = tmp.path().join("locked");
        let open = tmp.path().join("open");
        fs::create_dir_all(&locked).unwrap();
        fs::create_dir_all(&open).unwrap();
        fs::write(locked.join("x.jsonl"), "").unwrap();
        fs::write(open.join("y.jsonl"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let found = discover_transcripts(tmp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // root ignores mode bits, so the locked file may still show up
        assert!(found.contains(&open.join("y.jsonl")));
        assert!(found.len() <= 2);
    }
}
