use std::fs;
use std::path::Path;

use tracing::info;

use renamarr_core::{EngineError, RenameOutcome, RenamePlan};

/// Carry out a rename plan.
///
/// Preconditions are checked in order: the source must still exist, a
/// target identical to the source is a successful no-op, and a target
/// occupied by a *different* file is a collision. The move itself is a
/// single `fs::rename` of siblings in one directory, so it either
/// completes or leaves the source untouched.
pub fn execute(plan: &RenamePlan) -> Result<RenameOutcome, EngineError> {
    let source = plan.source_path.as_path();
    let target = plan.target_path.as_path();

    if !source.exists() {
        return Err(EngineError::SourceMissing(source.to_path_buf()));
    }

    if target == source {
        return Ok(RenameOutcome {
            target_path: target.to_path_buf(),
            changed: false,
        });
    }

    // On a case-insensitive filesystem the target can "exist" because it
    // is the source under different casing. That is a legitimate rename,
    // not a collision, so compare canonical paths before refusing.
    if target.exists() && !is_same_file(source, target)? {
        return Err(EngineError::TargetCollision(target.to_path_buf()));
    }

    fs::rename(source, target).map_err(|e| EngineError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;

    info!(from = %source.display(), to = %target.display(), "renamed");

    Ok(RenameOutcome {
        target_path: target.to_path_buf(),
        changed: true,
    })
}

fn is_same_file(a: &Path, b: &Path) -> Result<bool, EngineError> {
    let ca = fs::canonicalize(a).map_err(|e| EngineError::Io {
        path: a.to_path_buf(),
        source: e,
    })?;
    let cb = fs::canonicalize(b).map_err(|e| EngineError::Io {
        path: b.to_path_buf(),
        source: e,
    })?;
    Ok(ca == cb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plan(source: PathBuf, target: PathBuf) -> RenamePlan {
        RenamePlan {
            source_path: source,
            target_path: target,
            preserved_quality_tag: None,
        }
    }

    #[test]
    fn renames_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("old.mkv");
        std::fs::write(&source, b"video").unwrap();
        let target = dir.path().join("new.mkv");

        let outcome = execute(&plan(source.clone(), target.clone())).unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.target_path, target);
        assert!(!source.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"video");
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("gone.mkv");
        let target = dir.path().join("new.mkv");

        let err = execute(&plan(source.clone(), target)).unwrap_err();
        assert!(matches!(err, EngineError::SourceMissing(p) if p == source));
    }

    #[test]
    fn identical_target_is_a_noop_success() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("same.mkv");
        std::fs::write(&source, b"video").unwrap();

        let outcome = execute(&plan(source.clone(), source.clone())).unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.target_path, source);
        assert!(source.exists());
    }

    #[test]
    fn occupied_target_is_a_collision_and_leaves_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mkv");
        let target = dir.path().join("b.mkv");
        std::fs::write(&source, b"aaa").unwrap();
        std::fs::write(&target, b"bbb").unwrap();

        let err = execute(&plan(source.clone(), target.clone())).unwrap_err();
        assert!(matches!(err, EngineError::TargetCollision(p) if p == target));
        assert_eq!(std::fs::read(&source).unwrap(), b"aaa");
        assert_eq!(std::fs::read(&target).unwrap(), b"bbb");
    }
}
