//! Backup session lifecycle over a realistic vault layout

use refile_core::prelude::*;
use refile_vault::{BackupManager, MediaLinkRewriter, RelativeMediaRewriter, TreeDigest, VaultWalker};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup() -> (TempDir, ReorgConfig, Arc<RecordingObserver>) {
    let temp = TempDir::new().unwrap();
    let vault = temp.path().join("garden");
    write(&vault, "Inbox/a.md", "![p](../assets/pic.png)");
    write(&vault, "assets/pic.png", "png");
    write(&vault, ".git/HEAD", "ref: refs/heads/main");
    write(&vault, "scratch.tmp", "tmp");
    let config = ReorgConfig::builder(&vault, temp.path().join("snapshots"))
        .exclude("*.tmp")
        .build()
        .unwrap();
    (temp, config, Arc::new(RecordingObserver::new()))
}

#[test]
fn test_glob_excludes_stay_out_of_sessions() {
    let (_temp, config, observer) = setup();
    let backups = BackupManager::new(&config, observer).unwrap();
    let id = backups.create_backup().unwrap();

    assert!(id.as_str().starts_with("garden-"));
    let session = backups.session_path(&id);
    assert!(session.join("Inbox/a.md").is_file());
    assert!(!session.join(".git").exists());
    assert!(!session.join("scratch.tmp").exists());

    let listed = backups.list_backups().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_count, 2);
    assert_eq!(listed[0].path, session);
}

#[test]
fn test_rollback_after_simulated_move() {
    let (_temp, config, observer) = setup();
    let backups = BackupManager::new(&config, observer.clone()).unwrap();
    let walker = VaultWalker::new(&config);
    let before = TreeDigest::compute(&walker).unwrap();
    let id = backups.create_backup().unwrap();

    // Move the note and rewrite its media link the way an execution would
    let root = &config.vault_root;
    let content = fs::read_to_string(root.join("Inbox/a.md")).unwrap();
    let rewriter = RelativeMediaRewriter::new(root, config.note_extensions.clone());
    let rewritten = rewriter
        .rewrite(&content, Path::new("Inbox/a.md"), Path::new("Permanent/Deep/a.md"))
        .unwrap();
    assert_eq!(rewritten.content, "![p](../../assets/pic.png)");
    write(root, "Permanent/Deep/a.md", &rewritten.content);
    fs::remove_file(root.join("Inbox/a.md")).unwrap();
    assert_ne!(TreeDigest::compute(&walker).unwrap(), before);

    let report = backups.rollback(&id).unwrap();
    assert!(report.verified);
    assert_eq!(report.restored_files, 2);
    assert!(report.emergency_backup.is_some());
    assert_eq!(TreeDigest::compute(&walker).unwrap(), before);
    assert!(!root.join("Permanent").exists());
    // Excluded entries are never touched by a restore
    assert!(root.join(".git/HEAD").is_file());
    assert!(root.join("scratch.tmp").is_file());
    assert!(observer.contains("Emergency backup"));
}

#[test]
fn test_delete_and_prune_order() {
    let (_temp, config, observer) = setup();
    let backups = BackupManager::new(&config, observer).unwrap();
    let ids: Vec<_> = (0..3).map(|_| backups.create_backup().unwrap()).collect();

    let listed: Vec<_> = backups
        .list_backups()
        .unwrap()
        .into_iter()
        .map(|info| info.id)
        .collect();
    let mut newest_first = ids.clone();
    newest_first.reverse();
    assert_eq!(listed, newest_first);

    backups.delete_backup(&ids[0]).unwrap();
    assert!(matches!(
        backups.delete_backup(&ids[0]),
        Err(BackupError::SessionNotFound { .. })
    ));

    let report = backups.prune(1, false).unwrap();
    assert_eq!(report.kept, vec![ids[2].clone()]);
    assert_eq!(report.deleted, vec![ids[1].clone()]);
}
