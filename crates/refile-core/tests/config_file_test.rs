//! Loading `ReorgConfig` from files on disk

use refile_core::{BackupError, ReorgConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_yaml_config_with_custom_layout() {
    let temp = TempDir::new().unwrap();
    let vault = temp.path().join("vault");
    let path = temp.path().join("refile.yaml");
    fs::write(
        &path,
        format!(
            "vault_root: {}\nbackup_root: {}\nexclude: [\".git\", \"*.bak\"]\nnote_extensions: [md, markdown]\nkeep_backup_on_success: true\ncategories:\n  Reference: Library/Reference\n  inbox: Inbox\n",
            vault.display(),
            temp.path().join("backups").display()
        ),
    )
    .unwrap();

    let config = ReorgConfig::from_file(&path).unwrap();
    assert_eq!(config.directory_for("REFERENCE"), Some("Library/Reference"));
    assert_eq!(config.directory_for("permanent"), None);
    assert_eq!(config.exclude, vec![".git".to_string(), "*.bak".to_string()]);
    assert!(config.keep_backup_on_success);
    assert!(config.is_note(std::path::Path::new("a.markdown")));
}

#[test]
fn test_file_with_nested_backup_root_is_rejected() {
    let temp = TempDir::new().unwrap();
    let vault = temp.path().join("vault");
    let path = temp.path().join("refile.toml");
    fs::write(
        &path,
        format!(
            "vault_root = \"{}\"\nbackup_root = \"{}\"\n",
            vault.display(),
            vault.join(".refile-backups").display()
        ),
    )
    .unwrap();

    assert!(matches!(
        ReorgConfig::from_file(&path),
        Err(BackupError::NestedBackupRoot { .. })
    ));
}

#[test]
fn test_missing_file_is_config_error() {
    let temp = TempDir::new().unwrap();
    let result = ReorgConfig::from_file(&temp.path().join("absent.toml"));
    assert!(matches!(result, Err(BackupError::Config { .. })));
}

#[test]
fn test_escaping_category_directory_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("refile.toml");
    fs::write(
        &path,
        format!(
            "vault_root = \"{}\"\nbackup_root = \"{}\"\n[categories]\nsecret = \"../outside\"\n",
            temp.path().join("vault").display(),
            temp.path().join("backups").display()
        ),
    )
    .unwrap();

    let err = ReorgConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("must be vault-relative"));
}
