use sdm::platform::acquire_single_instance;
use tempfile::TempDir;

#[test]
fn test_lock_file_records_pid() {
    let dir = TempDir::new().unwrap();
    let guard = acquire_single_instance(dir.path()).unwrap();
    assert!(guard.is_some());

    let contents = std::fs::read_to_string(dir.path().join("sdm.lock")).unwrap();
    assert_eq!(contents.trim(), std::process::id().to_string());
}

#[test]
fn test_separate_data_dirs_do_not_conflict() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();

    let first = acquire_single_instance(a.path()).unwrap();
    let second = acquire_single_instance(b.path()).unwrap();
    assert!(first.is_some());
    assert!(second.is_some());
}
