mod common;

use common::{put, test_context};
use sandbox_fs_tools::Error;
use sandbox_fs_tools::ops::{
    DeleteDirectoryRequest, DeleteFileRequest, DeleteKind, delete_directory_recursive,
    delete_file,
};

#[test]
fn delete_file_removes_files_and_empty_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = put(dir.path(), "a.txt", "a");
    let empty = dir.path().join("empty");
    std::fs::create_dir_all(&empty).expect("mkdir");

    let ctx = test_context(dir.path());
    let resp = delete_file(&ctx, DeleteFileRequest { path: file.clone() }).expect("delete file");
    assert_eq!(resp.kind, DeleteKind::File);
    assert!(!file.exists());

    let resp = delete_file(&ctx, DeleteFileRequest { path: empty.clone() }).expect("delete dir");
    assert_eq!(resp.kind, DeleteKind::Directory);
    assert!(!empty.exists());
}

#[test]
fn delete_file_refuses_non_empty_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    put(dir.path(), "full/keep.txt", "k");

    let ctx = test_context(dir.path());
    let err = delete_file(
        &ctx,
        DeleteFileRequest {
            path: dir.path().join("full"),
        },
    )
    .expect_err("not empty");
    match err {
        Error::DirectoryNotEmpty(path) => assert_eq!(path, dir.path().join("full")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(dir.path().join("full/keep.txt").exists());
}

#[test]
fn delete_file_reports_missing_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = test_context(dir.path());
    let err = delete_file(
        &ctx,
        DeleteFileRequest {
            path: dir.path().join("ghost"),
        },
    )
    .expect_err("missing");
    assert_eq!(err.code(), "not_found");
}

#[cfg(unix)]
#[test]
fn delete_file_unlinks_symlinks_without_touching_targets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = put(dir.path(), "data/real.txt", "real");
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(dir.path().join("data"), &link).expect("symlink");

    let ctx = test_context(dir.path());
    let resp = delete_file(&ctx, DeleteFileRequest { path: link.clone() }).expect("unlink");
    assert_eq!(resp.kind, DeleteKind::Symlink);
    assert!(std::fs::symlink_metadata(&link).is_err());
    assert!(target.exists());
}

#[test]
fn delete_directory_recursive_without_confirm_is_a_dry_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    put(dir.path(), "tree/a.txt", "a");
    put(dir.path(), "tree/sub/b.txt", "b");

    let ctx = test_context(dir.path());
    let resp = delete_directory_recursive(
        &ctx,
        DeleteDirectoryRequest {
            path: dir.path().join("tree"),
            confirm: false,
        },
    )
    .expect("dry run");

    assert!(resp.dry_run);
    assert!(!resp.deleted);
    assert_eq!(resp.entries_removed, 0);
    assert!(dir.path().join("tree/sub/b.txt").exists());
}

#[test]
fn delete_directory_recursive_removes_the_whole_tree() {
    let dir = tempfile::tempdir().expect("tempdir");
    put(dir.path(), "tree/a.txt", "a");
    put(dir.path(), "tree/sub/b.txt", "b");
    put(dir.path(), "keep.txt", "k");

    let ctx = test_context(dir.path());
    let resp = delete_directory_recursive(
        &ctx,
        DeleteDirectoryRequest {
            path: dir.path().join("tree"),
            confirm: true,
        },
    )
    .expect("delete tree");

    assert!(resp.deleted);
    assert!(!resp.dry_run);
    // tree, tree/a.txt, tree/sub, tree/sub/b.txt
    assert_eq!(resp.entries_removed, 4);
    assert!(!dir.path().join("tree").exists());
    assert!(dir.path().join("keep.txt").exists());
}

#[test]
fn delete_directory_recursive_refuses_allowed_roots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let empty_root = dir.path().join("empty_root");
    let full_root = dir.path().join("full_root");
    std::fs::create_dir_all(&empty_root).expect("mkdir");
    put(&full_root, "a.txt", "a");

    let ctx = common::test_context_with_roots(&[empty_root.as_path(), full_root.as_path()]);
    for root in [&empty_root, &full_root] {
        for confirm in [false, true] {
            let err = delete_directory_recursive(
                &ctx,
                DeleteDirectoryRequest {
                    path: root.clone(),
                    confirm,
                },
            )
            .expect_err("root must be refused");
            match err {
                Error::PermissionDenied(path) => assert_eq!(&path, root),
                other => panic!("unexpected error: {other:?}"),
            }
        }
        assert!(root.is_dir());
    }
    assert!(full_root.join("a.txt").exists());
}

#[test]
fn delete_directory_recursive_requires_a_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = put(dir.path(), "a.txt", "a");

    let ctx = test_context(dir.path());
    let err = delete_directory_recursive(
        &ctx,
        DeleteDirectoryRequest {
            path: file.clone(),
            confirm: true,
        },
    )
    .expect_err("file");
    assert_eq!(err.code(), "not_a_directory");
    assert!(file.exists());

    let err = delete_directory_recursive(
        &ctx,
        DeleteDirectoryRequest {
            path: dir.path().join("missing"),
            confirm: true,
        },
    )
    .expect_err("missing");
    assert_eq!(err.code(), "not_found");
}

#[cfg(unix)]
#[test]
fn delete_directory_recursive_does_not_follow_inner_symlinks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let kept = put(dir.path(), "elsewhere/kept.txt", "kept");
    put(dir.path(), "tree/a.txt", "a");
    std::os::unix::fs::symlink(dir.path().join("elsewhere"), dir.path().join("tree/link"))
        .expect("symlink");

    let ctx = test_context(dir.path());
    delete_directory_recursive(
        &ctx,
        DeleteDirectoryRequest {
            path: dir.path().join("tree"),
            confirm: true,
        },
    )
    .expect("delete tree");

    assert!(!dir.path().join("tree").exists());
    assert!(kept.exists());
}
