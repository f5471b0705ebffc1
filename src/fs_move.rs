use std::fs;
use std::io;
use std::path::Path;

/// Moves `source` to `destination`, refusing to replace an existing file.
///
/// A hard link is used first so an existing destination is detected by the
/// filesystem itself; volumes without hard links fall back to a checked
/// `rename`.
pub fn move_without_replace(source: &Path, destination: &Path) -> Result<(), String> {
    if source == destination {
        return Ok(());
    }
    if fs::symlink_metadata(source).is_err() {
        return Err("移動元ファイルが見つかりません".to_string());
    }

    match fs::hard_link(source, destination) {
        Ok(()) => fs::remove_file(source).map_err(|remove_error| {
            let _ = fs::remove_file(destination);
            format!("移動元ファイルの削除に失敗しました: {}", remove_error)
        }),
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            Err("出力先に同名のファイルが既に存在します".to_string())
        }
        Err(link_error) => {
            if fs::symlink_metadata(destination).is_ok() {
                return Err("出力先に同名のファイルが既に存在します".to_string());
            }
            fs::rename(source, destination).map_err(|rename_error| {
                format!(
                    "リネームに失敗しました: {} (ハードリンク: {})",
                    rename_error, link_error
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_into_free_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("IMG_01.jpg");
        let destination = dir.path().join("20220301-IMG_01.jpg");
        fs::write(&source, b"one").expect("write");

        move_without_replace(&source, &destination).expect("moved");

        assert!(!source.exists());
        assert_eq!(fs::read(&destination).expect("read"), b"one");
    }

    #[test]
    fn never_replaces_existing_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("a.jpg");
        let destination = dir.path().join("b.jpg");
        fs::write(&source, b"a").expect("write");
        fs::write(&destination, b"b").expect("write");

        assert!(move_without_replace(&source, &destination).is_err());
        assert_eq!(fs::read(&source).expect("read"), b"a");
        assert_eq!(fs::read(&destination).expect("read"), b"b");
    }

    #[test]
    fn vanished_source_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = move_without_replace(&dir.path().join("gone"), &dir.path().join("x"));
        assert!(result.is_err());
    }
}
