use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

/// Move a file, directory tree or symlink to `to`, which must not exist.
///
/// Tries `rename` first and falls back to copy-then-remove when source and
/// destination sit on different filesystems.
pub fn move_entry(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(err) => Err(err),
    }
}

/// Cross-device move. Trees holding sockets, FIFOs or device nodes are
/// refused before anything is written. A copy that fails midway is removed
/// again, so `to` either holds the whole tree or does not exist.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    ensure_copyable(from)?;
    if let Err(err) = copy_tree(from, to) {
        if fs::symlink_metadata(to).is_ok() {
            let _ = remove_tree(to);
        }
        return Err(err);
    }
    remove_tree(from)
}

fn ensure_copyable(path: &Path) -> io::Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_symlink() || file_type.is_file() {
        return Ok(());
    }
    if !file_type.is_dir() {
        return Err(io::Error::new(
            ErrorKind::Unsupported,
            format!("cannot copy special file {}", path.display()),
        ));
    }
    for entry in fs::read_dir(path)? {
        ensure_copyable(&entry?.path())?;
    }
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(from)?;
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        return copy_symlink(from, to);
    }
    if file_type.is_dir() {
        fs::create_dir(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_tree(&entry.path(), &to.join(entry.file_name()))?;
        }
        fs::set_permissions(to, meta.permissions())?;
        return preserve_mtime(to, &meta);
    }

    fs::copy(from, to)?;
    preserve_mtime(to, &meta)
}

fn preserve_mtime(to: &Path, meta: &fs::Metadata) -> io::Result<()> {
    let modified = meta.modified()?;
    fs::File::open(to)?.set_modified(modified)
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)
}

#[cfg(windows)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    if fs::metadata(from).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(target, to)
    } else {
        std::os::windows::fs::symlink_file(target, to)
    }
}

fn remove_tree(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
