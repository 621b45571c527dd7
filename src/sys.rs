//! System utilities for account lookup and filesystem permission checks.

use std::path::Path;

/// Looks up the login name of the current user from the passwd database.
///
/// Used when `USER` is not set (batch jobs and some container runtimes
/// start processes with a minimal environment).
///
/// # Examples
///
/// ```no_run
/// use camcase::sys::passwd_user_name;
///
/// if let Some(name) = passwd_user_name() {
///     println!("running as {}", name);
/// }
/// ```
#[cfg(unix)]
pub fn passwd_user_name() -> Option<String> {
    use nix::unistd::{User, getuid};

    User::from_uid(getuid()).ok().flatten().map(|u| u.name)
}

#[cfg(not(unix))]
pub fn passwd_user_name() -> Option<String> {
    None
}

/// Returns true if `path` is an existing directory the current user can write to.
#[cfg(unix)]
pub fn is_writable_dir(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};

    path.is_dir() && access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
pub fn is_writable_dir(path: &Path) -> bool {
    path.is_dir()
        && std::fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
}

/// Returns true if `path` is a regular file the current user can execute.
#[cfg(unix)]
pub fn is_executable_file(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};

    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
pub fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}
