use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the application home directory.
///
/// - `None` (or empty) → `<user home>/<default_subdir>`
/// - a leading `~` expands to the user home
/// - relative paths are made absolute against the current directory
///
/// When `create` is set, the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let raw = configured
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let path = match raw {
        None => user_home()?.join(default_subdir),
        Some(s) => expand_tilde(&s)?,
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("cannot read current directory")?
            .join(path)
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }
    Ok(path)
}

/// Join `file` onto `base` unless it is already absolute.
pub fn resolve_under(base: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base.join(file)
    }
}

fn expand_tilde(s: &str) -> Result<PathBuf> {
    if s == "~" {
        return user_home();
    }
    match s.strip_prefix("~/").or_else(|| s.strip_prefix("~\\")) {
        Some(rest) => Ok(user_home()?.join(rest)),
        None if s.starts_with('~') => bail!("'~user' paths are not supported: {s}"),
        None => Ok(PathBuf::from(s)),
    }
}

fn user_home() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = dirs::config_dir();
    #[cfg(not(target_os = "windows"))]
    let home = dirs::home_dir();
    home.context("cannot determine the user home directory")
}
