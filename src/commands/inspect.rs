//! Read-only commands: `ls`, `cat`, `tree`, `count`, `check`.

use std::io::Write;

use crate::context::ServiceContext;
use crate::vfs::Node;

use super::emit;

/// Execute the `ls` command.
///
/// Prints one child per line in listing order, directories suffixed with `/`.
///
/// # Errors
///
/// Returns an error string if `path` is not a directory.
pub fn ls(ctx: &ServiceContext, path: &str, out: &mut dyn Write) -> Result<(), String> {
    match ctx.fs.get(path) {
        Some(Node::Directory(_)) => {}
        Some(Node::File(_)) => return Err(format!("{path}: not a directory")),
        None => return Err(format!("{path}: no such file or directory")),
    }

    for child in &ctx.fs.list(path) {
        if child.is_directory() {
            emit(out, format_args!("{}/", child.name()))?;
        } else {
            emit(out, child.name())?;
        }
    }
    Ok(())
}

/// Execute the `cat` command.
///
/// # Errors
///
/// Returns an error string if `path` is missing or a directory.
pub fn cat(ctx: &ServiceContext, path: &str, out: &mut dyn Write) -> Result<(), String> {
    let file = ctx.fs.read(path).ok_or_else(|| format!("{path}: not a file"))?;
    emit(out, file.content)
}

/// Execute the `tree` command.
///
/// # Errors
///
/// Returns an error string if `path` is not a directory.
pub fn tree(ctx: &ServiceContext, path: &str, out: &mut dyn Write) -> Result<(), String> {
    let rendered = ctx.fs.tree(path).ok_or_else(|| format!("{path}: not a directory"))?;
    emit(out, rendered)
}

/// Execute the `count` command.
///
/// # Errors
///
/// Returns an error string only if output fails.
pub fn count(ctx: &ServiceContext, ext: &str, base: Option<&str>, out: &mut dyn Write) -> Result<(), String> {
    emit(out, ctx.fs.count_files_by_ext(ext, base))
}

/// Execute the `check` command.
///
/// # Errors
///
/// Returns the first invariant violation found.
pub fn check(ctx: &ServiceContext, out: &mut dyn Write) -> Result<(), String> {
    let snapshot = ctx.fs.snapshot();
    snapshot.check_invariants().map_err(|e| format!("Snapshot is inconsistent: {e}"))?;
    emit(out, format_args!("ok: {} node(s)", snapshot.len()))
}
