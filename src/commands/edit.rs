//! Mutating commands: `write`, `mkdir`, `touch`, `rm`, `mv`, `ensure`.

use std::io::Write;

use crate::context::ServiceContext;

use super::emit;

/// Execute the `write` command.
///
/// With `create`, missing parent directories and the file itself are
/// created first.
///
/// # Errors
///
/// Returns an error string if the file cannot be created or is not a file.
pub fn write(ctx: &ServiceContext, path: &str, content: &str, create: bool) -> Result<(), String> {
    if create && !ctx.fs.exists(path) {
        ctx.fs.ensure_path(path).map_err(|e| e.to_string())?;
        ctx.fs.touch(path).map_err(|e| e.to_string())?;
    }
    ctx.fs.write(path, content).map_err(|e| e.to_string())
}

/// Execute the `mkdir` command.
///
/// # Errors
///
/// Returns an error string if the directory cannot be created, or if it
/// already exists and `parents` is not set.
pub fn mkdir(ctx: &ServiceContext, path: &str, parents: bool) -> Result<(), String> {
    if parents {
        ctx.fs.ensure_path(path).map_err(|e| e.to_string())?;
    }
    let created = ctx.fs.mkdir(path).map_err(|e| e.to_string())?;
    if !created && !parents {
        return Err(format!("{path}: already exists"));
    }
    Ok(())
}

/// Execute the `touch` command. Existing paths are left alone.
///
/// # Errors
///
/// Returns an error string if the parent is not a directory.
pub fn touch(ctx: &ServiceContext, path: &str) -> Result<(), String> {
    ctx.fs.touch(path).map(|_| ()).map_err(|e| e.to_string())
}

/// Execute the `rm` command.
///
/// # Errors
///
/// Returns an error string if nothing exists at `path` or it is the root.
pub fn rm(ctx: &ServiceContext, path: &str) -> Result<(), String> {
    match ctx.fs.remove(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(format!("{path}: no such file or directory")),
        Err(e) => Err(e.to_string()),
    }
}

/// Execute the `mv` command.
///
/// # Errors
///
/// Returns an error string if the move is rejected.
pub fn mv(ctx: &ServiceContext, from: &str, to: &str) -> Result<(), String> {
    ctx.fs.move_node(from, to).map_err(|e| e.to_string())
}

/// Execute the `ensure` command, printing each directory it created.
///
/// # Errors
///
/// Returns an error string if an ancestor is a file or too deep.
pub fn ensure(ctx: &ServiceContext, path: &str, out: &mut dyn Write) -> Result<(), String> {
    let created = ctx.fs.ensure_path(path).map_err(|e| e.to_string())?;
    for dir in created {
        emit(out, format_args!("created {dir}"))?;
    }
    Ok(())
}
