//! `retrofs recycle` subcommands.

use std::io::Write;

use crate::cli::RecycleAction;
use crate::context::ServiceContext;
use crate::recycle::RecycleEntry;

use super::{emit, resolve};

/// Execute a recycle bin action.
///
/// # Errors
///
/// Returns an error string if the bin rejects the action.
pub fn run(ctx: &ServiceContext, action: &RecycleAction, out: &mut dyn Write) -> Result<(), String> {
    match action {
        RecycleAction::List => list(ctx, out),
        RecycleAction::Delete { path } => {
            let entry = ctx.bin.delete(&resolve(path)).map_err(|e| e.to_string())?;
            emit(out, format_args!("recycled {} as {}", entry.original_path, entry.recycle_path))
        }
        RecycleAction::Restore { recycle_path, force } => {
            let entry = ctx.bin.restore(&resolve(recycle_path), *force).map_err(|e| e.to_string())?;
            emit(out, format_args!("restored {}", entry.original_path))
        }
        RecycleAction::Purge { recycle_path } => {
            let entry = ctx.bin.purge(&resolve(recycle_path)).map_err(|e| e.to_string())?;
            emit(out, format_args!("purged {}", entry.recycle_path))
        }
        RecycleAction::Empty => {
            let purged = ctx.bin.empty().map_err(|e| e.to_string())?;
            emit(out, format_args!("purged {purged} item(s)"))
        }
    }
}

fn list(ctx: &ServiceContext, out: &mut dyn Write) -> Result<(), String> {
    let entries = ctx.bin.entries();
    if entries.is_empty() {
        return emit(out, "Recycle bin is empty.");
    }
    let width = entries.iter().map(|e| e.recycle_path.len()).max().unwrap_or(0);
    for RecycleEntry { recycle_path, original_path, deleted_at, .. } in &entries {
        emit(out, format_args!("{recycle_path:<width$}  {original_path}  {}", deleted_at.format("%Y-%m-%d %H:%M")))?;
    }
    Ok(())
}
