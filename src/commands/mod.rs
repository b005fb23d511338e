//! Command dispatch and handlers.

pub mod edit;
pub mod inspect;
pub mod recycle;

use std::io::Write;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::vfs::path::{self, ROOT};

/// Dispatch a parsed command to its handler.
///
/// Builds the service context from the environment and CLI overrides,
/// hydrates it unless `--offline` is set, runs the command, and saves any
/// changes before returning.
///
/// # Errors
///
/// Returns an error string if configuration is invalid, the command fails,
/// or the changes cannot be saved.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let mut config = Config::from_env()?;
    if let Some(remote) = &cli.remote {
        config.remote_url = Some(remote.trim_end_matches('/').to_string());
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    runtime.block_on(async {
        let ctx = if cli.ephemeral { ServiceContext::ephemeral(&config) } else { ServiceContext::live(&config) };
        if !cli.offline && !cli.ephemeral {
            ctx.hydrate().await;
        }

        let result = dispatch_with_context(&cli.command, &ctx, &mut std::io::stdout().lock());

        // Save whatever succeeded, even if the command itself failed.
        ctx.flush().await?;
        result
    })
}

/// Dispatch a command with the given service context, writing to `out`.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch_with_context(command: &Command, ctx: &ServiceContext, out: &mut dyn Write) -> Result<(), String> {
    match command {
        Command::Ls { path } => inspect::ls(ctx, &resolve(path), out),
        Command::Cat { path } => inspect::cat(ctx, &resolve(path), out),
        Command::Tree { path } => inspect::tree(ctx, &resolve(path), out),
        Command::Count { ext, base } => inspect::count(ctx, ext, base.as_deref().map(resolve).as_deref(), out),
        Command::Check => inspect::check(ctx, out),
        Command::Write { path, content, create } => edit::write(ctx, &resolve(path), content, *create),
        Command::Mkdir { path, parents } => edit::mkdir(ctx, &resolve(path), *parents),
        Command::Touch { path } => edit::touch(ctx, &resolve(path)),
        Command::Rm { path } => edit::rm(ctx, &resolve(path)),
        Command::Mv { from, to } => edit::mv(ctx, &resolve(from), &resolve(to)),
        Command::Ensure { path } => edit::ensure(ctx, &resolve(path), out),
        Command::Recycle { action } => recycle::run(ctx, action, out),
    }
}

fn resolve(input: &str) -> String {
    path::resolve(ROOT, input)
}

/// Writes one line, mapping I/O failures to the command error type.
pub(crate) fn emit(out: &mut dyn Write, line: impl std::fmt::Display) -> Result<(), String> {
    writeln!(out, "{line}").map_err(|e| format!("Failed to write output: {e}"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Config;
    use crate::context::ServiceContext;

    /// Runs a command against an ephemeral context and captures stdout.
    pub fn run(ctx: &ServiceContext, args: &[&str]) -> Result<String, String> {
        use clap::Parser;
        let argv = std::iter::once("retrofs").chain(args.iter().copied());
        let cli = crate::cli::Cli::try_parse_from(argv).map_err(|e| e.to_string())?;
        let mut out = Vec::new();
        super::dispatch_with_context(&cli.command, ctx, &mut out)?;
        Ok(String::from_utf8(out).expect("command output is UTF-8"))
    }

    pub fn context() -> ServiceContext {
        ServiceContext::ephemeral(&Config::default())
    }
}
