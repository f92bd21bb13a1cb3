//! Line-driven interactive session.
//!
//! Each line is one action. The action, its write and the re-render all
//! finish before the next line is read. A bare line adds a task; lines
//! starting with `:` are commands.

use std::io::{BufRead, Write};

use anyhow::Context;
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::blob::BlobStore;
use crate::commands::{cmd_delete, cmd_done};
use crate::notify::Notifier;
use crate::render::Renderer;
use crate::store::TaskStore;

const PROMPT: &str = "focus> ";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    Add(&'a str),
    Done(Option<&'a str>),
    Delete(&'a str),
    MissingRef(&'a str),
    List,
    Help,
    Quit,
    Unknown(&'a str),
    Blank,
}

fn parse_line(raw: &str) -> Line<'_> {
    let line = raw.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Line::Blank;
    }

    let Some(command) = line.trim_start().strip_prefix(':') else {
        return Line::Add(line);
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let arg = if rest.is_empty() { None } else { Some(rest) };

    match (name, arg) {
        ("done" | "d", arg) => Line::Done(arg),
        ("delete" | "rm", Some(arg)) => Line::Delete(arg),
        ("delete" | "rm", None) => Line::MissingRef(name),
        ("list" | "ls", _) => Line::List,
        ("help" | "h", _) => Line::Help,
        ("quit" | "q" | "exit", _) => Line::Quit,
        _ => Line::Unknown(name),
    }
}

/// Runs until `:quit` or end of input.
#[instrument(skip_all)]
pub fn run_session<B, N, R, W>(
    store: &mut TaskStore<B, N>,
    renderer: &Renderer,
    mut input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    B: BlobStore,
    N: Notifier,
    R: BufRead,
    W: Write,
{
    info!(tasks = store.len(), "starting interactive session");
    renderer.print_overview(out, store.tasks(), store.focus(), Utc::now())?;

    let mut buf = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        buf.clear();
        let read = input
            .read_line(&mut buf)
            .context("failed to read session input")?;
        if read == 0 {
            writeln!(out)?;
            break;
        }

        let line = parse_line(&buf);
        debug!(?line, "session line");
        match line {
            Line::Blank => {}
            Line::Add(text) => {
                if store.add(text).is_some() {
                    renderer.print_focus(out, store.focus())?;
                }
            }
            Line::Done(task_ref) => cmd_done(store, renderer, task_ref, out)?,
            Line::Delete(task_ref) => cmd_delete(store, renderer, &[task_ref.to_string()], out)?,
            Line::List => {
                renderer.print_task_list(out, store.tasks(), store.focus(), Utc::now())?
            }
            Line::MissingRef(name) => writeln!(out, "Usage: :{name} <ref>")?,
            Line::Help => print_session_help(out)?,
            Line::Quit => break,
            Line::Unknown(name) => writeln!(out, "Unknown command :{name}. Try :help.")?,
        }
    }

    info!(tasks = store.len(), "session ended");
    Ok(())
}

fn print_session_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "  <text>         add a task")?;
    writeln!(out, "  :done [ref]    complete a task (default: the current focus)")?;
    writeln!(out, "  :delete <ref>  delete a task")?;
    writeln!(out, "  :list          show the task list")?;
    writeln!(out, "  :quit          leave the session")?;
    Ok(())
}
