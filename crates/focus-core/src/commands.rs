use std::io::{self, Write};

use anyhow::{Context, anyhow};
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::blob::BlobStore;
use crate::cli::Invocation;
use crate::notify::Notifier;
use crate::render::Renderer;
use crate::session;
use crate::store::TaskStore;
use crate::task::Task;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "done", "delete", "list", "show", "focus", "current", "shell", "export", "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &str, known: &[&'a str]) -> Option<&'a str> {
    if let Some(exact) = known.iter().copied().find(|name| *name == token) {
        return Some(exact);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Resolves a task reference: a 1-based row number in list order, an exact
/// id, or a unique id prefix.
pub fn resolve_task_ref<'a>(tasks: &'a [Task], token: &str) -> Option<&'a Task> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Ok(row) = token.parse::<usize>()
        && row >= 1
        && let Some(task) = tasks.get(row - 1)
    {
        return Some(task);
    }

    if let Some(task) = tasks.iter().find(|task| task.id == token) {
        return Some(task);
    }

    let mut matches = tasks.iter().filter(|task| task.id.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        debug!(token, "ambiguous id prefix");
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, renderer, inv, out), fields(command = %inv.command))]
pub fn dispatch<B, N, W>(
    store: &mut TaskStore<B, N>,
    renderer: &Renderer,
    inv: Invocation,
    out: &mut W,
) -> anyhow::Result<()>
where
    B: BlobStore,
    N: Notifier,
    W: Write,
{
    debug!(args = ?inv.command_args, "dispatching command");

    match inv.command.as_str() {
        "add" => cmd_add(store, renderer, &inv.command_args, out),
        "done" => cmd_done(store, renderer, inv.command_args.first().map(String::as_str), out),
        "delete" => cmd_delete(store, renderer, &inv.command_args, out),
        "list" => {
            let now = Utc::now();
            renderer.print_task_list(out, store.tasks(), store.focus(), now)
        }
        "show" => {
            let now = Utc::now();
            renderer.print_overview(out, store.tasks(), store.focus(), now)
        }
        "focus" | "current" => renderer.print_focus(out, store.focus()),
        "shell" => {
            let stdin = io::stdin();
            session::run_session(store, renderer, stdin.lock(), out)
        }
        "export" => cmd_export(store, out),
        "help" => cmd_help(out),
        "version" => {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip_all)]
fn cmd_add<B, N, W>(
    store: &mut TaskStore<B, N>,
    renderer: &Renderer,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()>
where
    B: BlobStore,
    N: Notifier,
    W: Write,
{
    info!("command add");

    let text = args.join(" ");
    if store.add(&text).is_none() {
        debug!("nothing added");
        return Ok(());
    }

    renderer.print_focus(out, store.focus())
}

#[instrument(skip(store, renderer, out))]
pub fn cmd_done<B, N, W>(
    store: &mut TaskStore<B, N>,
    renderer: &Renderer,
    task_ref: Option<&str>,
    out: &mut W,
) -> anyhow::Result<()>
where
    B: BlobStore,
    N: Notifier,
    W: Write,
{
    info!("command done");

    let target = match task_ref {
        Some(token) => resolve_task_ref(store.tasks(), token),
        None => store.focus(),
    }
    .map(|task| (task.id.clone(), task.completed));

    let Some((id, already_completed)) = target else {
        if task_ref.is_some() {
            writeln!(out, "No matching task.")?;
        } else {
            writeln!(out, "No task in focus.")?;
        }
        return Ok(());
    };

    if already_completed {
        writeln!(out, "Task already completed.")?;
        return Ok(());
    }

    store.complete(&id);
    renderer.print_focus(out, store.focus())
}

#[instrument(skip_all)]
pub fn cmd_delete<B, N, W>(
    store: &mut TaskStore<B, N>,
    renderer: &Renderer,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()>
where
    B: BlobStore,
    N: Notifier,
    W: Write,
{
    info!("command delete");

    let token = args
        .first()
        .ok_or_else(|| anyhow!("delete requires a task reference"))?;

    let Some(task) = resolve_task_ref(store.tasks(), token) else {
        writeln!(out, "No matching task.")?;
        return Ok(());
    };
    let (id, text) = (task.id.clone(), task.text.clone());

    store.delete(&id);
    writeln!(out, "Deleted task: {text}")?;
    renderer.print_focus(out, store.focus())
}

fn cmd_export<B, N, W>(store: &TaskStore<B, N>, out: &mut W) -> anyhow::Result<()>
where
    B: BlobStore,
    N: Notifier,
    W: Write,
{
    let json =
        serde_json::to_string_pretty(store.tasks()).context("failed to serialize task list")?;
    writeln!(out, "{json}")?;
    Ok(())
}

fn cmd_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "usage: focus [options] [command] [args]")?;
    writeln!(out)?;
    writeln!(out, "  add <text...>    add a task; the newest open task takes focus")?;
    writeln!(out, "  done [ref]       complete a task (default: the current focus)")?;
    writeln!(out, "  delete <ref>     delete a task")?;
    writeln!(out, "  list             show the task list")?;
    writeln!(out, "  show             show the current focus and the task list")?;
    writeln!(out, "  focus            show the current focus (alias: current)")?;
    writeln!(out, "  shell            interactive session")?;
    writeln!(out, "  export           print the stored task list as JSON")?;
    writeln!(out, "  version          print the version")?;
    writeln!(out)?;
    writeln!(out, "ref is a row number from `list`, a task id, or a unique id prefix.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{expand_command_abbrev, known_command_names, resolve_task_ref};
    use crate::task::Task;

    fn tasks() -> Vec<Task> {
        let base = Utc
            .with_ymd_and_hms(2026, 10, 19, 9, 0, 0)
            .single()
            .expect("valid time");
        ["abc123", "abd456", "1712345678901"]
            .iter()
            .enumerate()
            .map(|(idx, id)| Task {
                id: id.to_string(),
                text: format!("task {idx}"),
                completed: false,
                created_at: base - Duration::minutes(idx as i64),
            })
            .collect()
    }

    #[test]
    fn expands_unique_prefixes_only() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("a", &known), Some("add"));
        assert_eq!(expand_command_abbrev("do", &known), Some("done"));
        assert_eq!(expand_command_abbrev("de", &known), Some("delete"));
        assert_eq!(expand_command_abbrev("d", &known), None);
        assert_eq!(expand_command_abbrev("s", &known), None);
        assert_eq!(expand_command_abbrev("sh", &known), None);
        assert_eq!(expand_command_abbrev("she", &known), Some("shell"));
        assert_eq!(expand_command_abbrev("f", &known), Some("focus"));
        assert_eq!(expand_command_abbrev("c", &known), Some("current"));
    }

    #[test]
    fn resolves_rows_ids_and_prefixes() {
        let tasks = tasks();
        assert_eq!(resolve_task_ref(&tasks, "2").map(|t| t.id.as_str()), Some("abd456"));
        assert_eq!(resolve_task_ref(&tasks, "abc123").map(|t| t.id.as_str()), Some("abc123"));
        assert_eq!(resolve_task_ref(&tasks, "abd").map(|t| t.id.as_str()), Some("abd456"));
        assert!(resolve_task_ref(&tasks, "ab").is_none());
        assert!(resolve_task_ref(&tasks, "0").is_none());
        assert!(resolve_task_ref(&tasks, "").is_none());
    }

    #[test]
    fn out_of_range_number_falls_back_to_id() {
        let tasks = tasks();
        assert_eq!(
            resolve_task_ref(&tasks, "1712345678901").map(|t| t.id.as_str()),
            Some("1712345678901")
        );
        assert!(resolve_task_ref(&tasks, "9").is_none());
    }
}
