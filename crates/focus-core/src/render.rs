use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::format_age;
use crate::task::Task;

pub const NO_FOCUS_HINT: &str = "Add a task to get started with your focus session";
pub const EMPTY_LIST_HINT: &str = "No tasks yet. Add one to get started!";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            color: cfg.get_switch("color", true)?,
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    #[tracing::instrument(skip_all)]
    pub fn print_focus<W: Write>(&self, out: &mut W, focus: Option<&Task>) -> anyhow::Result<()> {
        match focus {
            Some(task) => {
                writeln!(out, "{}", self.paint("Current Focus", "1;35"))?;
                writeln!(out, "  {}", self.paint(&task.text, "1"))?;
            }
            None => writeln!(out, "{NO_FOCUS_HINT}")?,
        }
        Ok(())
    }

    /// Rows in list order. `*` marks the focus row, `x` a completed one.
    #[tracing::instrument(skip_all, fields(count = tasks.len()))]
    pub fn print_task_list<W: Write>(
        &self,
        out: &mut W,
        tasks: &[Task],
        focus: Option<&Task>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        writeln!(out, "Task List ({})", tasks.len())?;
        if tasks.is_empty() {
            writeln!(out, "{EMPTY_LIST_HINT}")?;
            return Ok(());
        }

        let headers = vec![
            "#".to_string(),
            " ".to_string(),
            "ID".to_string(),
            "Task".to_string(),
            "Added".to_string(),
        ];

        let focus_id = focus.map(|task| task.id.as_str());
        let mut rows = Vec::with_capacity(tasks.len());
        for (idx, task) in tasks.iter().enumerate() {
            let is_focus = focus_id == Some(task.id.as_str());
            let (marker, text) = if task.completed {
                ("x".to_string(), self.paint(&task.text, "9;2"))
            } else if is_focus {
                (self.paint("*", "35"), self.paint(&task.text, "35"))
            } else {
                (String::new(), task.text.clone())
            };

            rows.push(vec![
                self.paint(&(idx + 1).to_string(), "33"),
                marker,
                task.short_id().to_string(),
                text,
                format_age(task.created_at, now),
            ]);
        }

        write_table(out, headers, rows)?;
        Ok(())
    }

    pub fn print_overview<W: Write>(
        &self,
        out: &mut W,
        tasks: &[Task],
        focus: Option<&Task>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.print_focus(out, focus)?;
        writeln!(out)?;
        self.print_task_list(out, tasks, focus, now)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| format!("{:width$}", header, width = widths[idx]))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", header_line.trim_end())?;

    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{rule}")?;

    for row in rows {
        let mut line = String::new();
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            if idx > 0 {
                line.push(' ');
            }
            line.push_str(cell);
            line.push_str(&" ".repeat(padding));
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
