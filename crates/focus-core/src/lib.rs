pub mod blob;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod focus;
pub mod notify;
pub mod render;
pub mod session;
pub mod store;
pub mod task;

use std::ffi::OsString;
use std::io::{
  self,
  Write
};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::blob::FileBlobStore;
use crate::notify::{
  ConsoleNotifier,
  Notifier,
  SilentNotifier
};
use crate::store::TaskStore;

pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let stdout = io::stdout();
  let mut out = stdout.lock();
  run_with_output(raw_args, &mut out)
}

/// Same as `run`, with command output
/// sent to `out`. Notifications still go
/// to stdout.
#[tracing::instrument(skip_all)]
pub fn run_with_output<W: Write>(
  raw_args: Vec<OsString>,
  out: &mut W
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting focus CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.focusrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let blob = FileBlobStore::open(
    &data_dir
  )
  .with_context(|| {
    format!(
      "failed to open blob store at \
       {}",
      data_dir.display()
    )
  })?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let notifier: Box<dyn Notifier> =
    if cfg.get_switch("notify", true)? {
      Box::new(ConsoleNotifier::new(
        renderer.color()
      ))
    } else {
      Box::new(SilentNotifier)
    };

  let mut store = TaskStore::initialize(
    blob,
    notifier,
    cfg.store_key()
  );
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &mut store,
    &renderer,
    inv,
    out
  )?;

  if store.has_unsaved_changes() {
    warn!(
      key = %store.key(),
      "changes were not saved"
    );
    eprintln!(
      "warning: changes could not be \
       saved to {}; they will be lost \
       when this process exits",
      data_dir.display()
    );
  }

  info!("done");
  Ok(())
}
