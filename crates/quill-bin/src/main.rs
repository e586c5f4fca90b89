//! quill batch driver.
//!
//! Opens one file, runs a list of actions (and optionally a saved macro)
//! through the editing engine the way key presses would, reports status
//! messages on stderr and writes the buffer back.
use anyhow::{Context, Result, bail};
use clap::Parser;
use core_actions::probes::{LINT_SOURCE, drain_probes, pump_probes};
use core_actions::{ActionId, EditorContext, ScriptedPrompter, insert_char, perform_action, perform_named};
use core_state::{StatusKind, View, ViewId};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "quill.log";
/// How long to wait for background lint / highlight work before exiting.
const PROBE_DRAIN_LIMIT: Duration = Duration::from_secs(10);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "quill", version, about = "Quill editing engine batch driver")]
struct Args {
    /// File to open. Without one an empty scratch buffer is used.
    pub path: Option<PathBuf>,
    /// Configuration file (overrides discovery of `quill.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Actions to run in order, comma separated. `type:<text>` types text.
    #[arg(long = "actions", value_delimiter = ',')]
    pub actions: Vec<String>,
    /// JSON macro to play after the actions.
    #[arg(long = "macro")]
    pub play_macro: Option<PathBuf>,
    /// Record the actions into this JSON macro file.
    #[arg(long = "record")]
    pub record: Option<PathBuf>,
    /// Answers for prompts (file names, yes/no), consumed in order.
    #[arg(long = "answer")]
    pub answers: Vec<String>,
    /// Save the buffer when done.
    #[arg(long)]
    pub write: bool,
    /// Print the final buffer to stdout.
    #[arg(long)]
    pub print: bool,
}

/// One step of an `--actions` list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Action(String),
    Type(String),
}

impl Step {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.strip_prefix("type:") {
            Some(text) => Step::Type(text.to_string()),
            None => Step::Action(raw.to_string()),
        })
    }
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // a global subscriber is already installed; the guard is dropped
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

struct Session {
    ctx: EditorContext,
    view: View,
    errors: usize,
}

impl Session {
    fn open(args: &Args) -> Result<Self> {
        let config = core_config::load_from(args.config.clone()).context("loading configuration")?;
        let mut ctx = EditorContext::new(&config)
            .with_prompter(ScriptedPrompter::new(args.answers.clone()))
            .with_probes(Handle::current());
        let view = ctx
            .open_view(ViewId(0), args.path.as_deref())
            .with_context(|| format!("opening {}", args.path.as_deref().unwrap_or(Path::new("scratch buffer")).display()))?;
        info!(
            target: "runtime.startup",
            buffer = view.buffer.name(),
            lines = view.buffer.line_count(),
            config = ?config.source,
            "session_open"
        );
        Ok(Self { ctx, view, errors: 0 })
    }

    fn report_status(&mut self) {
        if let Some(status) = self.view.take_status() {
            match status.kind {
                StatusKind::Info => eprintln!("{}", status.text),
                StatusKind::Error => {
                    self.errors += 1;
                    eprintln!("error: {}", status.text);
                }
            }
        }
    }

    fn run_step(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Type(text) => {
                for ch in text.chars() {
                    insert_char(&mut self.ctx, &mut self.view, ch);
                }
            }
            Step::Action(name) => {
                let outcome = perform_named(&mut self.ctx, &mut self.view, name);
                self.report_status();
                let outcome = outcome.with_context(|| format!("running {name}"))?;
                tracing::debug!(target: "runtime", action = %name, ?outcome, "step_done");
            }
        }
        pump_probes(&mut self.ctx, &mut self.view);
        self.report_status();
        Ok(())
    }

    async fn run(&mut self, args: &Args) -> Result<()> {
        let steps: Vec<Step> = args.actions.iter().filter_map(|a| Step::parse(a)).collect();

        if args.record.is_some() {
            perform_action(&mut self.ctx, &mut self.view, ActionId::ToggleMacro, true);
            self.report_status();
        }
        for step in &steps {
            self.run_step(step)?;
        }
        if let Some(path) = &args.record {
            perform_action(&mut self.ctx, &mut self.view, ActionId::ToggleMacro, true);
            self.report_status();
            let json = self.ctx.macros.to_json().context("encoding macro")?;
            std::fs::write(path, json).with_context(|| format!("writing macro {}", path.display()))?;
            info!(target: "runtime", file = %path.display(), entries = self.ctx.macros.entries().len(), "macro_saved");
        }

        if let Some(path) = &args.play_macro {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading macro {}", path.display()))?;
            let count = self.ctx.macros.load_json(&json).with_context(|| format!("parsing macro {}", path.display()))?;
            info!(target: "runtime", file = %path.display(), entries = count, "macro_loaded");
            perform_action(&mut self.ctx, &mut self.view, ActionId::PlayMacro, true);
            self.report_status();
        }

        drain_probes(&mut self.ctx, &mut self.view, PROBE_DRAIN_LIMIT).await;
        self.report_status();
        for msg in self.view.gutter.for_source(LINT_SOURCE) {
            eprintln!("{}:{}: {}", self.view.buffer.name(), msg.line + 1, msg.text);
        }

        if args.write {
            let outcome = perform_action(&mut self.ctx, &mut self.view, ActionId::Save, true);
            self.report_status();
            if !outcome.is_completed() || self.view.buffer.is_modified() {
                bail!("{} was not saved", self.view.buffer.name());
            }
        }
        if args.print {
            print!("{}", self.view.buffer.serialize());
        }
        self.ctx.shutdown();

        if self.errors > 0 {
            warn!(target: "runtime", errors = self.errors, "session_finished_with_errors");
        }
        info!(target: "runtime", modified = self.view.buffer.is_modified(), "shutdown");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let mut session = Session::open(&args)?;
    session.run(&args).await
}
