use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;

use codepad::cli::{Cli, Command};
use codepad::config::Config;
use codepad::execution::{self, RemoteExecutor};
use codepad::logging;
use codepad::notebook::Notebook;
use codepad::output::{ArtifactView, OutputState};
use codepad::printer::{JsonPrinter, TextPrinter};
use codepad::store::{FileStore, KvStore, ScreenStore};
use codepad::tui::{self, App};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    // Load config, CLI flags win over rc file and environment
    let mut cfg = Config::load();
    if let Some(url) = &args.base_url {
        cfg.set("API_BASE_URL", url.clone());
    }

    let _log_guard = match logging::init(&cfg.log_path()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {:#}", e);
            None
        }
    };

    let notebook = match &args.notebook {
        Some(path) => Notebook::load(path)?,
        None => Notebook::default(),
    };
    let store = FileStore::from_config(&cfg)?;

    match args.command.unwrap_or(Command::Edit) {
        Command::Edit => {
            let store: Box<dyn KvStore> = Box::new(store);
            let app = App::new(
                ScreenStore::new(store, args.screen),
                notebook,
                &cfg.default_code(),
                cfg.output_height(),
                std::env::current_dir()?,
            );
            let executor = RemoteExecutor::from_config(&cfg)?;
            tui::run_tui(app, executor).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { file, show, save_images, json } => {
            let screen = ScreenStore::new(store, args.screen);
            let code = read_code(file.as_deref(), &screen, &cfg.default_code())?;
            let executor = RemoteExecutor::from_config(&cfg)?;
            let ok = run_once(&screen, &notebook, &executor, &code, &show, save_images, json).await?;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::State { clear } => {
            let root = store.root().to_path_buf();
            let screen = ScreenStore::new(store, args.screen);
            if clear {
                screen.clear()?;
                println!("Cleared saved state for screen {}", screen.screen());
            } else {
                let snapshot = screen.snapshot();
                println!("Screen {} ({})", screen.screen(), root.display());
                println!("--- code ---");
                println!("{}", snapshot.code.unwrap_or_default());
                println!("--- output ---");
                println!("{}", snapshot.output.unwrap_or_default());
                println!("--- selected ---");
                println!("{}", snapshot.selected.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Source for a headless run: the file, piped stdin, or the saved source.
fn read_code(file: Option<&Path>, screen: &ScreenStore<FileStore>, default_code: &str) -> Result<String> {
    if let Some(path) = file {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        if !buf.trim().is_empty() {
            return Ok(buf);
        }
    }
    Ok(screen.load_code(default_code))
}

/// Run once, persist the output like the editor does, and print. Returns whether the run succeeded.
async fn run_once(
    screen: &ScreenStore<FileStore>,
    notebook: &Notebook,
    executor: &RemoteExecutor,
    code: &str,
    show: &[String],
    save_images: Option<PathBuf>,
    json: bool,
) -> Result<bool> {
    let session_id = notebook.session_id();
    let mut state = OutputState::new();

    let result = match execution::invoke(executor, code, session_id.as_deref()).await {
        Ok(result) => result,
        Err(e) => {
            state.fail(e.user_message());
            screen.save_output(state.output())?;
            if json {
                JsonPrinter.print_failure(state.output())?;
            } else {
                TextPrinter { color: io::stdout().is_terminal() }.print(&state)?;
            }
            return Ok(false);
        }
    };

    if json {
        JsonPrinter.print(&result)?;
    }
    state.apply(result);
    screen.save_output(state.output())?;
    screen.save_selected(&[])?;

    for name in show {
        if state.select(name).is_none() {
            eprintln!("warning: no variable named {}", name);
        }
    }

    if let Some(dir) = save_images {
        for (name, artifact) in state.variables() {
            if let ArtifactView::Image(info) = ArtifactView::from_artifact(artifact) {
                let path = info.save(&dir, name)?;
                eprintln!("saved {}", path.display());
            }
        }
    }

    if !json {
        TextPrinter { color: io::stdout().is_terminal() }.print(&state)?;
    }
    Ok(true)
}
