use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use netfs_client::config;
use netfs_client::i18n::{Catalog, Msg, Translate};
use netfs_client::session::Session;
use netfs_client::types::{FileSource, NodeId, TransferKind};
use netfs_client::ui::Ui;
use netfs_client::view::{ListingRow, ListingView, PickerView};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  ls                   reload the current folder
  cd <id>              open folder <id>
  up | home            parent folder | root
  mkdir <name>         create a folder here
  put <path> [name]    upload a local file here
  get <id> [out]       download a file
  cp <id> | mv <id>    copy / move, then pick a destination
  rename <id> <name>   rename a node
  rm <id>              delete a node
  quit";

const PICKER_HELP: &str = "\
picker: open <id> | select <id> | back | home | choose | cancel";

/// Terminal rendition of the page: listings and dialogs go to stdout,
/// prompts read stdin.
struct TerminalUi {
    messages: Catalog,
}

impl TerminalUi {
    fn action_labels(&self, row: &ListingRow) -> String {
        row.actions.iter().map(|a| self.messages.translate(a.msg())).collect::<Vec<_>>().join(" | ")
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        print!("{} ", prompt);
        io::stdout().flush().ok();
        read_line()
    }
}

impl Ui for TerminalUi {
    fn show_listing(&self, view: &ListingView) {
        println!();
        println!("{}   [{}]", view.path, view.crumb);
        if let Some(msg) = &view.empty_message {
            println!("  {}", msg);
            return;
        }
        for row in &view.rows {
            let id = row.id.map(|id| format!("#{}", id)).unwrap_or_default();
            println!(
                "  {:>6}  {:<40} {:>10}  {:<19}  [{}]",
                id,
                row.label,
                row.size,
                row.updated,
                self.action_labels(row)
            );
        }
    }

    fn show_error(&self, message: &str) {
        println!();
        println!("  !! {}", message);
    }

    fn set_status(&self, message: &str) {
        println!("-- {}", message);
    }

    fn alert(&self, message: &str) {
        eprintln!("[!] {}", message);
    }

    fn confirm(&self, message: &str) -> bool {
        matches!(self.ask(&format!("{} [y/N]", message)).as_deref().map(str::trim), Some("y" | "Y" | "yes"))
    }

    fn show_picker(&self, view: &PickerView) {
        println!();
        println!("== {} ==", view.title);
        println!("   {}", view.location);
        if let Some(notice) = &view.notice {
            println!("   {}", notice);
        }
        for entry in &view.entries {
            let id = entry.id.map(|id| format!("#{}", id)).unwrap_or_default();
            println!("   {:>6}  {}/", id, entry.name);
        }
        println!("   selected: {}", view.candidate);
    }

    fn show_progress(&self, percent: u8) {
        print!("\r   [{:<20}] {:>3}%", "#".repeat(usize::from(percent / 5)), percent);
        io::stdout().flush().ok();
        if percent >= 100 {
            println!();
        }
    }

    fn set_controls_enabled(&self, _enabled: bool) {}

    fn close_modal(&self) {}
}

// Blocking stdin: the runtime is single-threaded and nothing else runs while
// the prompt waits.
fn read_line() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

fn parse_id(arg: Option<&str>) -> Option<NodeId> {
    let id = arg.and_then(|s| s.trim_start_matches('#').parse().ok());
    if id.is_none() {
        eprintln!("expected a node id");
    }
    id
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Konfiguration zuerst, damit das Log-Verzeichnis feststeht
    let app_cfg = config::load()?;

    // Logging (stderr + tägliche Datei-Rotation), stdout gehört der Oberfläche
    std::fs::create_dir_all(&app_cfg.logging.directory).ok();
    let (stderr_nb, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());
    let file_appender = tracing_appender::rolling::daily(&app_cfg.logging.directory, &app_cfg.logging.file_name);
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,netfs_client=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stderr_nb))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .init();
    // Guards am Leben halten, damit Non-Blocking Writer korrekt flushen
    let _log_guards = (stderr_guard, file_guard);

    info!("NetFS client talking to {}", app_cfg.server.base_url);
    let mut session = Session::from_config(&app_cfg, Arc::new(TerminalUi { messages: Catalog::new(app_cfg.locale()) }))?;
    session.start().await;
    println!("{}", HELP);

    loop {
        print!("netfs> ");
        io::stdout().flush().ok();
        let Some(line) = read_line() else { break };
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else { continue };
        match cmd {
            "ls" => {
                session.navigator().refresh().await;
            }
            "cd" => {
                if let Some(id) = parse_id(parts.next()) {
                    session.open(Some(id)).await;
                }
            }
            "up" => {
                session.up().await;
            }
            "home" => {
                session.home().await;
            }
            "mkdir" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let _ = session.create_folder(&name).await;
            }
            "put" => {
                let Some(path) = parts.next() else {
                    let _ = session.upload(None, None).await;
                    continue;
                };
                let name = parts.next().map(str::to_string);
                match read_file(Path::new(path)).await {
                    Ok(file) => {
                        let _ = session.upload(Some(file), name).await;
                    }
                    Err(e) => eprintln!("[!] {}: {}", path, e),
                }
            }
            "get" => {
                if let Some(id) = parse_id(parts.next()) {
                    let out = parts.next().map(str::to_string).unwrap_or_else(|| format!("node-{}", id));
                    if let Ok(bytes) = session.download(id, false).await {
                        match tokio::fs::write(&out, &bytes).await {
                            Ok(()) => println!("-- {} bytes -> {}", bytes.len(), out),
                            Err(e) => {
                                warn!("writing {} failed: {}", out, e);
                                eprintln!("[!] {}: {}", session.surface().tr(Msg::DownloadFailed), e);
                            }
                        }
                    }
                }
            }
            "cp" | "mv" => {
                let kind = if cmd == "cp" { TransferKind::Copy } else { TransferKind::Move };
                if let Some(id) = parse_id(parts.next()) {
                    if session.begin_transfer(kind, id).await.is_ok() {
                        picker_loop(&mut session).await;
                    }
                }
            }
            "rename" => {
                if let Some(id) = parse_id(parts.next()) {
                    let name = parts.collect::<Vec<_>>().join(" ");
                    let _ = session.rename(id, &name).await;
                }
            }
            "rm" => {
                if let Some(id) = parse_id(parts.next()) {
                    let question = session.surface().tr(Msg::DeleteConfirm);
                    if session.surface().ui.confirm(&question) {
                        let _ = session.delete(id).await;
                    }
                }
            }
            "help" | "?" => println!("{}", HELP),
            "quit" | "exit" => break,
            other => eprintln!("unknown command '{}', try help", other),
        }
    }

    info!("bye");
    Ok(())
}

async fn picker_loop(session: &mut Session) {
    println!("{}", PICKER_HELP);
    while session.transfer().is_some_and(|t| t.is_active()) {
        print!("pick> ");
        io::stdout().flush().ok();
        let Some(line) = read_line() else {
            session.cancel_transfer();
            return;
        };
        let mut parts = line.split_whitespace();
        let Some(picker) = session.transfer_picker() else { return };
        match parts.next() {
            Some("open") => {
                if let Some(id) = parse_id(parts.next()) {
                    if let Err(e) = picker.drill_into(id).await {
                        eprintln!("[!] {}", e);
                    }
                }
            }
            Some("select") => {
                if let Some(id) = parse_id(parts.next()) {
                    if let Err(e) = picker.select_child(id) {
                        eprintln!("[!] {}", e);
                    }
                }
            }
            Some("back") => {
                picker.back().await;
            }
            Some("home") => {
                picker.home().await;
            }
            Some("choose") => {
                let _ = session.choose_destination().await;
            }
            Some("cancel") => session.cancel_transfer(),
            Some(_) => println!("{}", PICKER_HELP),
            None => {}
        }
    }
}

async fn read_file(path: &Path) -> std::io::Result<FileSource> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(FileSource { name, bytes })
}
