// ABOUTME: App orchestrator: wires config, renderer, sessions, transport, and account client together.
// ABOUTME: Runs the terminal UI loop, or a single submission for the one-shot `send` command.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use crossterm::event::Event;
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use crate::chat::attachment::Attachment;
use crate::chat::controls::FormControls;
use crate::chat::dispatch::{ChatController, Completion, DispatchState};
use crate::chat::export::{render_page, write_page};
use crate::chat::session::{SessionStore, load_seeds};
use crate::chat::types::Speakers;
use crate::config::Config;
use crate::remote::{AccountClient, HttpTransport, Navigation, NewChat, build_client};
use crate::render::Renderer;
use crate::tui::commands::SlashCommand;
use crate::tui::events::{UiEvent, ui_events};
use crate::tui::input::{InputResult, handle_key};
use crate::tui::state::TuiState;
use crate::tui::ui;

/// Top-level application that orchestrates all subsystems.
pub struct App {
    config: Config,
    history: Option<PathBuf>,
}

impl App {
    pub fn new(config: Config, history: Option<PathBuf>) -> Self {
        Self { config, history }
    }

    /// Build the session store (seeded from the history file, if any) and the
    /// controller around it.
    fn build_controller(
        &self,
        http: &reqwest::Client,
    ) -> anyhow::Result<(ChatController, mpsc::Receiver<Completion>)> {
        let renderer = Arc::new(Renderer::from_config(&self.config.render));
        let speakers = Speakers {
            user: self.config.chat.user_label.clone(),
            assistant: self.config.chat.assistant_name.clone(),
        };
        let mut store = SessionStore::new(renderer, speakers);

        if let Some(path) = &self.history {
            let seeds = load_seeds(path)
                .with_context(|| format!("failed to read history file {}", path.display()))?;
            let imported = store.import(seeds)?;
            tracing::info!(imported, path = %path.display(), "loaded chat history");
        }
        if store.is_empty() {
            store.create(&self.config.chat.initial_session, "New chat")?;
        }

        let transport = Arc::new(HttpTransport::new(
            http.clone(),
            self.config.server.prompt_url(),
        ));
        Ok(ChatController::new(store, transport))
    }

    /// Run the full-screen chat until the user quits.
    pub async fn run(self) -> anyhow::Result<()> {
        let http = build_client()?;
        let (mut controller, completions) = self.build_controller(&http)?;
        let account = AccountClient::new(http, self.config.server.base_url.clone());
        let mut state = TuiState::new(
            self.config.server.base_url.clone(),
            self.config.chat.assistant_name.clone(),
            self.config.chat.language.clone(),
        );

        tracing::info!(endpoint = %self.config.server.prompt_url(), "starting chat");
        let mut terminal = ratatui::init();
        let result = event_loop(
            &mut terminal,
            &mut state,
            &mut controller,
            &account,
            completions,
        )
        .await;
        ratatui::restore();

        if controller.in_flight() > 0 {
            tracing::info!(in_flight = controller.in_flight(), "quitting with replies outstanding");
        }
        result
    }

    /// Submit one prompt, wait for its reply, and print it (or the whole page).
    pub async fn send_once(
        self,
        prompt: String,
        file: Option<PathBuf>,
        html: bool,
    ) -> anyhow::Result<()> {
        let http = build_client()?;
        let (mut controller, mut completions) = self.build_controller(&http)?;

        let mut controls = FormControls::with_prompt(prompt);
        if let Some(path) = file {
            controls.attachment = Some(Attachment::load(&path).await?);
        }

        controller.submit(&mut controls)?;
        let outcome = loop {
            let completion = completions
                .recv()
                .await
                .context("request task ended without reporting back")?;
            match controller.complete(completion, &mut controls)? {
                DispatchState::AwaitingReply => continue,
                finished => break finished,
            }
        };

        if html {
            print!(
                "{}",
                render_page(
                    controller.sessions(),
                    controller.switcher(),
                    &self.config.chat.assistant_name
                )
            );
            return Ok(());
        }

        match outcome {
            DispatchState::Resolved => {
                let reply = controller
                    .visible_session()
                    .and_then(|s| s.log.turns().last())
                    .map(|t| t.turn.raw_text.clone())
                    .unwrap_or_default();
                println!("{reply}");
                Ok(())
            }
            _ => anyhow::bail!("{}", controls.status),
        }
    }

    /// Read markdown from stdin and print the rendered HTML.
    pub fn render_stdin(self) -> anyhow::Result<()> {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        let renderer = Renderer::from_config(&self.config.render);
        println!("{}", renderer.render(&input));
        Ok(())
    }
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    state: &mut TuiState,
    controller: &mut ChatController,
    account: &AccountClient,
    completions: mpsc::Receiver<Completion>,
) -> anyhow::Result<()> {
    let mut events = ui_events(completions);

    loop {
        terminal.draw(|frame| ui::render(frame, state, controller))?;

        let Some(event) = events.next().await else {
            return Ok(());
        };

        match event {
            UiEvent::Terminal(Event::Key(key)) => match handle_key(state, key) {
                InputResult::None => {}
                InputResult::Quit => return Ok(()),
                InputResult::Submit => {
                    if let Err(e) = controller.submit(state) {
                        tracing::warn!(error = %e, "submit failed");
                        state.status = e.to_string();
                    }
                }
                InputResult::Command(command) => {
                    if run_command(command, state, controller, account).await {
                        return Ok(());
                    }
                }
                InputResult::Invalid(message) => state.status = message,
                InputResult::ScrollUp(lines) => {
                    if let Some(log) = controller.visible_log_mut() {
                        log.scroll_up(lines);
                    }
                }
                InputResult::ScrollDown(lines) => {
                    if let Some(log) = controller.visible_log_mut() {
                        log.scroll_down(lines);
                    }
                }
                InputResult::NextSession => {
                    controller.cycle_session(true);
                }
                InputResult::PrevSession => {
                    controller.cycle_session(false);
                }
            },
            // Resize and focus events only need the redraw at the top of the loop.
            UiEvent::Terminal(_) => {}
            UiEvent::Completion(completion) => {
                if let Err(e) = controller.complete(completion, state) {
                    tracing::warn!(error = %e, "dropped completion");
                }
            }
            UiEvent::TerminalError(e) => anyhow::bail!("terminal input failed: {e}"),
        }
    }
}

fn describe(navigation: &Navigation, done: &str) -> String {
    match navigation {
        Navigation::Redirect(location) => format!("{done} (server redirected to {location})"),
        Navigation::Reload => done.to_string(),
    }
}

/// Run a slash command. Returns true when the app should quit.
async fn run_command(
    command: SlashCommand,
    state: &mut TuiState,
    controller: &mut ChatController,
    account: &AccountClient,
) -> bool {
    tracing::debug!(?command, "slash command");
    match command {
        SlashCommand::Quit => return true,
        SlashCommand::Attach(path) => match Attachment::load(&path).await {
            Ok(attachment) => state.stage_attachment(attachment),
            Err(e) => state.status = e.to_string(),
        },
        SlashCommand::Detach => state.clear_attachment(),
        SlashCommand::Switch(id) => {
            if let Err(e) = controller.select_session(&id) {
                state.status = e.to_string();
            }
        }
        SlashCommand::New => match account.new_chat().await {
            Ok(NewChat::Created(id)) => {
                let title = format!("Chat {}", id.chars().take(8).collect::<String>());
                match controller.open_session(&id, &title) {
                    Ok(()) => state.status = format!("Started {title}"),
                    Err(e) => state.status = e.to_string(),
                }
            }
            Ok(NewChat::Navigate(navigation)) => {
                state.status = describe(&navigation, "Could not start a new chat; log in first");
            }
            Err(e) => {
                tracing::error!(error = %e, "new chat failed");
                state.status = e.to_string();
            }
        },
        SlashCommand::Login { username, password } => {
            state.status = match account.login(&username, &password).await {
                Ok(navigation) => describe(&navigation, "Login sent"),
                Err(e) => e.to_string(),
            };
        }
        SlashCommand::Signup { username, password } => {
            state.status = match account.signup(&username, &password).await {
                Ok(navigation) => describe(&navigation, "Signup sent"),
                Err(e) => e.to_string(),
            };
        }
        SlashCommand::Logout => {
            state.status = match account.logout().await {
                Ok(navigation) => describe(&navigation, "Logged out"),
                Err(e) => e.to_string(),
            };
        }
        SlashCommand::Lang(code) => match account.set_language(&code).await {
            Ok(navigation) => {
                state.status = describe(&navigation, &format!("Language set to {code}"));
                state.language = code;
            }
            Err(e) => state.status = e.to_string(),
        },
        SlashCommand::Export(path) => {
            state.status = match write_page(
                &path,
                controller.sessions(),
                controller.switcher(),
                &state.assistant_name,
            ) {
                Ok(()) => format!("Exported to {}", path.display()),
                Err(e) => {
                    tracing::error!(error = %e, "export failed");
                    format!("Export failed: {e}")
                }
            };
        }
    }
    false
}
