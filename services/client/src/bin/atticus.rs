//! services/client/src/bin/atticus.rs

use atticus_core::{
    convert::html_to_text,
    domain::{Chapter, Id, NewChapter, NewDocument, NewProject, ThemeMode},
    draft::DraftSnapshot,
    ports::{DraftSink, KeyValueStore, PortError, WriterApi},
    presentation::{parse_chapter_position, relative_time, Listing, Reorder, WordCountTier},
};
use chrono::Utc;
use client_lib::{
    adapters::{
        ChapterDraftSink, DocumentDraftSink, FileKeyValueStore, HttpWriterApi, TOKEN_KEY,
    },
    autosave::EditorSession,
    cli::{Command, USAGE},
    collab::{self, collab_url, CollabConnection, CollabEvent, CollabState, HandlerMap, PresenceAction},
    config::Config,
    error::{ClientError, ClientResult},
    preferences::ThemePreference,
    session::{login_failure_message, AuthSession},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- 2. Parse the Command Line ---
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    // --- 3. Initialize Adapters ---
    let store_path = match &config.store_path {
        Some(path) => path.clone(),
        None => FileKeyValueStore::default_path()?,
    };
    info!("Using local store at {}", store_path.display());
    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(store_path));
    let api: Arc<dyn WriterApi> = Arc::new(HttpWriterApi::new(&config, store.clone())?);

    // --- 4. Run the Command ---
    let app = App { config, store, api };
    if let Err(e) = app.run(command).await {
        eprintln!("{}", describe(&e));
        std::process::exit(1);
    }
    Ok(())
}

/// Turns an error into the line printed for the user.
fn describe(error: &ClientError) -> String {
    match error {
        ClientError::Port(PortError::Unauthorized) => {
            "Not signed in, or the session expired. Run `atticus login <username> <password>`."
                .to_string()
        }
        ClientError::Port(PortError::NotFound(_)) => "Not found.".to_string(),
        ClientError::Port(PortError::Rejected { message, .. }) => message.clone(),
        ClientError::Port(PortError::Network(e)) => format!("Could not reach the server: {}", e),
        other => other.to_string(),
    }
}

struct App {
    config: Arc<Config>,
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn WriterApi>,
}

impl App {
    async fn run(&self, command: Command) -> ClientResult<()> {
        match command {
            Command::Help => println!("{}", USAGE),
            Command::Ping => {
                self.api.test_connection().await?;
                println!("{} is reachable.", self.config.api_base_url);
            }

            // --- Account ---
            Command::Login { username, password } => {
                let mut session = self.session();
                match session.login(&username, &password).await {
                    Ok(user) => println!("Signed in as {}.", user.full_name()),
                    Err(e) => return Err(ClientError::Auth(login_failure_message(&e))),
                }
            }
            Command::Register {
                username,
                email,
                password,
            } => {
                let mut session = self.session();
                match session.register(&username, &email, &password).await? {
                    Some(user) => println!("Account created. Signed in as {}.", user.full_name()),
                    None => println!("Account created. Sign in with `atticus login`."),
                }
            }
            Command::Logout => {
                self.session().logout().await?;
                println!("Signed out.");
            }
            Command::Whoami => {
                let mut session = self.session();
                if session.restore().await {
                    if let Some(user) = session.user() {
                        println!("{} <{}>", user.full_name(), user.email);
                    }
                } else {
                    println!("Not signed in.");
                }
            }

            // --- Projects ---
            Command::Projects { all } => {
                let listing: Listing<_> = self.api.list_projects(!all).await?.into();
                match listing {
                    Listing::Empty => {
                        println!("No projects yet. Create one with `atticus new-project <title>`.")
                    }
                    Listing::Populated(projects) => {
                        let now = Utc::now();
                        for p in projects {
                            println!(
                                "#{:<5} {}  {} words, {} chapters, updated {}",
                                p.id,
                                p.title,
                                p.word_count,
                                p.chapter_count,
                                relative_time(p.updated_at.as_deref(), now)
                            );
                        }
                    }
                }
            }
            Command::Project { project } => {
                let p = self.api.get_project(project).await?;
                println!("#{} {}", p.id, p.title);
                if !p.genre.is_empty() {
                    println!("Genre: {}", p.genre);
                }
                if !p.description.is_empty() {
                    println!("{}", p.description);
                }
                match p.target_word_count {
                    Some(target) => println!(
                        "{} / {} words ({:.0}%)",
                        p.word_count, target, p.progress_percentage
                    ),
                    None => println!("{} words", p.word_count),
                }
            }
            Command::NewProject { title, genre } => {
                let project = NewProject {
                    title,
                    genre: genre.unwrap_or_default(),
                    ..Default::default()
                };
                let created = self.api.create_project(&project).await?;
                println!("Created project #{} {}.", created.id, created.title);
            }
            Command::RenameProject { project, title } => {
                let current = self.api.get_project(project).await?;
                let update = NewProject {
                    title,
                    description: current.description,
                    genre: current.genre,
                    target_word_count: current.target_word_count,
                };
                let updated = self.api.update_project(project, &update).await?;
                println!("Renamed project #{} to {}.", updated.id, updated.title);
            }
            Command::DeleteProject { project } => {
                self.api.delete_project(project).await?;
                println!("Deleted project #{}.", project);
            }

            // --- Chapters ---
            Command::Chapters { project } => {
                let mut chapters = self.api.list_chapters(project).await?;
                chapters.sort_by_key(|c| c.order);
                match Listing::from(chapters) {
                    Listing::Empty => println!(
                        "No chapters yet. Add one with `atticus new-chapter {}`.",
                        project
                    ),
                    Listing::Populated(chapters) => {
                        let now = Utc::now();
                        for c in chapters {
                            print_chapter_line(&c, now);
                        }
                    }
                }
            }
            Command::NewChapter { project } => {
                let existing = self.api.list_chapters(project).await?;
                let created = self
                    .api
                    .create_chapter(project, &NewChapter::next_after(existing.len()))
                    .await?;
                match (created.success, created.chapter) {
                    (true, Some(chapter)) => {
                        println!("Created chapter #{} {}.", chapter.id, chapter.title)
                    }
                    (true, None) => println!("Chapter created."),
                    (false, _) => {
                        return Err(ClientError::Port(PortError::Rejected {
                            status: 200,
                            message: created
                                .error
                                .unwrap_or_else(|| "Failed to create chapter".to_string()),
                        }))
                    }
                }
            }
            Command::Reorder {
                project,
                chapter,
                position,
            } => {
                let chapters = self.api.list_chapters(project).await?;
                let current = chapters
                    .iter()
                    .find(|c| c.id == chapter)
                    .ok_or_else(|| PortError::NotFound(format!("chapter {}", chapter)))?;
                match parse_chapter_position(&position, current.order, chapters.len())
                    .map_err(|e| ClientError::Usage(e.to_string()))?
                {
                    Reorder::Unchanged => println!("Chapter is already at position {}.", position.trim()),
                    Reorder::MoveTo(order) => {
                        self.api.reorder_chapter(project, chapter, order).await?;
                        println!("Moved chapter #{} to position {}.", chapter, order + 1);
                    }
                }
            }
            Command::Show { chapter } => {
                let c = self.api.get_chapter(chapter).await?;
                let text = html_to_text(&c.content);
                println!("{}\n", c.title);
                println!("{}", text);
                println!("\n({} words)", atticus_core::convert::word_count(&text));
            }
            Command::Edit { chapter } => {
                let c = self.api.get_chapter(chapter).await?;
                let sink = Arc::new(ChapterDraftSink::new(self.api.clone(), chapter));
                self.edit(DraftSnapshot::from(&c), sink).await?;
            }

            // --- Documents ---
            Command::Documents => match Listing::from(self.api.list_documents().await?) {
                Listing::Empty => println!("No documents yet."),
                Listing::Populated(documents) => {
                    for d in documents {
                        let state = if d.is_published { "published" } else { "draft" };
                        println!("#{:<5} {}  {} words, {}", d.id, d.title, d.word_count, state);
                    }
                }
            },
            Command::NewDocument { title, project } => {
                let document = NewDocument {
                    title,
                    project,
                    ..Default::default()
                };
                let created = self.api.create_document(&document).await?;
                println!("Created document #{} {}.", created.id, created.title);
            }
            Command::EditDocument { document } => {
                let existing = self
                    .api
                    .list_documents()
                    .await?
                    .into_iter()
                    .find(|d| d.id == document)
                    .ok_or_else(|| PortError::NotFound(format!("document {}", document)))?;
                let sink = Arc::new(DocumentDraftSink::new(self.api.clone(), document));
                self.edit(DraftSnapshot::from(&existing), sink).await?;
            }
            Command::DeleteDocument { document } => {
                self.api.delete_document(document).await?;
                println!("Deleted document #{}.", document);
            }

            // --- Collaboration ---
            Command::Collaborators { project } => {
                match Listing::from(self.api.list_collaborators(project).await?) {
                    Listing::Empty => println!("No collaborators yet."),
                    Listing::Populated(collaborators) => {
                        for c in collaborators {
                            println!(
                                "#{:<5} {} <{}> {}",
                                c.id,
                                c.display_name(),
                                c.email,
                                c.role.as_str()
                            );
                        }
                    }
                }
            }
            Command::Invite { project, email } => {
                self.api.invite_collaborator(project, &email).await?;
                println!("Invited {}.", email);
            }
            Command::RemoveCollaborator {
                project,
                collaborator,
            } => {
                self.api.remove_collaborator(project, collaborator).await?;
                println!("Removed collaborator #{}.", collaborator);
            }
            Command::SetRole {
                project,
                collaborator,
                role,
            } => {
                self.api
                    .update_collaborator_role(project, collaborator, role)
                    .await?;
                println!("Collaborator #{} is now {}.", collaborator, role.as_str());
            }
            Command::Share { project } => {
                let link = self.api.share_link(project).await?;
                match link.link() {
                    Some(url) => {
                        if let Some(title) = &link.project_title {
                            println!("{}", title);
                        }
                        println!("{}", url);
                    }
                    None => {
                        return Err(ClientError::Port(PortError::Rejected {
                            status: 200,
                            message: link
                                .error
                                .unwrap_or_else(|| "Failed to generate share link".to_string()),
                        }))
                    }
                }
            }
            Command::Watch { document } => self.watch(document).await?,

            // --- Preferences ---
            Command::Theme { toggle } => {
                let prefs = ThemePreference::new(self.store.clone());
                let mode: ThemeMode = if toggle {
                    prefs.toggle().await?
                } else {
                    prefs.load().await
                };
                println!("Theme: {}", mode.as_str());
            }
        }
        Ok(())
    }

    fn session(&self) -> AuthSession {
        AuthSession::new(self.api.clone(), self.store.clone())
    }

    /// Reads stdin line by line into the draft until EOF, then saves.
    async fn edit(&self, initial: DraftSnapshot, sink: Arc<dyn DraftSink>) -> ClientResult<()> {
        eprintln!("Editing \"{}\" ({} words).", initial.title, atticus_core::convert::word_count(&initial.content));
        eprintln!("Type the new text; end with Ctrl-D. `:save` saves now, `:title <text>` renames.");

        let session = EditorSession::new(initial, sink, self.config.autosave_delay);
        let mut status = session.subscribe();
        let reporter = tokio::spawn(async move {
            let mut last = status.borrow().last_saved_at;
            while status.changed().await.is_ok() {
                let saved_at = status.borrow().last_saved_at;
                if saved_at != last {
                    last = saved_at;
                    eprintln!("(saved)");
                }
            }
        });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut body: Vec<String> = Vec::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim() == ":save" {
                if let Err(e) = session.save_now().await {
                    eprintln!("Save failed: {}", e);
                }
            } else if let Some(title) = line.strip_prefix(":title ") {
                session.set_title(title.trim()).await;
            } else {
                body.push(line);
                session.set_content(body.join("\n")).await;
            }
        }

        let words = session.status().word_count;
        let result = session.close().await;
        reporter.abort();
        if result? {
            println!("Saved ({} words).", words);
        } else {
            println!("No changes.");
        }
        Ok(())
    }

    /// Prints collaboration events for a document until Ctrl-C or disconnect.
    async fn watch(&self, document: Id) -> ClientResult<()> {
        let authorization = self
            .store
            .get(TOKEN_KEY)
            .await?
            .map(|token| self.config.auth_scheme.header_value(&token));
        let url = collab_url(&self.config.ws_base_url(), document);
        let mut connection = CollabConnection::connect(&url, authorization.as_deref()).await?;
        println!("Watching document #{}. Press Ctrl-C to stop.", document);

        let mut handlers = HandlerMap::new();
        handlers
            .on(collab::EventKind::Edit, |event| {
                if let CollabEvent::Edit { content, user } = event {
                    let text = html_to_text(content);
                    println!("[edit] {}: {} words", user, atticus_core::convert::word_count(&text));
                }
            })
            .on(collab::EventKind::Presence, |event| {
                if let CollabEvent::Presence { user, action } = event {
                    let verb = match action {
                        PresenceAction::Joined => "joined",
                        PresenceAction::Left => "left",
                    };
                    println!("[presence] {} {}", user, verb);
                }
            })
            .on(collab::EventKind::Save, |event| println!("[save] {}", event.user()))
            .on(collab::EventKind::Share, |event| println!("[share] {}", event.user()));

        let mut state = CollabState::new();
        tokio::select! {
            _ = collab::pump(&mut connection, &handlers, &mut state) => {
                println!("Connection closed.");
            }
            _ = tokio::signal::ctrl_c() => {
                if let Err(e) = connection.close().await {
                    warn!("Failed to close the collaboration channel: {}", e);
                }
            }
        }
        if !state.online.is_empty() {
            let online: Vec<&str> = state.online.iter().map(String::as_str).collect();
            println!("Online when stopped: {}", online.join(", "));
        }
        Ok(())
    }
}

fn print_chapter_line(chapter: &Chapter, now: chrono::DateTime<Utc>) {
    let tier = WordCountTier::for_count(chapter.word_count);
    println!(
        "{:>3}. #{:<5} {}  {} words ({}), updated {}",
        chapter.order + 1,
        chapter.id,
        chapter.title,
        chapter.word_count,
        tier.label(),
        relative_time(chapter.updated_at.as_deref(), now)
    );
}
