//! services/client/src/cli.rs
//!
//! Command-line parsing for the `atticus` binary.

use crate::error::{ClientError, ClientResult};
use atticus_core::domain::{Id, Role};

pub const USAGE: &str = "\
Usage: atticus <command> [args]

Account:
  ping                                   check the backend is reachable
  login <username> <password>
  register <username> <email> <password>
  logout
  whoami

Projects:
  projects [--all]                       bookshelf projects, or every project
  project <project>
  new-project <title> [genre]
  rename-project <project> <title>
  delete-project <project>

Chapters:
  chapters <project>
  new-chapter <project>
  reorder <project> <chapter> <position> position is 1-based
  show <chapter>
  edit <chapter>                         stdin lines become the draft

Documents:
  documents
  new-document <title> [project]
  edit-document <document>
  delete-document <document>

Collaboration:
  collaborators <project>
  invite <project> <email>
  remove-collaborator <project> <collaborator>
  set-role <project> <collaborator> <owner|collaborator>
  share <project>
  watch <document>                       print live events until Ctrl-C

Preferences:
  theme [toggle]

While editing, a line `:save` saves at once and `:title <text>` renames.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Ping,
    Login { username: String, password: String },
    Register { username: String, email: String, password: String },
    Logout,
    Whoami,
    Projects { all: bool },
    Project { project: Id },
    NewProject { title: String, genre: Option<String> },
    RenameProject { project: Id, title: String },
    DeleteProject { project: Id },
    Chapters { project: Id },
    NewChapter { project: Id },
    Reorder { project: Id, chapter: Id, position: String },
    Show { chapter: Id },
    Edit { chapter: Id },
    Documents,
    NewDocument { title: String, project: Option<Id> },
    EditDocument { document: Id },
    DeleteDocument { document: Id },
    Collaborators { project: Id },
    Invite { project: Id, email: String },
    RemoveCollaborator { project: Id, collaborator: Id },
    SetRole { project: Id, collaborator: Id, role: Role },
    Share { project: Id },
    Watch { document: Id },
    Theme { toggle: bool },
}

impl Command {
    /// Parses the arguments after the program name.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> ClientResult<Self> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let Some((&name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        let mut rest = Args { name, items: rest };

        let command = match name {
            "help" | "-h" | "--help" => Command::Help,
            "ping" => Command::Ping,
            "login" => Command::Login {
                username: rest.text("username")?,
                password: rest.text("password")?,
            },
            "register" => Command::Register {
                username: rest.text("username")?,
                email: rest.text("email")?,
                password: rest.text("password")?,
            },
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "projects" => Command::Projects {
                all: rest.flag("--all")?,
            },
            "project" => Command::Project {
                project: rest.id("project")?,
            },
            "new-project" => Command::NewProject {
                title: rest.text("title")?,
                genre: rest.optional_text(),
            },
            "rename-project" => Command::RenameProject {
                project: rest.id("project")?,
                title: rest.text("title")?,
            },
            "delete-project" => Command::DeleteProject {
                project: rest.id("project")?,
            },
            "chapters" => Command::Chapters {
                project: rest.id("project")?,
            },
            "new-chapter" => Command::NewChapter {
                project: rest.id("project")?,
            },
            "reorder" => Command::Reorder {
                project: rest.id("project")?,
                chapter: rest.id("chapter")?,
                position: rest.text("position")?,
            },
            "show" => Command::Show {
                chapter: rest.id("chapter")?,
            },
            "edit" => Command::Edit {
                chapter: rest.id("chapter")?,
            },
            "documents" => Command::Documents,
            "new-document" => Command::NewDocument {
                title: rest.text("title")?,
                project: rest.optional_id("project")?,
            },
            "edit-document" => Command::EditDocument {
                document: rest.id("document")?,
            },
            "delete-document" => Command::DeleteDocument {
                document: rest.id("document")?,
            },
            "collaborators" => Command::Collaborators {
                project: rest.id("project")?,
            },
            "invite" => Command::Invite {
                project: rest.id("project")?,
                email: rest.text("email")?,
            },
            "remove-collaborator" => Command::RemoveCollaborator {
                project: rest.id("project")?,
                collaborator: rest.id("collaborator")?,
            },
            "set-role" => Command::SetRole {
                project: rest.id("project")?,
                collaborator: rest.id("collaborator")?,
                role: parse_role(&rest.text("role")?)?,
            },
            "share" => Command::Share {
                project: rest.id("project")?,
            },
            "watch" => Command::Watch {
                document: rest.id("document")?,
            },
            "theme" => Command::Theme {
                toggle: rest.flag("toggle")?,
            },
            other => return Err(usage(format!("unknown command '{}'", other))),
        };
        rest.finish()?;
        Ok(command)
    }
}

fn usage(message: impl Into<String>) -> ClientError {
    ClientError::Usage(format!("{}\n\n{}", message.into(), USAGE))
}

fn parse_role(raw: &str) -> ClientResult<Role> {
    match raw.to_lowercase().as_str() {
        "owner" => Ok(Role::Owner),
        "collaborator" | "contributor" => Ok(Role::Collaborator),
        other => Err(usage(format!("'{}' is not a role (owner, collaborator)", other))),
    }
}

/// The positional arguments of one command, consumed front to back.
struct Args<'a> {
    name: &'a str,
    items: &'a [&'a str],
}

impl<'a> Args<'a> {
    fn next(&mut self) -> Option<&'a str> {
        let (&first, rest) = self.items.split_first()?;
        self.items = rest;
        Some(first)
    }

    fn text(&mut self, what: &str) -> ClientResult<String> {
        self.next()
            .map(str::to_string)
            .ok_or_else(|| usage(format!("{}: missing <{}>", self.name, what)))
    }

    fn optional_text(&mut self) -> Option<String> {
        self.next().map(str::to_string)
    }

    fn id(&mut self, what: &str) -> ClientResult<Id> {
        let raw = self.text(what)?;
        parse_id(self.name, what, &raw)
    }

    fn optional_id(&mut self, what: &str) -> ClientResult<Option<Id>> {
        match self.next() {
            Some(raw) => parse_id(self.name, what, raw).map(Some),
            None => Ok(None),
        }
    }

    /// An optional trailing word such as `--all`.
    fn flag(&mut self, word: &str) -> ClientResult<bool> {
        match self.items.first().copied() {
            Some(first) if first == word => {
                self.next();
                Ok(true)
            }
            Some(other) => Err(usage(format!("{}: unexpected '{}'", self.name, other))),
            None => Ok(false),
        }
    }

    fn finish(&self) -> ClientResult<()> {
        match self.items.first().copied() {
            Some(extra) => Err(usage(format!("{}: unexpected '{}'", self.name, extra))),
            None => Ok(()),
        }
    }
}

fn parse_id(command: &str, what: &str, raw: &str) -> ClientResult<Id> {
    raw.parse::<Id>()
        .map_err(|_| usage(format!("{}: <{}> must be a number, got '{}'", command, what, raw)))
}
