use std::{io::Write, path::PathBuf, str::FromStr};

use anyhow::Result;
use platform_api::RecordStore;
use products_hr::{Employee, Field, RosterController, UnknownField};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::view;

const PROMPT: &str = "roster> ";

const HELP: &str = "\
commands:
  list                     show every employee in the roster
  show                     show the form and the current search result
  set <field> <value>      fill a form field (id, first-name, last-name, email, position)
  photo <path>...          select a photo; only the first image is kept
                           (quote paths with spaces; no path clears it)
  submit                   add the employee, or update the one being edited
  edit <id>                load an employee into the form for editing
  search <id>              look an employee up in the roster
  delete <id>              delete an employee
  help                     show this text
  quit                     leave the shell";

#[derive(Clone, Debug, PartialEq)]
pub enum ShellCommand {
    List,
    Show,
    Set(Field, String),
    Photo(Vec<PathBuf>),
    Submit,
    Edit(String),
    Search(String),
    Delete(String),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command `{0}`; type `help` for a list")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Field(#[from] UnknownField),
}

impl FromStr for ShellCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));
        let required = |name: &'static str| {
            if rest.is_empty() {
                Err(ParseError::MissingArgument(name))
            } else {
                Ok(rest.to_string())
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Ok(ShellCommand::List),
            "show" => Ok(ShellCommand::Show),
            "set" => {
                let args = required("set")?;
                let (name, value) = args
                    .split_once(char::is_whitespace)
                    .map(|(name, value)| (name, value.trim()))
                    .unwrap_or((args.as_str(), ""));
                Ok(ShellCommand::Set(name.parse()?, value.to_string()))
            }
            "photo" => Ok(ShellCommand::Photo(
                split_args(rest).into_iter().map(PathBuf::from).collect(),
            )),
            "submit" => Ok(ShellCommand::Submit),
            "edit" => Ok(ShellCommand::Edit(required("edit")?)),
            "search" => Ok(ShellCommand::Search(required("search")?)),
            "delete" | "rm" => Ok(ShellCommand::Delete(required("delete")?)),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Split on whitespace, keeping single- or double-quoted runs together.
fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    let mut started = false;

    for ch in input.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                started = true;
            }
            None if ch.is_whitespace() => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            None => {
                current.push(ch);
                started = true;
            }
        }
    }
    if started {
        args.push(current);
    }
    args
}

/// Line-oriented front end over a [`RosterController`].
pub struct Shell<S, W> {
    controller: RosterController<S>,
    out: W,
}

impl<S, W> Shell<S, W>
where
    S: RecordStore<Employee>,
    W: Write,
{
    pub fn new(controller: RosterController<S>, out: W) -> Self {
        Self { controller, out }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (RosterController<S>, W) {
        (self.controller, self.out)
    }

    /// Read commands until `quit` or end of input.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        self.prompt()?;
        while let Some(line) = lines.next_line().await? {
            if !line.trim().is_empty() {
                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => self.execute(command).await?,
                    Err(err) => writeln!(self.out, "{err}")?,
                }
            }
            self.prompt()?;
        }
        Ok(())
    }

    pub async fn execute(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::List => {
                let lines = view::roster_lines(self.controller.roster());
                if lines.is_empty() {
                    writeln!(self.out, "(no employees)")?;
                }
                for line in lines {
                    writeln!(self.out, "{line}")?;
                }
            }
            ShellCommand::Show => {
                let summary =
                    view::form_summary(self.controller.form(), self.controller.is_editing());
                writeln!(self.out, "{summary}")?;
                if let Some(found) = self.controller.search_result() {
                    writeln!(self.out, "{}", view::employee_details(found))?;
                }
            }
            ShellCommand::Set(field, value) => self.controller.set_field(field, value),
            ShellCommand::Photo(paths) => {
                let (images, rejected): (Vec<_>, Vec<_>) =
                    paths.into_iter().partition(|path| view::is_image(path));
                let nothing_usable = images.is_empty() && !rejected.is_empty();
                for path in rejected {
                    writeln!(self.out, "skipped {}: not an image", path.display())?;
                }
                if nothing_usable {
                    return Ok(());
                }
                match self.controller.select_photo(images) {
                    Some(photo) => {
                        writeln!(self.out, "photo: {}", photo.file_name().unwrap_or("-"))?
                    }
                    None => writeln!(self.out, "photo cleared")?,
                }
            }
            ShellCommand::Submit => match self.controller.submit().await {
                Ok(notice) => writeln!(self.out, "{notice}")?,
                Err(err) if err.is_user_visible() => writeln!(self.out, "{err}")?,
                Err(_) => {}
            },
            ShellCommand::Edit(id) => {
                if self.controller.begin_edit(&id) {
                    let summary = view::form_summary(self.controller.form(), true);
                    writeln!(self.out, "{summary}")?;
                }
            }
            ShellCommand::Search(id) => match self.controller.search(id.as_str()) {
                Some(found) => writeln!(self.out, "{}", view::employee_details(found))?,
                None => writeln!(self.out, "no employee with ID {id}")?,
            },
            ShellCommand::Delete(id) => {
                if let Ok(notice) = self.controller.delete(&id).await {
                    writeln!(self.out, "{notice}")?;
                }
            }
            ShellCommand::Help => writeln!(self.out, "{HELP}")?,
            ShellCommand::Quit => {}
        }
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        write!(self.out, "{PROMPT}")?;
        self.out.flush()?;
        Ok(())
    }
}
