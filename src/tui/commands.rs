// ABOUTME: Slash commands typed into the prompt box.
// ABOUTME: Parses `/name args` into a SlashCommand; anything malformed becomes a usage message.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Attach(PathBuf),
    Detach,
    New,
    Switch(String),
    Login { username: String, password: String },
    Signup { username: String, password: String },
    Logout,
    Lang(String),
    Export(PathBuf),
    Quit,
}

pub const HELP: &str = "/attach PATH  /detach  /new  /switch ID  /login USER PASS  /signup USER PASS  /logout  /lang CODE  /export PATH  /quit";

/// Parse a line starting with `/`. Errors are user-facing usage strings.
pub fn parse_command(line: &str) -> Result<SlashCommand, String> {
    let line = line.trim();
    let Some(body) = line.strip_prefix('/') else {
        return Err(format!("not a command: {line}"));
    };
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    match name {
        "attach" => one_arg(rest, "/attach PATH").map(|p| SlashCommand::Attach(PathBuf::from(p))),
        "detach" => Ok(SlashCommand::Detach),
        "new" => Ok(SlashCommand::New),
        "switch" => one_arg(rest, "/switch ID").map(SlashCommand::Switch),
        "login" => credentials(rest, "/login USER PASS")
            .map(|(username, password)| SlashCommand::Login { username, password }),
        "signup" => credentials(rest, "/signup USER PASS")
            .map(|(username, password)| SlashCommand::Signup { username, password }),
        "logout" => Ok(SlashCommand::Logout),
        "lang" => one_arg(rest, "/lang CODE").map(SlashCommand::Lang),
        "export" => one_arg(rest, "/export PATH").map(|p| SlashCommand::Export(PathBuf::from(p))),
        "quit" | "exit" => Ok(SlashCommand::Quit),
        other => Err(format!("unknown command /{other}. {HELP}")),
    }
}

fn one_arg(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest.to_string())
    }
}

fn credentials(rest: &str, usage: &str) -> Result<(String, String), String> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(user), Some(pass), None) => Ok((user.to_string(), pass.to_string())),
        _ => Err(format!("usage: {usage}")),
    }
}
