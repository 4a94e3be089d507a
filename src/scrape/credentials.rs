use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::session::Credentials;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0} is required")]
    Empty(&'static str),
    #[error("could not read from terminal: {0}")]
    Io(#[from] io::Error),
}

/// Username and password from `lookup` (the environment), else from `prompt`.
/// Either one blank aborts before any request is made.
pub fn resolve(
    lookup: impl Fn(&str) -> Option<String>,
    mut prompt: impl FnMut(&str) -> io::Result<String>,
) -> Result<Credentials, CredentialError> {
    let mut get = |var: &str, label: &str| -> io::Result<String> {
        match lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => Ok(v),
            None => Ok(prompt(label)?.trim().to_string()),
        }
    };
    let username = get("EGP_USERNAME", "Username (email): ")?;
    if username.is_empty() { return Err(CredentialError::Empty("username")); }
    let password = get("EGP_PASSWORD", "Password: ")?;
    if password.is_empty() { return Err(CredentialError::Empty("password")); }
    Ok(Credentials { username, password })
}

/// Ask on stderr, read one line from stdin.
pub fn prompt_stdin(label: &str) -> io::Result<String> {
    let mut err = io::stderr();
    write!(err, "{label}")?;
    err.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
