// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command patterns and the invocations they are matched against.
//!
//! A [`Command`] is an ordered list of [`Token`]s:
//! - `Token::Literal("git")` - must equal the argument at that position
//! - `Token::Any(Any::new().min(1))` - absorbs a bounded run of arguments
//! - `Token::Program(Program::new("python"))` - matches on the file name only
//!
//! ```
//! use fakeproc::{command, Any};
//!
//! let pattern = command!["cp", Any::new().min(2)].unwrap();
//! assert!(!pattern.matches(&["cp", "/a"]));
//! assert!(pattern.matches(&["cp", "/a", "/b"]));
//! ```

use crate::error::{FakeProcessError, Result};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/// Wildcard token absorbing a bounded number of arguments
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Any {
    min: Option<usize>,
    max: Option<usize>,
}

impl Any {
    /// An unbounded wildcard.
    pub const fn new() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Require at least `min` absorbed arguments.
    pub const fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    /// Allow at most `max` absorbed arguments.
    pub const fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Build a wildcard with both bounds, rejecting `min > max`.
    pub fn bounded(min: usize, max: usize) -> Result<Self> {
        let any = Self::new().min(min).max(max);
        any.validate()?;
        Ok(any)
    }

    pub fn min_bound(&self) -> Option<usize> {
        self.min
    }

    pub fn max_bound(&self) -> Option<usize> {
        self.max
    }

    /// Whether absorbing `count` arguments respects the bounds.
    pub fn accepts(&self, count: usize) -> bool {
        self.min.is_none_or(|min| count >= min) && self.max.is_none_or(|max| count <= max)
    }

    fn validate(&self) -> Result<()> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(FakeProcessError::InvalidPattern(
                format!("min ({min}) cannot be greater than max ({max})"),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<usize>| b.map_or_else(|| "None".to_string(), |v| v.to_string());
        write!(f, "Any(min={}, max={})", bound(self.min), bound(self.max))
    }
}

/// Matches the final file-name component of an argument
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Program {
    name: String,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Match using the current platform's rule (`PATHEXT` is consulted on Windows).
    pub fn matches(&self, arg: &str) -> bool {
        if cfg!(windows) {
            self.matches_with_extensions(arg, &crate::env::pathext())
        } else {
            self.matches_with_extensions(arg, &[])
        }
    }

    /// Match `arg` by file name, also trying each executable extension
    /// (case-insensitive) in place of the program's own extension.
    pub fn matches_with_extensions(&self, arg: &str, extensions: &[String]) -> bool {
        let Some(file_name) = Path::new(arg).file_name().and_then(OsStr::to_str) else {
            return false;
        };
        if file_name == self.name {
            return true;
        }
        let file_name = file_name.to_lowercase();
        extensions.iter().any(|ext| {
            let candidate = Path::new(&self.name).with_extension(ext.trim_start_matches('.'));
            candidate
                .file_name()
                .and_then(OsStr::to_str)
                .is_some_and(|name| name.to_lowercase() == file_name)
        })
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Program({:?})", self.name)
    }
}

/// One element of a command pattern
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(String),
    Any(Any),
    Program(Program),
}

impl Token {
    /// Match a single (non-wildcard) token against one argument.
    fn matches_arg(&self, arg: &str) -> bool {
        match self {
            Token::Literal(lit) => lit == arg,
            Token::Program(program) => program.matches(arg),
            Token::Any(_) => true,
        }
    }

    fn is_any(&self) -> bool {
        matches!(self, Token::Any(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(lit) => f.write_str(lit),
            Token::Any(any) => any.fmt(f),
            Token::Program(program) => program.fmt(f),
        }
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::Literal(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::Literal(value)
    }
}

impl From<&String> for Token {
    fn from(value: &String) -> Self {
        Token::Literal(value.clone())
    }
}

impl From<&Path> for Token {
    fn from(value: &Path) -> Self {
        Token::Literal(value.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Token {
    fn from(value: PathBuf) -> Self {
        Token::from(value.as_path())
    }
}

impl From<Any> for Token {
    fn from(value: Any) -> Self {
        Token::Any(value)
    }
}

impl From<Program> for Token {
    fn from(value: Program) -> Self {
        Token::Program(value)
    }
}

/// A registered command pattern
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Command {
    tokens: Vec<Token>,
}

impl Command {
    /// Build a pattern, rejecting adjacent wildcards and inverted bounds.
    pub fn new<I, T>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        let tokens: Vec<Token> = tokens.into_iter().map(Into::into).collect();
        for token in &tokens {
            if let Token::Any(any) = token {
                any.validate()?;
            }
        }
        if tokens.windows(2).any(|pair| pair[0].is_any() && pair[1].is_any()) {
            return Err(FakeProcessError::InvalidPattern(
                "Cannot use `Any()` one after another.".to_string(),
            ));
        }
        Ok(Self { tokens })
    }

    /// A literal pattern from a command line split on whitespace.
    pub fn literal(line: &str) -> Self {
        Self {
            tokens: line.split_whitespace().map(Token::from).collect(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether the pattern contains only literal tokens.
    pub fn is_literal(&self) -> bool {
        self.tokens.iter().all(|t| matches!(t, Token::Literal(_)))
    }

    /// Structural match against an invocation's arguments.
    pub fn matches<S: AsRef<str>>(&self, args: &[S]) -> bool {
        let mut rest: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Any(any) => match self.tokens.get(i + 1) {
                    None => return any.accepts(rest.len()),
                    Some(next) => {
                        let Some(idx) = rest.iter().position(|arg| next.matches_arg(arg)) else {
                            return false;
                        };
                        if !any.accepts(idx) {
                            return false;
                        }
                        rest.drain(..idx);
                    }
                },
                _ => match rest.first() {
                    Some(arg) if token.matches_arg(arg) => {
                        rest.remove(0);
                    }
                    _ => return false,
                },
            }
        }

        rest.is_empty()
    }

    /// Match against an [`Invocation`].
    pub fn matches_invocation(&self, invocation: &Invocation) -> bool {
        self.matches(invocation.args())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            token.fmt(f)?;
        }
        Ok(())
    }
}

impl PartialEq<Invocation> for Command {
    fn eq(&self, other: &Invocation) -> bool {
        self.matches_invocation(other)
    }
}

impl PartialEq<Command> for Invocation {
    fn eq(&self, other: &Command) -> bool {
        other.matches_invocation(self)
    }
}

/// Build a [`Command`] from mixed tokens: `command!["cp", Any::new().min(2)]`.
#[macro_export]
macro_rules! command {
    ($($token:expr),* $(,)?) => {
        $crate::Command::new(::std::vec::Vec::<$crate::Token>::from([$($crate::Token::from($token)),*]))
    };
}

/// Conversion accepted by registration and lookup methods.
pub trait IntoCommand {
    fn into_command(self) -> Result<Command>;
}

impl IntoCommand for Command {
    fn into_command(self) -> Result<Command> {
        Ok(self)
    }
}

impl IntoCommand for &Command {
    fn into_command(self) -> Result<Command> {
        Ok(self.clone())
    }
}

impl IntoCommand for &str {
    fn into_command(self) -> Result<Command> {
        Ok(Command::literal(self))
    }
}

impl IntoCommand for String {
    fn into_command(self) -> Result<Command> {
        Ok(Command::literal(&self))
    }
}

impl<T: Into<Token>> IntoCommand for Vec<T> {
    fn into_command(self) -> Result<Command> {
        Command::new(self)
    }
}

impl<T: Into<Token>, const N: usize> IntoCommand for [T; N] {
    fn into_command(self) -> Result<Command> {
        Command::new(self)
    }
}

impl<T: Into<Token> + Clone> IntoCommand for &[T] {
    fn into_command(self) -> Result<Command> {
        Command::new(self.iter().cloned())
    }
}

impl<T: Into<Token> + Clone, const N: usize> IntoCommand for &[T; N] {
    fn into_command(self) -> Result<Command> {
        Command::new(self.iter().cloned())
    }
}

impl<T: IntoCommand> IntoCommand for Result<T> {
    fn into_command(self) -> Result<Command> {
        self?.into_command()
    }
}

/// A concrete launch request: program plus arguments
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Invocation {
    args: Vec<String>,
    shell: Option<String>,
}

impl Invocation {
    /// Exec form: program and arguments as separate values.
    pub fn exec<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self {
            args: args
                .into_iter()
                .map(|a| a.as_ref().to_string_lossy().into_owned())
                .collect(),
            shell: None,
        }
    }

    /// Shell form: one command line, tokenized on whitespace for matching.
    pub fn shell(line: impl Into<String>) -> Self {
        let line = line.into();
        Self {
            args: line.split_whitespace().map(String::from).collect(),
            shell: Some(line),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// The original command line for shell-form invocations.
    pub fn shell_line(&self) -> Option<&str> {
        self.shell.as_deref()
    }

    pub fn is_shell(&self) -> bool {
        self.shell.is_some()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shell {
            Some(line) => f.write_str(line),
            None => f.write_str(&self.args.join(" ")),
        }
    }
}

impl From<&str> for Invocation {
    fn from(value: &str) -> Self {
        Invocation::shell(value)
    }
}

impl From<String> for Invocation {
    fn from(value: String) -> Self {
        Invocation::shell(value)
    }
}

impl<S: AsRef<OsStr>> From<Vec<S>> for Invocation {
    fn from(value: Vec<S>) -> Self {
        Invocation::exec(value)
    }
}

impl<S: AsRef<OsStr>, const N: usize> From<[S; N]> for Invocation {
    fn from(value: [S; N]) -> Self {
        Invocation::exec(value)
    }
}

impl<S: AsRef<OsStr>> From<&[S]> for Invocation {
    fn from(value: &[S]) -> Self {
        Invocation::exec(value)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
