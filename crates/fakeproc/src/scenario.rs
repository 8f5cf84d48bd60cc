// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative process registrations loaded from TOML or JSON files.
//!
//! ```toml
//! name = "git workflow"
//! keep_last_process = true
//!
//! [[processes]]
//! command = "git branch"
//! stdout = ["* main", "  dev"]
//!
//! [[processes]]
//! command = ["cp", { any = { min = 2 } }]
//! exit_code = 1
//! stderr = "cp: permission denied"
//! ```

use crate::command::{Any, Command, Program, Token};
use crate::definition::{OutputSpec, ProcessDefinition};
use crate::error::FakeProcessError;
use crate::recorder::ProcessRecorder;
use crate::registry::FakeProcess;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading or applying a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid process definition: {0}")]
    Definition(#[from] FakeProcessError),
}

fn default_occurrences() -> usize {
    1
}

/// Top-level scenario file
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Name for logging/debugging
    #[serde(default)]
    pub name: String,

    /// Overrides the scope's toggle when set
    #[serde(default)]
    pub allow_unregistered: Option<bool>,

    /// Overrides the scope's toggle when set
    #[serde(default)]
    pub keep_last_process: Option<bool>,

    /// Registrations, applied in order
    #[serde(default)]
    pub processes: Vec<ProcessSpec>,
}

/// One registration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessSpec {
    pub command: CommandSpec,

    #[serde(default)]
    pub stdout: Option<OutputText>,

    #[serde(default)]
    pub stderr: Option<OutputText>,

    #[serde(default)]
    pub exit_code: i32,

    /// Finish after this many milliseconds
    #[serde(default)]
    pub delay_ms: Option<u64>,

    #[serde(default = "default_occurrences")]
    pub occurrences: usize,

    /// Forward to the real launcher instead of simulating
    #[serde(default)]
    pub pass_through: bool,
}

/// Command pattern as written in a scenario
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandSpec {
    /// Whitespace-separated literal command line
    Line(String),
    /// Token list
    Tokens(Vec<TokenSpec>),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TokenSpec {
    Literal(String),
    Any { any: AnySpec },
    Program { program: String },
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnySpec {
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

/// Stream content: a single string or a list of lines
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OutputText {
    Text(String),
    Lines(Vec<String>),
}

impl From<&OutputText> for OutputSpec {
    fn from(value: &OutputText) -> Self {
        match value {
            OutputText::Text(text) => OutputSpec::Text(text.clone()),
            OutputText::Lines(lines) => OutputSpec::lines(lines),
        }
    }
}

impl CommandSpec {
    fn compile(&self) -> Result<Command, FakeProcessError> {
        match self {
            Self::Line(line) => Ok(Command::literal(line)),
            Self::Tokens(tokens) => Command::new(tokens.iter().map(TokenSpec::to_token)),
        }
    }
}

impl TokenSpec {
    fn to_token(&self) -> Token {
        match self {
            Self::Literal(text) => Token::from(text.as_str()),
            Self::Any { any } => {
                let mut wildcard = Any::new();
                if let Some(min) = any.min {
                    wildcard = wildcard.min(min);
                }
                if let Some(max) = any.max {
                    wildcard = wildcard.max(max);
                }
                Token::Any(wildcard)
            }
            Self::Program { program } => Token::Program(Program::new(program.as_str())),
        }
    }
}

/// Compiled scenario ready to apply to a scope
#[derive(Clone, Debug)]
pub struct Scenario {
    config: ScenarioConfig,
    commands: Vec<Command>,
}

impl Scenario {
    /// Load a scenario from a TOML or JSON file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        let config: ScenarioConfig = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Self::from_config(config)
    }

    /// Validate a config and compile its command patterns
    pub fn from_config(config: ScenarioConfig) -> Result<Self, ScenarioError> {
        let mut commands = Vec::with_capacity(config.processes.len());
        for (idx, process) in config.processes.iter().enumerate() {
            let command = process.command.compile()?;
            if command.tokens().is_empty() {
                return Err(ScenarioError::Validation(format!(
                    "processes[{idx}]: command must not be empty"
                )));
            }
            if process.occurrences == 0 {
                return Err(ScenarioError::Validation(format!(
                    "processes[{idx}] ({command}): occurrences must be at least 1"
                )));
            }
            if process.pass_through
                && (process.stdout.is_some() || process.stderr.is_some() || process.delay_ms.is_some())
            {
                return Err(ScenarioError::Validation(format!(
                    "processes[{idx}] ({command}): pass_through entries cannot define output or delay"
                )));
            }
            commands.push(command);
        }
        Ok(Self { config, commands })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Register every entry on `scope`.
    ///
    /// Returns one recorder per simulated entry, in file order.
    pub fn apply(&self, scope: &FakeProcess) -> Result<Vec<ProcessRecorder>, ScenarioError> {
        if let Some(allow) = self.config.allow_unregistered {
            scope.allow_unregistered(allow);
        }
        if let Some(keep) = self.config.keep_last_process {
            scope.keep_last_process(keep);
        }

        let mut recorders = Vec::new();
        for (process, command) in self.config.processes.iter().zip(&self.commands) {
            if process.pass_through {
                scope.pass_through(command, process.occurrences)?;
                continue;
            }
            let mut definition = ProcessDefinition::new()
                .exit_code(process.exit_code)
                .occurrences(process.occurrences);
            if let Some(stdout) = &process.stdout {
                definition = definition.stdout(OutputSpec::from(stdout));
            }
            if let Some(stderr) = &process.stderr {
                definition = definition.stderr(OutputSpec::from(stderr));
            }
            if let Some(delay) = process.delay_ms {
                definition = definition.delay(Duration::from_millis(delay));
            }
            recorders.push(scope.register(command, definition)?);
        }
        tracing::debug!(
            scenario = %self.config.name,
            registered = self.config.processes.len(),
            "scenario applied"
        );
        Ok(recorders)
    }
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod tests;
