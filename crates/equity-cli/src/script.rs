//! Line-oriented action scripts driven through an [`EquitySession`].

use equity_client::{Completion, EquitySession, ProbabilityResult, Trigger};
use equity_core::game::snapshot::GameSnapshot;
use equity_core::model::card::Card;
use equity_core::model::slots::{PlacementError, PositionGroup};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Select(Card),
    Place { group: PositionGroup, index: usize },
    Reset,
    Wait,
    Show,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| "empty action".to_string())?;
        let action = match verb.to_ascii_lowercase().as_str() {
            "select" => {
                let id = words.next().ok_or("select needs a card id")?;
                Action::Select(Card::new(id))
            }
            "place" => {
                let group = words.next().ok_or("place needs a group and an index")?;
                let group = group
                    .parse::<PositionGroup>()
                    .map_err(|err| err.to_string())?;
                let index = words.next().ok_or("place needs a slot index")?;
                let index = index
                    .parse::<usize>()
                    .map_err(|_| format!("slot index '{index}' is not a number"))?;
                Action::Place { group, index }
            }
            "reset" => Action::Reset,
            "wait" => Action::Wait,
            "show" => Action::Show,
            other => return Err(format!("unknown action '{other}'")),
        };
        if let Some(extra) = words.next() {
            return Err(format!("unexpected argument '{extra}'"));
        }
        Ok(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub action: Action,
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: {source}")]
    Placement {
        line: usize,
        #[source]
        source: PlacementError,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Parses script text. Blank lines and `#` comments are skipped; line numbers
/// start at `first_line`.
pub fn parse_script(text: &str, first_line: usize) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut lines = Vec::new();
    for (offset, raw) in text.lines().enumerate() {
        let line = first_line + offset;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let action = content
            .parse::<Action>()
            .map_err(|message| ScriptError::Parse { line, message })?;
        lines.push(ScriptLine { line, action });
    }
    Ok(lines)
}

pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<ScriptLine>, ScriptError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ScriptError::Read {
        source,
        path: path.to_path_buf(),
    })?;
    parse_script(&text, 1)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub actions_applied: usize,
    pub requests_dispatched: u64,
    pub stale_discarded: usize,
    pub failures: Vec<String>,
    pub state: GameSnapshot,
    pub result: ProbabilityResult,
}

/// Applies every action in order, then waits for outstanding requests.
pub async fn run_script(
    session: &mut EquitySession,
    lines: &[ScriptLine],
    out: &mut impl Write,
) -> Result<RunSummary, ScriptError> {
    let mut completions = Vec::new();
    // Requests that never left the client only show up as rejected triggers.
    let mut rejections = Vec::new();
    session.take_last_trigger();
    for ScriptLine { line, action } in lines {
        event!(
            target: "equity_cli::script",
            Level::DEBUG,
            line,
            action = ?action,
            "applying action"
        );
        match action {
            Action::Select(card) => {
                session.select_card(card.clone());
            }
            Action::Place { group, index } => {
                session
                    .place_card(*group, *index)
                    .map_err(|source| ScriptError::Placement {
                        line: *line,
                        source,
                    })?;
            }
            Action::Reset => session.reset_game(),
            Action::Wait => completions.extend(session.settle().await),
            Action::Show => {
                writeln!(out, "{}", report(session))?;
            }
        }
        if let Some(Trigger::Rejected(failure)) = session.take_last_trigger() {
            rejections.push(format!("line {line}: {failure}"));
        }
        completions.extend(session.pump());
    }
    completions.extend(session.settle().await);

    let mut failures = rejections;
    failures.extend(completions.iter().filter_map(|completion| match completion {
        Completion::Failed(err) => Some(err.to_string()),
        _ => None,
    }));

    Ok(RunSummary {
        actions_applied: lines.len(),
        requests_dispatched: session.requests_dispatched(),
        stale_discarded: completions
            .iter()
            .filter(|completion| matches!(completion, Completion::Stale))
            .count(),
        failures,
        state: GameSnapshot::capture(session.state()),
        result: *session.published(),
    })
}

pub fn report(session: &EquitySession) -> String {
    let snapshot = GameSnapshot::capture(session.state());
    format!("{}\n{}", snapshot.render(), render_result(session.published()))
}

pub fn render_result(result: &ProbabilityResult) -> String {
    if result.is_zero() {
        return "no estimate".to_string();
    }
    format!(
        "win {:.2}% lose {:.2}% tie {:.2}% ({} iterations)",
        result.win_probability, result.lose_probability, result.tie_probability, result.iterations
    )
}
