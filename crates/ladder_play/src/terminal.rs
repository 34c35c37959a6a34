//! Line-oriented terminal front end.
//!
//! Reads commands from any async line source and writes plain text, so the
//! same loop serves stdin and tests. The opponent's reply is a timer raced
//! against input: the human may reset while the opponent is thinking, and
//! the abandoned reply is discarded when it fires.

use crate::driver::Driver;
use anyhow::Result;
use derive_more::Display;
use ladder_engine::{
    GameSession, HUMAN, Level, MoveError, MoveTarget, NextTarget, OPPONENT, PendingMove,
    RecordKind, SUB_BOARDS, TurnReport, TurnStatus,
};
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Sleep, sleep};
use tracing::{debug, info, instrument, warn};

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Play at a cell.
    Move(MoveTarget),
    /// Restart the current level.
    Reset,
    /// Show the counters.
    Records,
    /// Redraw the board.
    Show,
    /// List commands.
    Help,
    /// Leave.
    Quit,
}

/// Why a line could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum InputError {
    /// Flat board cell outside 1..=cells.
    #[display("Enter a cell number from 1 to {}", _0)]
    BadCell(usize),

    /// Composite level needs two numbers.
    #[display("Enter a board and a cell, each 1 to 9, e.g. \"5 3\"")]
    NeedBoardAndCell,

    /// Anything else.
    #[display("Unknown command: {} (try \"help\")", _0)]
    Unknown(String),
}

const HELP: &str = "\
Commands:
  N        play cell N (numbers shown on the board)
  B C      composite level: play cell C of board B
  reset    restart this level (counts as a failure mid-game)
  records  show win/fail counters
  show     redraw the board
  quit     leave";

/// Parses one input line.
///
/// `cells` is the number of cells on a flat board; on the composite level
/// moves take two 1-based numbers.
pub fn parse_command(line: &str, composite: bool, cells: usize) -> Result<Command, InputError> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" | "show" => return Ok(Command::Show),
        "reset" | "r" => return Ok(Command::Reset),
        "records" => return Ok(Command::Records),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "q" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let numbers: Vec<usize> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| InputError::Unknown(line.to_string()))?;

    if composite {
        match numbers.as_slice() {
            &[board, cell] if (1..=SUB_BOARDS).contains(&board) && (1..=9).contains(&cell) => {
                Ok(Command::Move(MoveTarget::Nested {
                    board: board - 1,
                    cell: cell - 1,
                }))
            }
            _ => Err(InputError::NeedBoardAndCell),
        }
    } else {
        match numbers.as_slice() {
            &[cell] if (1..=cells).contains(&cell) => Ok(Command::Move(MoveTarget::Flat(cell - 1))),
            _ => Err(InputError::BadCell(cells)),
        }
    }
}

/// Level banner and board.
pub fn render(driver: &Driver) -> String {
    let ladder = driver.ladder();
    let level = ladder.level();
    let mut text = format!(
        "\nLevel {} of {}: {}\n{}\n\n{}\n",
        level.number(),
        Level::ALL.len(),
        level,
        level.description(),
        ladder.session().display()
    );
    if let Some(hint) = fading(ladder.session()) {
        text.push_str(&hint);
    }
    if let Some(sb) = ladder.session().super_board()
        && ladder.accepts_input()
    {
        match sb.next_target() {
            NextTarget::Board(b) if !sb.is_closed(b) => {
                text.push_str(&format!("Play in board {}.\n", b + 1));
            }
            _ => text.push_str("Play in any open board.\n"),
        }
    }
    text
}

/// Marks that the next move of their owner will erase.
fn fading(session: &GameSession) -> Option<String> {
    if !session.is_active() {
        return None;
    }
    let history = session.history();
    let cells: Vec<String> = [HUMAN, OPPONENT]
        .into_iter()
        .filter_map(|p| history.next_eviction(p).map(|i| format!("{} at cell {}", p, i + 1)))
        .collect();
    (!cells.is_empty()).then(|| format!("Fading next: {}.\n", cells.join(", ")))
}

/// One-line summary of a report.
pub fn describe(report: &TurnReport) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{} plays {}.", report.mover, position(report.target)));

    let extra = report.changes.len().saturating_sub(1);
    if extra > 0 {
        lines.push(format!("{} more cell(s) changed.", extra));
    }
    if report.rotation.is_some() {
        lines.push("The board rotates a quarter turn.".to_string());
    }
    if let Some(b) = report.super_update.and_then(|u| u.decided) {
        lines.push(format!("{} takes board {}.", report.mover, b + 1));
    }
    match report.status {
        TurnStatus::None => {}
        TurnStatus::HumanWin => lines.push("You win this level!".to_string()),
        TurnStatus::OpponentWin => {
            lines.push("The computer wins. Type \"reset\" to try again.".to_string())
        }
        TurnStatus::Draw => lines.push("Draw. Type \"reset\" to try again.".to_string()),
    }
    if let Some(record) = report.record
        && record.kind == RecordKind::Win
        && report.advanced_to.is_none()
    {
        lines.push("Every level cleared!".to_string());
    }
    if let Some(next) = report.advanced_to {
        lines.push(format!("Advancing to level {}: {}.", next.number(), next));
    }
    lines.join("\n")
}

fn position(target: MoveTarget) -> String {
    match target {
        MoveTarget::Flat(i) => format!("cell {}", i + 1),
        MoveTarget::Nested { board, cell } => format!("board {} cell {}", board + 1, cell + 1),
    }
}

/// A rejection in the board numbering the player sees.
pub fn explain(error: &MoveError) -> String {
    match *error {
        MoveError::OutOfBounds(t) => format!("There is no {}.", position(t)),
        MoveError::CellOccupied(t) => format!("{} is taken.", position(t)),
        MoveError::OwnMark(t) => format!("{} is already yours.", position(t)),
        MoveError::NeutralCell(t) => format!("{} is neutral and can't be played.", position(t)),
        MoveError::ColumnFull(col) => format!("Column {} is full.", col + 1),
        MoveError::WrongBoard { required } => format!("You must play in board {}.", required + 1),
        MoveError::BoardClosed(b) => format!("Board {} is already closed.", b + 1),
        MoveError::WrongPlayer(_) => "Wait for the computer to move.".to_string(),
        ref other => format!("{}.", other),
    }
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

async fn until_due(timer: &mut Option<(PendingMove, Pin<Box<Sleep>>)>) {
    match timer {
        Some((_, delay)) => delay.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Shows a report, waits out its settle pauses and redraws.
async fn show_report<W: AsyncWrite + Unpin>(
    driver: &Driver,
    report: &TurnReport,
    output: &mut W,
) -> Result<()> {
    say(output, &describe(report)).await?;
    driver.settle(report).await;
    say(output, &render(driver)).await
}

/// Runs the interactive loop until `quit` or end of input.
#[instrument(skip_all)]
pub async fn run<R, W>(driver: &mut Driver, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Terminal session started");
    let mut lines = input.lines();
    let mut timer: Option<(PendingMove, Pin<Box<Sleep>>)> = None;

    say(output, "Tic-tac-toe ladder. You are X. Type \"help\" for commands.").await?;
    say(output, &render(driver)).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("End of input");
                    break;
                };
                let ladder = driver.ladder();
                let composite = ladder.session().super_board().is_some();
                let cells = ladder.session().board().map_or(0, |b| b.len());
                match parse_command(&line, composite, cells) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Move(target)) => match driver.human(target).await {
                        Ok(report) => {
                            if let Some(pending) = report.pending {
                                say(output, &describe(&report)).await?;
                                driver.settle(&report).await;
                                let delay = driver.delay_for(pending);
                                timer = Some((pending, Box::pin(sleep(delay))));
                                say(output, &render(driver)).await?;
                                say(output, "Computer is thinking...").await?;
                            } else {
                                show_report(driver, &report, output).await?;
                            }
                        }
                        Err(e) => say(output, &explain(&e)).await?,
                    },
                    Ok(Command::Reset) => {
                        let record = driver.reset().await;
                        if record.is_some() {
                            say(output, "Level abandoned, counted as a failure.").await?;
                        }
                        say(output, &render(driver)).await?;
                    }
                    Ok(Command::Records) => {
                        let table = driver.refresh_records().await.table();
                        if !driver.records().is_available() {
                            say(output, "(counter service unreachable, showing last known counts)")
                                .await?;
                        }
                        say(output, &table).await?;
                    }
                    Ok(Command::Show) => say(output, &render(driver)).await?,
                    Ok(Command::Help) => say(output, HELP).await?,
                    Err(e) => say(output, &e.to_string()).await?,
                }
            }
            () = until_due(&mut timer), if timer.is_some() => {
                let Some((pending, _)) = timer.take() else {
                    continue;
                };
                match driver.fire(pending).await {
                    Ok(report) => show_report(driver, &report, output).await?,
                    Err(MoveError::StaleSession) => {
                        debug!("Discarded opponent move from an old game")
                    }
                    Err(e) => warn!(error = %e, "Opponent move failed"),
                }
            }
        }
    }

    say(output, "Bye.").await?;
    info!("Terminal session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_moves_are_one_based() {
        assert_eq!(parse_command("1", false, 9), Ok(Command::Move(MoveTarget::Flat(0))));
        assert_eq!(parse_command(" 16 ", false, 16), Ok(Command::Move(MoveTarget::Flat(15))));
        assert_eq!(parse_command("0", false, 9), Err(InputError::BadCell(9)));
        assert_eq!(parse_command("10", false, 9), Err(InputError::BadCell(9)));
    }

    #[test]
    fn test_parse_composite_moves() {
        assert_eq!(
            parse_command("5 3", true, 0),
            Ok(Command::Move(MoveTarget::Nested { board: 4, cell: 2 }))
        );
        assert_eq!(
            parse_command("9,9", true, 0),
            Ok(Command::Move(MoveTarget::Nested { board: 8, cell: 8 }))
        );
        assert_eq!(parse_command("5", true, 0), Err(InputError::NeedBoardAndCell));
    }

    #[test]
    fn test_explain_uses_one_based_numbers() {
        assert_eq!(
            explain(&MoveError::WrongBoard { required: 2 }),
            "You must play in board 3."
        );
        assert_eq!(
            explain(&MoveError::CellOccupied(MoveTarget::Flat(0))),
            "cell 1 is taken."
        );
        assert_eq!(explain(&MoveError::GameOver), "Game is already over.");
    }

    #[test]
    fn test_parse_words() {
        assert_eq!(parse_command("RESET", false, 9), Ok(Command::Reset));
        assert_eq!(parse_command("", false, 9), Ok(Command::Show));
        assert_eq!(parse_command("q", true, 0), Ok(Command::Quit));
        assert!(matches!(parse_command("jump", false, 9), Err(InputError::Unknown(_))));
    }
}
