//! Line-command front end: parses one command per line, runs it against the
//! controller, and prints the resulting page.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::api::types::InputSlot;
use crate::error::AppError;
use crate::render::render;
use crate::wizard::{DraftEdit, Page, WizardController};

const HELP: &str = "\
Commands:
  show                     redraw the current page
  tables                   reload the available tables
  describe <text>          set the scenario description
  table <1-3> <name>       select the table for an input slot
  comment <1-3> <text>     set the comment for an input slot
  param <1-2> <value>      set Time Window (1) or Forecast Horizon (2)
  keep <yes|no>            keep input tables for this run
  submit                   submit the scenario and trigger its job
  runs                     list historical runs
  details <scenario_id>    show one scenario with its table summaries
  back                     leave the current page
  new                      start a new run (clears the form)
  quit                     exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Show,
    Tables,
    Edit(DraftEdit),
    Submit,
    Runs,
    Details(String),
    Back,
    New,
    Quit,
}

fn usage(msg: &str) -> AppError {
    AppError::Validation(format!("{msg} (type `help` for commands)"))
}

fn parse_slot(arg: Option<&str>) -> Result<InputSlot, AppError> {
    arg.and_then(|a| a.parse::<usize>().ok())
        .and_then(InputSlot::from_number)
        .ok_or_else(|| usage("expected an input slot 1, 2 or 3"))
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, AppError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let cmd = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "show" => Command::Show,
        "tables" => Command::Tables,
        "describe" => Command::Edit(DraftEdit::Description(rest.to_string())),
        "table" | "comment" => {
            let (slot, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let slot = parse_slot(Some(slot))?;
            let value = value.trim().to_string();
            if word.eq_ignore_ascii_case("table") {
                if value.is_empty() {
                    return Err(usage("expected a table name"));
                }
                Command::Edit(DraftEdit::Table(slot, value))
            } else {
                Command::Edit(DraftEdit::Comment(slot, value))
            }
        }
        "param" => {
            let (which, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let value = value.trim().to_string();
            match which {
                "1" => Command::Edit(DraftEdit::Param1(value)),
                "2" => Command::Edit(DraftEdit::Param2(value)),
                _ => return Err(usage("expected parameter 1 or 2")),
            }
        }
        "keep" => match rest.to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "on" => Command::Edit(DraftEdit::KeepInputs(true)),
            "no" | "n" | "false" | "off" => Command::Edit(DraftEdit::KeepInputs(false)),
            _ => return Err(usage("expected keep yes or keep no")),
        },
        "submit" => Command::Submit,
        "runs" => Command::Runs,
        "details" => {
            if rest.is_empty() {
                return Err(usage("expected a scenario id"));
            }
            Command::Details(rest.to_string())
        }
        "back" => Command::Back,
        "new" => Command::New,
        "quit" | "exit" => Command::Quit,
        other => return Err(usage(&format!("unknown command \"{other}\""))),
    };
    Ok(Some(cmd))
}

/// Run one command and print the page it leaves the wizard on.
pub async fn execute(
    controller: &mut WizardController,
    cmd: Command,
    out: &mut impl Write,
) -> Result<(), AppError> {
    // Fold in summaries that settled while the user was typing.
    controller.poll_summaries();

    match cmd {
        Command::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(());
        }
        Command::Quit | Command::Show => {}
        Command::Tables => controller.mount().await,
        Command::Edit(edit) => controller.edit(edit)?,
        Command::Submit => controller.submit().await?,
        Command::Runs => controller.view_runs().await,
        Command::Details(id) => controller.view_details(&id).await,
        Command::Back => {
            if matches!(controller.state().page, Page::ScenarioDetails { .. }) {
                controller.back_to_runs().await;
            } else {
                controller.back();
            }
        }
        Command::New => controller.new_run().await,
    }
    write!(out, "{}", render(controller.state()))?;
    Ok(())
}

/// Print a failed command and log it as a `{error, kind}` record.
fn report(e: &AppError, out: &mut impl Write) -> std::io::Result<()> {
    let record = serde_json::to_value(e).unwrap_or(serde_json::Value::Null);
    tracing::warn!(error = %record, "Command failed");
    writeln!(out, "! {e}")
}

enum Next {
    Line(Option<String>),
    SummariesSettled,
}

/// Read commands until EOF or `quit`. Command errors are printed, not returned.
///
/// While a details view is fetching summaries, the page is redrawn as soon as
/// they settle; a command typed first still runs right away.
pub async fn run<R>(
    controller: &mut WizardController,
    input: R,
    out: &mut impl Write,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
{
    write!(out, "{}", render(controller.state()))?;
    let mut lines = input.lines();
    loop {
        let next = if controller.has_pending_summaries() {
            tokio::select! {
                line = lines.next_line() => Next::Line(line?),
                () = controller.await_summaries() => Next::SummariesSettled,
            }
        } else {
            Next::Line(lines.next_line().await?)
        };

        let line = match next {
            Next::SummariesSettled => {
                write!(out, "{}", render(controller.state()))?;
                out.flush()?;
                continue;
            }
            Next::Line(None) => break,
            Next::Line(Some(line)) => line,
        };

        let outcome = match parse_command(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => execute(controller, cmd, out).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            report(&e, out)?;
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_table_command() {
        assert_eq!(
            parse_command("table 2 weather_2024").unwrap(),
            Some(Command::Edit(DraftEdit::Table(InputSlot::Input2, "weather_2024".into())))
        );
        assert!(parse_command("table 4 x").is_err());
        assert!(parse_command("table 1").is_err());
    }

    #[test]
    fn test_comment_may_be_empty() {
        assert_eq!(
            parse_command("comment 3").unwrap(),
            Some(Command::Edit(DraftEdit::Comment(InputSlot::Input3, String::new())))
        );
    }

    #[test]
    fn test_describe_keeps_spacing() {
        assert_eq!(
            parse_command("describe summer peak  test").unwrap(),
            Some(Command::Edit(DraftEdit::Description("summer peak  test".into())))
        );
    }

    #[test]
    fn test_params_and_keep() {
        assert_eq!(
            parse_command("param 1 24").unwrap(),
            Some(Command::Edit(DraftEdit::Param1("24".into())))
        );
        assert_eq!(
            parse_command("KEEP no").unwrap(),
            Some(Command::Edit(DraftEdit::KeepInputs(false)))
        );
        assert!(parse_command("param 3 1").is_err());
        assert!(parse_command("keep maybe").is_err());
    }

    #[test]
    fn test_details_needs_id() {
        assert!(parse_command("details").is_err());
        assert_eq!(
            parse_command("details 1b2c").unwrap(),
            Some(Command::Details("1b2c".into()))
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_command("launch").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }
}
