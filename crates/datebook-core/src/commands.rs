use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::datetime::ClockTime;
use crate::event::{EventDraft, EventKind};
use crate::grid::{MonthRef, months_between};
use crate::render::Renderer;
use crate::state::{Action, CalendarState, Outcome};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "show",
        "next",
        "prev",
        "goto",
        "select",
        "events",
        "add",
        "close",
        "legend",
        "export",
        "help",
        "version",
        "quit",
        "_commands",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(state, cfg, renderer, inv))]
pub fn dispatch(
    state: &mut CalendarState,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    debug!(command = %inv.command, args = ?inv.args, "dispatching command");

    match inv.command.as_str() {
        "show" => cmd_show(state, cfg, renderer),
        "next" => cmd_navigate(state, cfg, renderer, 1),
        "prev" => cmd_navigate(state, cfg, renderer, -1),
        "goto" => cmd_goto(state, cfg, renderer, &inv.args),
        "select" => cmd_select(state, renderer, &inv.args),
        "events" => cmd_events(state, renderer, &inv.args),
        "add" => cmd_add(state, cfg, renderer, &inv.args),
        "close" => cmd_close(state),
        "legend" => renderer.print_legend(),
        "export" => cmd_export(state),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "quit" => Ok(()),
        "_commands" => cmd_commands(),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Reads commands line by line from stdin until `quit` or EOF. Command
/// errors are reported and the session continues; only I/O failures end
/// it early.
#[instrument(skip(state, cfg, renderer))]
pub fn session(
    state: &mut CalendarState,
    cfg: &Config,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    info!("starting interactive session");
    renderer.print_month(state.month(), state.store(), cfg.today)?;

    let interactive = io::stdin().is_terminal();
    loop {
        if interactive {
            print!("datebook> ");
            io::stdout().flush()?;
        }

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            break;
        }
        let tokens: Vec<String> = line.split_whitespace().map(ToString::to_string).collect();
        if tokens.is_empty() {
            continue;
        }

        let inv = match Invocation::parse(tokens) {
            Ok(inv) => inv,
            Err(err) => {
                eprintln!("error: {err:#}");
                continue;
            }
        };

        if inv.command == "quit" {
            break;
        }
        if let Err(err) = dispatch(state, cfg, renderer, inv) {
            eprintln!("error: {err:#}");
        }
    }

    info!("session ended");
    Ok(())
}

#[instrument(skip(state, cfg, renderer))]
fn cmd_show(
    state: &mut CalendarState,
    cfg: &Config,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    info!("command show");
    renderer.print_month(state.month(), state.store(), cfg.today)
}

#[instrument(skip(state, cfg, renderer))]
fn cmd_navigate(
    state: &mut CalendarState,
    cfg: &Config,
    renderer: &mut Renderer,
    delta: i32,
) -> anyhow::Result<()> {
    info!(delta, "command next/prev");
    state.apply(Action::NavigateMonth(delta))?;
    renderer.print_month(state.month(), state.store(), cfg.today)
}

#[instrument(skip(state, cfg, renderer, args))]
fn cmd_goto(
    state: &mut CalendarState,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command goto");

    let target = args
        .first()
        .ok_or_else(|| anyhow!("goto requires a YYYY-MM argument"))
        .and_then(|token| MonthRef::parse(token))?;

    let delta = months_between(state.month(), target);
    state.apply(Action::NavigateMonth(delta))?;
    renderer.print_month(state.month(), state.store(), cfg.today)
}

#[instrument(skip(state, renderer, args))]
fn cmd_select(
    state: &mut CalendarState,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command select");

    let date = parse_date_arg(args, "select")?;
    if let Outcome::Selected(selection) = state.apply(Action::SelectDate(date))? {
        renderer.print_day(selection.date, &selection.events)?;
    }
    Ok(())
}

#[instrument(skip(state, renderer, args))]
fn cmd_events(
    state: &mut CalendarState,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command events");

    // With an explicit date this is a read-only lookup; without one it
    // shows the open selection.
    if !args.is_empty() {
        let date = parse_date_arg(args, "events")?;
        let events = state.store().events_for(date);
        return renderer.print_day(date, &events);
    }

    let selection = state
        .selection()
        .ok_or_else(|| anyhow!("no day selected; pass a date or run select first"))?;
    renderer.print_day(selection.date, &selection.events)
}

#[instrument(skip(state, cfg, renderer, args))]
fn cmd_add(
    state: &mut CalendarState,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command add");

    let draft = parse_draft_args(args, cfg.default_kind)?;
    match state.apply(Action::AddEvent(draft))? {
        Outcome::EventAdded(event) => {
            debug!(store_len = state.store().len(), "event appended");
            println!(
                "Created event {}.",
                event
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| event.uuid.to_string())
            );
            if let Some(selection) = state.selection() {
                renderer.print_day(selection.date, &selection.events)?;
            }
            Ok(())
        }
        Outcome::Rejected(errors) => {
            println!("Event not added:");
            if let Some(msg) = errors.title {
                println!("  title: {msg}");
            }
            if let Some(msg) = errors.start {
                println!("  start: {msg}");
            }
            if let Some(msg) = errors.end {
                println!("  end:   {msg}");
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[instrument(skip(state))]
fn cmd_close(state: &mut CalendarState) -> anyhow::Result<()> {
    info!("command close");
    state.apply(Action::CloseSelection)?;
    println!("Selection closed.");
    Ok(())
}

#[instrument(skip(state))]
fn cmd_export(state: &mut CalendarState) -> anyhow::Result<()> {
    info!("command export");
    let out = serde_json::to_string(state.store().events())?;
    println!("{out}");
    Ok(())
}

fn cmd_commands() -> anyhow::Result<()> {
    for command in known_command_names() {
        println!("{command}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "Implemented commands: show, next, prev, goto YYYY-MM, select YYYY-MM-DD, \
         events [YYYY-MM-DD], add <title> start:HH:MM end:HH:MM [type:<kind>], \
         close, legend, export, help, version, quit"
    );
    Ok(())
}

fn parse_date_arg(args: &[String], command: &str) -> anyhow::Result<NaiveDate> {
    let token = args
        .first()
        .ok_or_else(|| anyhow!("{command} requires a YYYY-MM-DD argument"))?;
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date: {token} (expected YYYY-MM-DD)"))
}

#[derive(Debug, Clone, Copy)]
enum DraftField {
    Start(ClockTime),
    End(ClockTime),
    Kind(EventKind),
}

/// Splits `start:`/`end:`/`type:` modifier tokens out of the argument
/// tail; everything else joins the title. A missing field stays unset and
/// surfaces as a validation error, not an argument error.
fn parse_draft_args(args: &[String], default_kind: EventKind) -> anyhow::Result<EventDraft> {
    let mut title_parts: Vec<String> = Vec::new();
    let mut start = None;
    let mut end = None;
    let mut kind = default_kind;

    let mut literal = false;
    for arg in args {
        if arg == "--" {
            literal = true;
            continue;
        }

        if !literal && let Some(field) = parse_one_field(arg)? {
            match field {
                DraftField::Start(time) => start = Some(time),
                DraftField::End(time) => end = Some(time),
                DraftField::Kind(parsed) => kind = parsed,
            }
            continue;
        }

        title_parts.push(arg.clone());
    }

    Ok(EventDraft {
        title: title_parts.join(" "),
        start,
        end,
        kind,
    })
}

fn parse_one_field(tok: &str) -> anyhow::Result<Option<DraftField>> {
    let Some((key, value)) = tok.split_once(':') else {
        return Ok(None);
    };

    match key.to_ascii_lowercase().as_str() {
        "start" => Ok(Some(DraftField::Start(ClockTime::parse(value)?))),
        "end" => Ok(Some(DraftField::End(ClockTime::parse(value)?))),
        "type" | "kind" => {
            let kind = EventKind::parse(value)
                .ok_or_else(|| anyhow!("unknown event type: {value}"))?;
            Ok(Some(DraftField::Kind(kind)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use crate::event::EventKind;

    use super::{expand_command_abbrev, known_command_names, parse_draft_args};

    #[test]
    fn unique_prefixes_expand() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("sel", &known), Some("select"));
        assert_eq!(expand_command_abbrev("n", &known), Some("next"));
        assert_eq!(expand_command_abbrev("q", &known), Some("quit"));
        assert_eq!(expand_command_abbrev("show", &known), Some("show"));
    }

    #[test]
    fn ambiguous_or_unknown_prefixes_do_not_expand() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("s", &known), None);
        assert_eq!(expand_command_abbrev("e", &known), None);
        assert_eq!(expand_command_abbrev("zzz", &known), None);
    }

    #[test]
    fn draft_args_split_modifiers_from_title() {
        let args: Vec<String> = ["Team", "sync", "start:10:00", "end:11:30", "type:review"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let draft = parse_draft_args(&args, EventKind::Meeting).expect("parse draft");

        assert_eq!(draft.title, "Team sync");
        assert_eq!(draft.start.map(|t| t.to_string()), Some("10:00".to_string()));
        assert_eq!(draft.end.map(|t| t.to_string()), Some("11:30".to_string()));
        assert_eq!(draft.kind, EventKind::Review);
    }

    #[test]
    fn unrecognized_colon_tokens_stay_in_the_title() {
        let args: Vec<String> = ["Lunch", "at", "12:30", "start:12:00", "end:13:00"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let draft = parse_draft_args(&args, EventKind::Break).expect("parse draft");

        assert_eq!(draft.title, "Lunch at 12:30");
        assert_eq!(draft.kind, EventKind::Break);
    }

    #[test]
    fn missing_times_stay_unset_for_validation() {
        let args: Vec<String> = vec!["Untimed".to_string()];
        let draft = parse_draft_args(&args, EventKind::Meeting).expect("parse draft");
        assert!(draft.start.is_none());
        assert!(draft.end.is_none());

        let errors = draft.validate();
        assert!(!errors.is_empty());
    }

    #[test]
    fn malformed_time_values_are_argument_errors() {
        let args: Vec<String> = vec!["Bad".to_string(), "start:25:00".to_string()];
        assert!(parse_draft_args(&args, EventKind::Meeting).is_err());
    }

    #[test]
    fn literal_marker_disables_modifier_parsing() {
        let args: Vec<String> = ["--", "start:10:00"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let draft = parse_draft_args(&args, EventKind::Meeting).expect("parse draft");
        assert_eq!(draft.title, "start:10:00");
        assert!(draft.start.is_none());
    }
}
