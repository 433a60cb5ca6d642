//! Line-oriented terminal front end for the admin controller

use sql_admin::client::{AdminApi, AdminController, FormSession, StatusTone, ViewState};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::CliError;

const PROMPT: &[u8] = b"sql-admin> ";

const HELP: &str = "\
commands:
  tables | refresh      re-read the table list
  open <table>          show a table
  reload                refetch the current table
  console               switch to the query console
  query <sql>           run a SELECT in the console
  new                   open an insert form
  edit <n>              open an edit form for row n (1-based)
  set <column> [value]  set a form field; no value means NULL
  form                  show the open form
  save                  send the open form
  cancel                discard the open form
  show                  redraw the current view
  help                  this text
  quit                  leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Refresh,
    Open(String),
    Reload,
    Console,
    Query(String),
    New,
    Edit(usize),
    Set { column: String, value: String },
    Form,
    Save,
    Cancel,
    Show,
    Help,
    Quit,
}

/// Parse one input line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim_start();
    if line.trim_end().is_empty() {
        return Ok(None);
    }

    // `raw` is everything after the first separator, exactly as typed
    let (word, raw) = match line.split_once(char::is_whitespace) {
        Some((word, raw)) => (word, raw),
        None => (line, ""),
    };
    let rest = raw.trim();

    let command = match word.to_lowercase().as_str() {
        "tables" | "refresh" => ShellCommand::Refresh,
        "open" if !rest.is_empty() => ShellCommand::Open(rest.to_string()),
        "open" => return Err("usage: open <table>".to_string()),
        "reload" => ShellCommand::Reload,
        "console" => ShellCommand::Console,
        "query" if !rest.is_empty() => ShellCommand::Query(raw.to_string()),
        "query" => return Err("usage: query <sql>".to_string()),
        "new" => ShellCommand::New,
        "edit" => match rest.parse::<usize>() {
            Ok(number) if number > 0 => ShellCommand::Edit(number - 1),
            _ => return Err("usage: edit <row number>".to_string()),
        },
        "set" => match rest.split_once(char::is_whitespace) {
            Some((column, value)) => ShellCommand::Set {
                column: column.to_string(),
                value: value.trim_start().to_string(),
            },
            None if !rest.is_empty() => ShellCommand::Set {
                column: rest.to_string(),
                value: String::new(),
            },
            None => return Err("usage: set <column> [value]".to_string()),
        },
        "form" => ShellCommand::Form,
        "save" => ShellCommand::Save,
        "cancel" => ShellCommand::Cancel,
        "show" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command: {} (try help)", other)),
    };
    Ok(Some(command))
}

/// Run the controller until `quit` or end of input
pub async fn run<A: AdminApi>(mut controller: AdminController<A>, ansi: bool) -> Result<(), CliError> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    controller.start().await;
    stdout.write_all(view_text(&controller, ansi).as_bytes()).await?;

    loop {
        stdout.write_all(PROMPT).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let output = match parse(&line) {
            Ok(None) => continue,
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => execute(&mut controller, command, ansi).await,
            Err(message) => format!("{}\n", message),
        };
        stdout.write_all(output.as_bytes()).await?;
    }

    stdout.flush().await?;
    Ok(())
}

async fn execute<A: AdminApi>(
    controller: &mut AdminController<A>,
    command: ShellCommand,
    ansi: bool,
) -> String {
    tracing::debug!(?command, "shell command");

    match command {
        ShellCommand::Refresh => controller.refresh_tabs().await,
        ShellCommand::Open(table) => controller.select_table(&table).await,
        ShellCommand::Reload => controller.reload().await,
        ShellCommand::Console => controller.select_console(),
        ShellCommand::Query(sql) => controller.run_query(&sql).await,
        ShellCommand::New => controller.open_insert(),
        ShellCommand::Edit(row) => controller.open_edit(row),
        ShellCommand::Set { column, value } => controller.set_field(&column, &value),
        ShellCommand::Save => controller.save().await,
        ShellCommand::Cancel => controller.cancel_form(),
        ShellCommand::Help => return HELP.to_string(),
        ShellCommand::Form => {
            return match controller.form() {
                Some(session) => format!("{}{}", form_text(session), status_text(controller)),
                None => status_text(controller),
            }
        }
        ShellCommand::Show | ShellCommand::Quit => {}
    }

    match controller.form() {
        Some(session) => format!("{}{}", form_text(session), status_text(controller)),
        None => view_text(controller, ansi),
    }
}

/// Tabs, title, grid and status line
pub fn view_text<A: AdminApi>(controller: &AdminController<A>, ansi: bool) -> String {
    let mut output = String::new();

    let tabs: Vec<String> = controller
        .tables()
        .iter()
        .map(|table| {
            if controller.state().active_table() == Some(table.as_str()) {
                format!("*{}", table)
            } else {
                table.clone()
            }
        })
        .collect();
    let console_tab = if controller.state() == &ViewState::ConsoleActive {
        "*query"
    } else {
        "query"
    };
    output.push_str(&format!("tabs: {} | {}\n", tabs.join(" "), console_tab));

    output.push_str(&format!("== {} ==", controller.title()));
    if let Some(summary) = controller.key_summary() {
        output.push_str(&format!("  [{}]", summary));
    }
    output.push('\n');
    if !controller.hint().is_empty() {
        output.push_str(controller.hint());
        output.push('\n');
    }

    let grid = match controller.state() {
        ViewState::ConsoleActive => controller.console().map(|result| &result.grid),
        _ => controller.grid(),
    };
    match grid {
        Some(grid) if grid.rows.is_empty() => output.push_str("(no rows)\n"),
        Some(grid) => output.push_str(&grid.to_text(ansi)),
        None => {}
    }

    output.push_str(&status_text(controller));
    output
}

fn form_text(session: &FormSession) -> String {
    let mut output = format!("-- {} -- {}\n", session.title(), session.subtitle());
    for field in &session.fields {
        output.push_str(&format!("  {} = {:?}", field.label, field.value));
        if field.value.is_empty() {
            if let Some(placeholder) = field.placeholder {
                output.push_str(&format!("  <{}>", placeholder.text()));
            }
        }
        if field.disabled {
            output.push_str("  (locked)");
        }
        output.push('\n');
    }
    output
}

fn status_text<A: AdminApi>(controller: &AdminController<A>) -> String {
    let status = controller.status();
    if status.message.is_empty() {
        return String::new();
    }
    let tone = match status.tone {
        StatusTone::Muted => "..",
        StatusTone::Ok => "ok",
        StatusTone::Error => "error",
    };
    format!("[{}] {}\n", tone, status.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("  "), Ok(None));
        assert_eq!(parse("tables"), Ok(Some(ShellCommand::Refresh)));
        assert_eq!(parse("SAVE"), Ok(Some(ShellCommand::Save)));
        assert_eq!(parse("exit"), Ok(Some(ShellCommand::Quit)));
        assert_eq!(parse("open users"), Ok(Some(ShellCommand::Open("users".to_string()))));
    }

    #[test]
    fn test_parse_edit_is_one_based() {
        assert_eq!(parse("edit 1"), Ok(Some(ShellCommand::Edit(0))));
        assert!(parse("edit 0").is_err());
        assert!(parse("edit x").is_err());
    }

    #[test]
    fn test_parse_set_keeps_value_text() {
        assert_eq!(
            parse("set bio  hello  world"),
            Ok(Some(ShellCommand::Set {
                column: "bio".to_string(),
                value: "hello  world".to_string(),
            }))
        );
        assert_eq!(
            parse("set bio"),
            Ok(Some(ShellCommand::Set {
                column: "bio".to_string(),
                value: String::new(),
            }))
        );
        assert!(parse("set").is_err());
    }

    #[test]
    fn test_parse_query_passes_sql_through() {
        assert_eq!(
            parse("query SELECT * FROM users WHERE name = 'Ann'"),
            Ok(Some(ShellCommand::Query(
                "SELECT * FROM users WHERE name = 'Ann'".to_string()
            )))
        );
        assert!(parse("query").is_err());
        assert!(parse("query   ").is_err());
        assert!(parse("frobnicate").is_err());
    }

    #[test]
    fn test_parse_query_keeps_whitespace_as_typed() {
        assert_eq!(
            parse("query  SELECT\t1 ;  "),
            Ok(Some(ShellCommand::Query(" SELECT\t1 ;  ".to_string())))
        );
    }
}
