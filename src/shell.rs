//! Interactive mode: one session shared by every event typed on stdin.

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::App;
use uvmap_uv::Coordinates;

const HELP: &str = "\
click <lat> <lng>   consultar la radiación UV en un punto
comment <texto>     comentar la lectura mostrada
list                listar comentarios
delete <id>         eliminar un documento
quit                salir";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Click(Coordinates),
    Comment(String),
    List,
    Delete(String),
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "" => return Ok(None),
        "click" => {
            let mut parts = rest.split_whitespace();
            let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
                bail!("usage: click <lat> <lng>");
            };
            let lat: f64 = lat.parse().context("invalid latitude")?;
            let lng: f64 = lng.parse().context("invalid longitude")?;
            ShellCommand::Click(Coordinates::new(lat, lng))
        }
        "comment" => ShellCommand::Comment(rest.to_string()),
        "list" => ShellCommand::List,
        "delete" if !rest.is_empty() => ShellCommand::Delete(rest.to_string()),
        "delete" => bail!("usage: delete <id>"),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => bail!("unknown command: {}", other),
    };
    Ok(Some(command))
}

/// Read commands until EOF or `quit`, starting with the configured map center.
pub async fn run(app: &App) -> Result<()> {
    let map = &app.config().map;
    crate::resolve_and_print(app, Coordinates::new(map.default_lat, map.default_lng)).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            ShellCommand::Click(coords) => crate::resolve_and_print(app, coords).await,
            ShellCommand::Comment(text) => {
                let Some(coords) = app.session().last_resolved() else {
                    eprintln!("Selecciona un punto primero.");
                    continue;
                };
                app.session().set_draft(text.clone());
                let outcome = app
                    .annotations()
                    .submit(
                        app.session(),
                        &text,
                        app.session().display().uv,
                        coords,
                        crate::now_ms(),
                    )
                    .await;
                crate::report_submit(&outcome);
            }
            ShellCommand::List => crate::print_annotations(app).await,
            ShellCommand::Delete(id) => crate::delete_and_report(app, &id).await,
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => break,
        }
    }

    Ok(())
}
