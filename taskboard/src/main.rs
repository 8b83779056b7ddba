//! `taskboard` -- terminal client for the collaborative task board.
//!
//! ```bash
//! cargo run --bin taskboard -- --server 127.0.0.1:8080 --user alice
//! TASKBOARD_SERVER=10.0.0.5:8080 cargo run --bin taskboard
//! ```

use clap::Parser;
use taskboard::client::{Client, ClientError, CommandWriter, EventReader};
use taskboard::config::CliArgs;
use taskboard::repl::{self, Input};
use taskboard_proto::ServerEvent;
use taskboard_proto::board::Board;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    let mut client = match Client::open(&cli.server).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let Some((username, users)) = log_in(&mut client, cli.user, &mut stdin).await else {
        client.close().await;
        return;
    };

    println!("joined as {username}; type `help` for commands");
    let mut board = Board::new(username);
    board.apply(&ServerEvent::ConnectOk { users });

    let (mut writer, mut events) = client.into_split();
    if let Err(e) = run(&mut board, &mut writer, &mut events, &mut stdin).await {
        eprintln!("{e}");
        writer.close().await;
        std::process::exit(1);
    }
    writer.close().await;
}

/// Logs in, prompting for a name until one is accepted.
///
/// Returns `None` if stdin ends or the connection fails first.
async fn log_in(
    client: &mut Client,
    mut candidate: Option<String>,
    stdin: &mut StdinLines,
) -> Option<(String, Vec<String>)> {
    loop {
        let username = match candidate.take() {
            Some(name) => name,
            None => {
                println!("username:");
                stdin.next_line().await.ok()??
            }
        };
        match client.login(&username).await {
            Ok(users) => return Some((username.trim().to_string(), users)),
            Err(ClientError::Rejected(reason)) => println!("{reason}"),
            Err(e @ ClientError::LineBreak(_)) => println!("{e}"),
            Err(e) => {
                eprintln!("{e}");
                return None;
            }
        }
    }
}

/// Main loop: stdin commands out, server events in.
async fn run(
    board: &mut Board,
    writer: &mut CommandWriter,
    events: &mut EventReader,
    stdin: &mut StdinLines,
) -> Result<(), ClientError> {
    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Ok(Some(line)) = line else {
                    return Ok(());
                };
                match repl::parse_input(&line, board) {
                    Ok(Some(Input::Send(cmd))) => match writer.send(&cmd).await {
                        Err(e @ ClientError::LineBreak(_)) => println!("{e}"),
                        other => other?,
                    },
                    Ok(Some(Input::List)) => println!("{}", repl::render_board(board)),
                    Ok(Some(Input::Who)) => {
                        println!("{}", board.online().collect::<Vec<_>>().join(", "));
                    }
                    Ok(Some(Input::Help)) => println!("{}", repl::HELP),
                    Ok(Some(Input::Quit)) => return Ok(()),
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            event = events.next_event() => {
                let Some(event) = event? else {
                    println!("server closed the connection");
                    return Ok(());
                };
                if let Some(text) = repl::describe_event(&event, board) {
                    println!("{text}");
                }
                board.apply(&event);
            }
        }
    }
}
