//! `abf-cli`: administrative client for the guard, grpc over the same
//! `AntiBruteForce` service. Run with a subcommand for a one-shot call, or
//! with none for an interactive REPL — the direct analogue of
//! `cmd/cli/handler.go`'s read-eval loop.

use clap::{Parser, Subcommand};
use tonic::transport::Channel;
use tracing_subscriber::{fmt, EnvFilter};

use abf_rpc::pb::anti_brute_force_client::AntiBruteForceClient;
use abf_rpc::pb::{AuthRequest, NetworkRequest, ResetRequest};

#[derive(Parser)]
#[command(name = "abf-cli", about = "Administrative client for the ABF guard")]
struct Cli {
    /// ABF service host.
    #[arg(short = 'H', long, default_value = "localhost")]
    host: String,
    /// ABF service port.
    #[arg(short, long, default_value_t = 8889)]
    port: u16,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Check auth possibility for given login, password and IP.
    Auth { login: String, password: String, ip: String },
    /// Reset the bucket for each of login, password and IP.
    Reset { login: String, password: String, ip: String },
    /// Add a subnet to the allow or deny list.
    Add {
        #[arg(value_enum)]
        list: ListKind,
        network: String,
    },
    /// Remove a subnet from the allow or deny list.
    Remove {
        #[arg(value_enum)]
        list: ListKind,
        network: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum ListKind {
    Allow,
    Deny,
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let endpoint = format!("http://{}:{}", cli.host, cli.port);

    let channel = match Channel::from_shared(endpoint.clone()) {
        Ok(builder) => match builder.connect().await {
            Ok(channel) => channel,
            Err(e) => {
                eprintln!("{e}");
                return;
            }
        },
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    let mut client = AntiBruteForceClient::new(channel);

    match cli.command {
        Some(cmd) => run_command(&mut client, cmd).await,
        None => repl(&mut client, &endpoint).await,
    }
}

async fn run_command(client: &mut AntiBruteForceClient<Channel>, cmd: Command) {
    let result = dispatch(client, cmd).await;
    match result {
        Ok(line) => println!("{line}"),
        Err(e) => println!("Error: {e}"),
    }
}

async fn dispatch(
    client: &mut AntiBruteForceClient<Channel>,
    cmd: Command,
) -> Result<String, tonic::Status> {
    match cmd {
        Command::Auth { login, password, ip } => {
            let resp = client
                .auth(AuthRequest { login, password, ip })
                .await?
                .into_inner();
            Ok(format!("Response: Ok: {}", resp.ok))
        }
        Command::Reset { login, password, ip } => {
            client
                .reset(ResetRequest { login, password, ip })
                .await?;
            Ok("Response: Ok".to_string())
        }
        Command::Add { list, network } => {
            match list {
                ListKind::Allow => client.add_to_allow_list(NetworkRequest { network }).await?,
                ListKind::Deny => client.add_to_deny_list(NetworkRequest { network }).await?,
            };
            Ok("Response: Ok".to_string())
        }
        Command::Remove { list, network } => {
            match list {
                ListKind::Allow => {
                    client
                        .remove_from_allow_list(NetworkRequest { network })
                        .await?
                }
                ListKind::Deny => {
                    client
                        .remove_from_deny_list(NetworkRequest { network })
                        .await?
                }
            };
            Ok("Response: Ok".to_string())
        }
    }
}

/// Interactive read-eval loop: parse each line with shell-word semantics
/// (so a password containing spaces can be quoted), dispatch it as if it
/// were one of the one-shot subcommands.
async fn repl(client: &mut AntiBruteForceClient<Channel>, endpoint: &str) {
    println!("Connected to {endpoint}");
    println!("Commands: auth | reset | add <allow|deny> <network> | remove <allow|deny> <network> | exit");

    let mut editor: rustyline::DefaultEditor = match rustyline::DefaultEditor::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("failed to start input editor: {e}");
            return;
        }
    };

    loop {
        let line = match editor.readline("abf> ") {
            Ok(line) => line,
            Err(_) => break,
        };
        let _ = editor.add_history_entry(line.as_str());

        let words = match shlex::split(line.trim()) {
            Some(words) => words,
            None => {
                println!("Error: unbalanced quotes");
                continue;
            }
        };
        if words.is_empty() {
            continue;
        }

        match parse_repl_command(&words) {
            Ok(ReplCommand::Exit) => break,
            Ok(ReplCommand::Run(cmd)) => run_command(client, cmd).await,
            Err(e) => println!("Error: {e}"),
        }
    }
}

enum ReplCommand {
    Exit,
    Run(Command),
}

fn parse_repl_command(words: &[String]) -> Result<ReplCommand, String> {
    match words[0].as_str() {
        "exit" | "quit" => Ok(ReplCommand::Exit),
        "auth" => {
            let [login, password, ip] = take3(words)?;
            Ok(ReplCommand::Run(Command::Auth { login, password, ip }))
        }
        "reset" => {
            let [login, password, ip] = take3(words)?;
            Ok(ReplCommand::Run(Command::Reset { login, password, ip }))
        }
        "add" => {
            let (list, network) = take_list_op(words)?;
            Ok(ReplCommand::Run(Command::Add { list, network }))
        }
        "remove" => {
            let (list, network) = take_list_op(words)?;
            Ok(ReplCommand::Run(Command::Remove { list, network }))
        }
        other => Err(format!("no such command: {other}")),
    }
}

fn take3(words: &[String]) -> Result<[String; 3], String> {
    if words.len() != 4 {
        return Err("wrong number of arguments, expected 3 arguments".to_string());
    }
    Ok([words[1].clone(), words[2].clone(), words[3].clone()])
}

fn take_list_op(words: &[String]) -> Result<(ListKind, String), String> {
    if words.len() != 3 {
        return Err("wrong number of arguments, expected 2 arguments".to_string());
    }
    let list = match words[1].as_str() {
        "allow" | "white" => ListKind::Allow,
        "deny" | "black" => ListKind::Deny,
        other => return Err(format!("unknown list {other}, expected allow or deny")),
    };
    Ok((list, words[2].clone()))
}
