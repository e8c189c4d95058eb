/// Interactive front end for the idea store
use idea_roulette::command::{self, Command, HELP};
use idea_roulette::{diagnostic, format, open_store, Config, IdeaStore};
use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  idea-roulette [chat-id]          Start a session for a chat (default: local)");
    eprintln!("  idea-roulette --help             Show this help message");
    eprintln!();
    eprintln!("Commands are read from stdin, one per line.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  IDEA_ROULETTE_DATA_DIR       Where chats are stored");
    eprintln!("  IDEA_ROULETTE_ON_EXHAUSTED   'report' (default) or 'restart'");
    eprintln!("  IDEA_ROULETTE_SEED           Fixed seed for reproducible picks");
    eprintln!("  RUST_LOG                     Log filter (default: warn)");
    eprintln!();
    eprintln!("{}", HELP);
}

/// Run one command, returning the text to show
async fn execute(store: &IdeaStore, chat: &str, command: Command) -> String {
    let result = match command {
        Command::Pick => store.pick(chat).await.map(|r| format::pick(&r)),
        Command::Reset => store
            .reset_history(chat)
            .await
            .map(|_| "History cleared.".to_string()),
        Command::AddIdea(text) => store
            .add_idea(chat, &text)
            .await
            .map(|n| format!("Idea added as number {}.", n)),
        Command::DeleteIdea(n) => store
            .delete_idea(chat, n)
            .await
            .map(|text| format!("Deleted idea: {}", text)),
        Command::AddPlace { idea, text } => store
            .add_place(chat, idea, &text)
            .await
            .map(|_| format!("Place added to idea {}.", idea)),
        Command::DeletePlace { idea, place } => store
            .delete_place(chat, idea, place)
            .await
            .map(|text| format!("Deleted place: {}", text)),
        Command::List => store.list_all(chat).await.map(|v| format::list(&v)),
        Command::Lists => store.lists(chat).await.map(|l| format::lists(&l)),
        Command::CreateList(name) => store
            .create_list(chat, &name)
            .await
            .map(|key| format!("Created list '{}' and switched to it.", key)),
        Command::DeleteList(key) => store
            .delete_list(chat, &key)
            .await
            .map(|active| format!("Deleted list '{}'. Active list: '{}'.", key, active)),
        Command::SwitchList(key) => store
            .switch_list(chat, &key)
            .await
            .map(|_| format!("Switched to '{}'.", key)),
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => Ok(String::new()),
    };

    result.unwrap_or_else(|e| format!("Error: {}", e))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() > 2 {
        print_usage();
        process::exit(1);
    }

    if args.len() == 2 && (args[1] == "--help" || args[1] == "-h") {
        print_usage();
        process::exit(0);
    }

    let chat = args.get(1).map(String::as_str).unwrap_or("local");
    let config = Config::from_env();
    tracing::info!(chat, data_dir = %config.data_dir.display(), "starting session");

    let store = open_store(&config);
    let interactive = io::stdin().is_terminal();
    let color = io::stderr().is_terminal();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("> ");
            let _ = io::stdout().flush();
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading from stdin: {}", e);
                process::exit(1);
            }
            None => break,
        };

        if line.trim().is_empty() {
            continue;
        }

        let command = match command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprint!("{}", diagnostic::report_command_error("<input>", &line, &e, color));
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        println!("{}", execute(&store, chat, command).await);
    }
}
