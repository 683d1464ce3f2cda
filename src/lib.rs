pub mod analytics;
pub mod boards;
pub mod chat;
pub mod error;
pub mod monday;
pub mod narrative;
pub mod normalize;
pub mod router;
pub mod state;
pub mod table;
pub mod types;

use std::io::Write;
use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader};

use chat::{ChatMessage, Role};
use state::AppState;

const PROMPT: &str = "> ";

/// Run the interactive shell until EOF or `/quit`.
pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match state::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}\n{}", e, e.recovery_suggestion());
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(shell(AppState::new(config)))
}

async fn shell(mut state: AppState) -> ExitCode {
    print_message(&state.transcript.messages()[0]);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", PROMPT);
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                return ExitCode::FAILURE;
            }
        };

        let text = line.trim();
        match text {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                state.transcript.clear();
                print_message(&state.transcript.messages()[0]);
                continue;
            }
            "/export" => {
                match state.transcript.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(e) => log::error!("Failed to export transcript: {}", e),
                }
                continue;
            }
            _ => {}
        }

        let today = chrono::Local::now().date_naive();
        let reply = state.ask(text, today).await;
        print_message(reply);
    }

    ExitCode::SUCCESS
}

fn print_message(message: &ChatMessage) {
    if message.role == Role::User {
        return;
    }
    println!("\n{}", message.content.trim_end());
    if let Some(attachment) = &message.attachment {
        println!("\n{}", attachment.render_text());
    }
    println!();
}
