//! Interactive REPL — a thin stdin/stdout loop around [`process_turn`], the
//! way `astrid-cli`'s JSON chat mode drives its daemon client one line at a
//! time, minus the daemon transport (this binary embeds the runtime
//! in-process instead of connecting to one).

use std::io::Write;

use anyhow::Result;
use brain_runtime::process_turn;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::wiring::Runtime;

/// Run the REPL until stdin closes or the user types `exit`/`quit`.
pub async fn run(runtime: &mut Runtime) -> Result<()> {
    println!("brain chat — type a message, or 'exit' to quit.");
    let mut state = runtime.initial_state();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        let mut deps = runtime.deps();
        let (output, next_state) = process_turn(&mut deps, input, state).await?;
        println!("{}", output.assistant_reply);
        if output.requires_confirmation && !output.confirmation_prompt.is_empty() {
            println!("  ({})", output.confirmation_prompt);
        }
        state = next_state;
    }

    Ok(())
}
