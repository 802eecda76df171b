use anyhow::{bail, Context, Result};
use std::env;
use std::io::{self, BufRead, Write};
use std::num::NonZeroU32;
use std::sync::Arc;

use budget_ledger::{init_tracing, Bot, Config, OwnerId, Reply, SqliteStore};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let owner = parse_owner(&args)?;

    let config = Config::load()?;
    init_tracing(&config.log_filter);

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database: {}", config.db_path.display()))?;
    let limit = NonZeroU32::new(config.list_limit).context("list_limit must be positive")?;
    let bot = Bot::new(Arc::new(store), limit);

    run_chat(&bot, owner)
}

/// `--user <id>`, default 0
fn parse_owner(args: &[String]) -> Result<OwnerId> {
    match args.iter().position(|a| a == "--user") {
        None => Ok(0),
        Some(idx) => match args.get(idx + 1) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("--user expects a numeric id, got {}", raw)),
            None => bail!("--user expects a numeric id"),
        },
    }
}

fn run_chat(bot: &Bot<SqliteStore>, owner: OwnerId) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print_reply(&mut stdout, &bot.handle_message(owner, "/start"))?;

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Button presses are typed as their callback data
        let reply = if line.starts_with("quick_") && line.contains('|') {
            bot.handle_callback(owner, line)
        } else {
            bot.handle_message(owner, line)
        };

        print_reply(&mut stdout, &reply)?;
    }

    Ok(())
}

fn print_reply(out: &mut impl Write, reply: &Reply) -> Result<()> {
    writeln!(out, "{}", reply.text)?;
    for button in &reply.buttons {
        writeln!(out, "  [{}] → {}", button.text, button.callback_data)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
