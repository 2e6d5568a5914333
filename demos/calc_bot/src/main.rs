//! Calculator Bot Example
//!
//! Reads chat lines from stdin and runs them through a handful of commands.
//! Every line becomes a `message_new` event; outside release mode the
//! handling of each line is logged command by command.
//!
//! ```text
//! /sum 1 2.5 -3       -> sum = 0.5
//! /add 2 40           -> 2 + 40 = 42
//! /div 1 0            -> reaction failure, reported even in release mode
//! /switch on          -> switch is now on
//! /say hello there    -> hello there
//! /guess              -> waits for your next line
//! /help
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package calc-bot
//! cargo run --package calc-bot -- --release --prefix '!'
//! cargo run --package calc-bot -- --trace
//! ```

use std::path::PathBuf;

use anyhow::Result;
use chisel::prelude::*;
use chisel::runtime::signal::ReservedSignal;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(about = "A calculator bot reading commands from stdin")]
struct Cli {
    /// Configuration file to load instead of searching for chisel.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(long)]
    profile: Option<String>,

    /// Only report failures.
    #[arg(long)]
    release: bool,

    /// Command prefix, may be repeated.
    #[arg(long = "prefix")]
    prefixes: Vec<String>,

    /// Log every filter decision and command timing.
    #[arg(long)]
    trace: bool,
}

// ============================================================================
// Reactions
// ============================================================================

fn reply(text: impl std::fmt::Display) {
    println!("> {text}");
}

async fn sum(ctx: CommandContext) -> Result<(), ReactionError> {
    let numbers: Vec<f64> = ctx.arg("numbers")?;
    reply(format!("sum = {}", numbers.iter().sum::<f64>()));
    Ok(())
}

async fn add(ctx: CommandContext) -> Result<(), ReactionError> {
    let a: i64 = ctx.arg("a")?;
    let b: i64 = ctx.arg("b")?;
    match a.checked_add(b) {
        Some(total) => reply(format!("{a} + {b} = {total}")),
        None => reply("that does not fit in 64 bits"),
    }
    Ok(())
}

async fn divide(ctx: CommandContext) -> Result<(), ReactionError> {
    let a: f64 = ctx.arg("a")?;
    let b: f64 = ctx.arg("b")?;
    if b == 0.0 {
        return Err(ReactionError::failed("division by zero"));
    }
    reply(format!("{a} / {b} = {}", a / b));
    Ok(())
}

async fn switch(ctx: CommandContext) -> Result<(), ReactionError> {
    let on: bool = ctx.arg("state")?;
    reply(format!("switch is now {}", if on { "on" } else { "off" }));
    Ok(())
}

async fn say(ctx: CommandContext) -> Result<(), ReactionError> {
    let text: String = ctx.arg("text")?;
    reply(text);
    Ok(())
}

fn print_usage(bot: &Bot) {
    for command in bot.commands() {
        let usage = command
            .argument_usage()
            .iter()
            .map(|(name, usage)| format!("<{name}: {usage}>"))
            .collect::<Vec<_>>()
            .join(" ");
        reply(format!("{} {usage}", command.name()));
    }
}

const SECRET: i64 = 7;

// ============================================================================
// Setup
// ============================================================================

fn register_commands(bot: &Bot) -> Result<()> {
    let handle = bot.handle();

    bot.add_command(
        bot.command("sum")
            .argument(
                "numbers",
                ListCutter::new(ListConfig::of(FloatCutter::new()))?,
            )
            .strict(true)
            .reaction(sum)
            .build()?,
    );
    bot.add_command(
        bot.command("add")
            .argument("a", IntegerCutter::new())
            .argument("b", IntegerCutter::new())
            .strict(true)
            .reaction(add)
            .build()?,
    );
    bot.add_command(
        bot.command("div")
            .argument("a", FloatCutter::new())
            .argument("b", FloatCutter::new())
            .strict(true)
            .reaction(divide)
            .build()?,
    );
    bot.add_command(
        bot.command("switch")
            .argument(
                "state",
                BoolCutter::new(BoolConfig::new().with_true(["up"]).with_false(["down"]))?,
            )
            .strict(true)
            .reaction(switch)
            .build()?,
    );
    bot.add_command(
        bot.command("say")
            .names(["echo"])
            .on_event_type(chisel::core::MESSAGE_NEW)
            .on_event_type(chisel::core::MESSAGE_EDIT)
            .argument("text", StringCutter::new())
            .reaction(say)
            .build()?,
    );

    let conversation = handle.clone();
    bot.add_command(
        bot.command("guess")
            .strict(true)
            .reaction(move || {
                // Registered before the prompt so a fast answer is not missed.
                let next = conversation.fetch_new_event();
                async move {
                    reply("pick a number from 1 to 10");
                    let Some(event) = next.await else {
                        return;
                    };
                    match event.text_or_empty().trim().parse::<i64>() {
                        Ok(SECRET) => reply("correct!"),
                        Ok(n) => reply(format!("{n}? no, it was {SECRET}")),
                        Err(_) => reply("that is not a number"),
                    }
                }
            })
            .build()?,
    );
    bot.add_command(
        bot.command("help")
            .strict(true)
            .reaction(move || {
                if let Some(bot) = handle.upgrade() {
                    print_usage(&bot);
                }
                async {}
            })
            .build()?,
    );

    Ok(())
}

fn signals() -> SignalHub {
    let hub = SignalHub::new();
    hub.on(ReservedSignal::Startup.as_str(), |_| async {
        info!("calc bot ready, type /help");
    });
    hub.on(ReservedSignal::Shutdown.as_str(), |_| async {
        info!("calc bot finished");
    });
    hub
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    if let Some(profile) = &cli.profile {
        loader = loader.profile(profile.as_str());
    }
    let mut config = loader.load()?;
    if cli.release {
        config.bot.release = true;
    }
    if !cli.prefixes.is_empty() {
        config.bot.prefixes = cli.prefixes;
    }

    if cli.trace {
        logging::LoggingBuilder::from_config(&config.logging)
            .trace_commands()
            .init();
    } else {
        logging::init_from_config(&config.logging);
    }

    let bot = Bot::from_config(&config).signals(signals()).build();
    register_commands(&bot)?;

    let (tx, events) = channel(64);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let event = BoxedEvent::new(TextEvent::message(line).with_author(1));
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    error!("Failed to read stdin: {err}");
                    break;
                }
            }
        }
    });

    let handle = bot.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.shutdown();
    });

    bot.run(events).await?;

    Ok(())
}
