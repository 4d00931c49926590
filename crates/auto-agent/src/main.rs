//! Runs an agent against an OpenAI-compatible API until it finishes its
//! goals.

#[macro_use]
extern crate tracing;

use std::process::ExitCode;

use auto_agent::ReplyView;
use auto_agent::core::{AgentBuilder, DEFAULT_AI_NAME, DEFAULT_AI_ROLE};
use auto_agent::openai::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAIConfigBuilder, OpenAIProvider,
};
use clap::Parser;
use owo_colors::OwoColorize;

const BAR_CHAR: &str = "▎";

#[derive(Parser, Debug)]
#[command(name = "auto-agent", version, about, long_about = None)]
struct Args {
    /// Goals for the agent, one per argument.
    #[arg(required = true, value_name = "GOAL")]
    goals: Vec<String>,

    /// Name the agent is addressed by.
    #[arg(long, default_value = DEFAULT_AI_NAME)]
    name: String,

    /// Role of the agent.
    #[arg(long, default_value = DEFAULT_AI_ROLE)]
    role: String,

    /// Ask for feedback after every command ("q" or "stop" to exit).
    #[arg(long)]
    human: bool,

    /// Give up after this many turns.
    #[arg(long)]
    max_turns: Option<u64>,

    /// API key of the model provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model to use.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = OpenAIConfigBuilder::with_api_key(args.api_key)
        .with_base_url(args.base_url)
        .with_model(args.model)
        .build();
    debug!("using {config:?}");
    let model_provider = OpenAIProvider::new(config);

    let mut builder = AgentBuilder::with_model_provider(model_provider)
        .with_ai_name(args.name.as_str())
        .with_ai_role(args.role)
        .human_in_the_loop(args.human)
        .on_reply(print_reply);
    if let Some(max_turns) = args.max_turns {
        builder = builder.with_max_turns(max_turns);
    }
    let mut agent = builder.build();

    println!(
        "{}🚀 {} is working on {} goal(s)",
        BAR_CHAR.bright_cyan(),
        args.name.bright_white().bold(),
        args.goals.len()
    );
    if args.human {
        println!(
            "{}Answer each prompt with feedback, or \"q\" / \"stop\" to exit.",
            BAR_CHAR.bright_yellow()
        );
    }

    match agent.run(&args.goals).await {
        Ok(response) => {
            println!(
                "\n{}✅ {}",
                BAR_CHAR.bright_green(),
                response.bright_white().bold()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("agent stopped: {err:?}");
            eprintln!("{} {err}", "error:".bright_red().bold());
            ExitCode::FAILURE
        }
    }
}

fn print_reply(reply: &str) {
    let Some(view) = ReplyView::parse(reply) else {
        println!("\n{}🤖 {}", BAR_CHAR.bright_cyan(), reply.bright_white());
        return;
    };

    let bar = BAR_CHAR.bright_cyan();
    println!();
    let labeled = [
        ("THOUGHTS", &view.text),
        ("REASONING", &view.reasoning),
        ("CRITICISM", &view.criticism),
        ("SPEAK", &view.speak),
    ];
    for (label, value) in labeled {
        if let Some(value) = value {
            println!("{bar}{} {value}", format!("{label}:").bright_yellow());
        }
    }
    if !view.plan.is_empty() {
        println!("{bar}{}", "PLAN:".bright_yellow());
        for item in &view.plan {
            println!("{bar}  - {item}");
        }
    }
    if let Some(command) = &view.command {
        println!(
            "{bar}{} {} {}",
            "NEXT ACTION:".bright_cyan().bold(),
            command.bright_white().bold(),
            view.arguments.as_deref().unwrap_or("{}")
        );
    }
}
