//! Terminal chat in Kiswahili.
//!
//! Type a message after `Wewe:`; `toka` or `ondoka` quits, `/reset` forgets
//! the conversation. Logs go to stderr (`RUST_LOG`, default `warn`).

use ai_llm_service::{LlmClient, config::default_config::config_from_env, telemetry};
use anyhow::Context;
use chat_core::{
    ChatBot, ChatConfig, ChatSession, Language, PromptFormat, TurnOptions, is_exit_word,
    render_failure,
};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const RESET_COMMAND: &str = "/reset";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("warn", true)?;

    let llm_cfg = config_from_env().context("LLM configuration")?;
    let mut chat_cfg = ChatConfig::from_env().context("chat configuration")?;
    if chat_cfg.format == PromptFormat::default() {
        chat_cfg.format = PromptFormat::kiswahili();
    }
    // The terminal bot prompts with the conversation only.
    chat_cfg.system_prompt.get_or_insert_with(String::new);

    println!("{}", format!("Inapakia modeli '{}'...", llm_cfg.model).dimmed());
    let client = LlmClient::new(llm_cfg)?;
    let health = client.health().await;
    if !health.ok {
        eprintln!("{} {}", "⚠".yellow(), health.message);
    }

    let opts = TurnOptions {
        params: client.config().default_params(),
        language: Language::Kiswahili,
        system: None,
    };
    let mut session = ChatSession::new(ChatBot::new(client, chat_cfg), opts);

    println!("Chatbot ya Kiswahili iko tayari! Andika 'toka' kuondoka.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all("Wewe: ".bold().to_string().as_bytes()).await?;
        stdout.flush().await?;

        let Some(input) = lines.next_line().await? else {
            break;
        };
        if is_exit_word(&input) {
            break;
        }
        if input.trim() == RESET_COMMAND {
            session.reset();
            println!("{}\n", "Historia imefutwa.".dimmed());
            continue;
        }
        if input.trim().is_empty() {
            continue;
        }

        match session.chat(&input).await {
            Ok(reply) => println!("{} {}\n", "Bot:".green().bold(), reply),
            Err(err) if err.is_client_error() => eprintln!("{} {}\n", "⚠".yellow(), err),
            Err(err) => println!(
                "{} {}\n",
                "Bot:".red().bold(),
                render_failure(session.options().language, &err)
            ),
        }
    }

    println!("Chatbot inafunga...");
    Ok(())
}
