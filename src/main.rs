//! Chef - Rust 烹饪助手
//!
//! 入口：初始化日志、加载配置、打开检查点存储，然后逐行读取输入调用 process_turn。
//!
//! 用法：`chef [SESSION_ID]`，或 `chef --new` 开启一个随机 ID 的新会话。

use anyhow::Context;
use chef::core::create_pipeline_builder;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chef::observability::init();

    let builder = create_pipeline_builder(None);
    let config = builder.config().clone();

    let session_id = match std::env::args().nth(1) {
        Some(arg) if arg == "--new" => format!("cooking_session_{}", uuid::Uuid::new_v4()),
        Some(arg) => arg,
        None => config.app.session_id.clone(),
    };

    println!("Chef - cooking assistant");
    println!("{}", "=".repeat(50));
    println!("Opening checkpoint store...");

    // 存储打不开时直接退出，不进入对话循环
    let pipeline = builder
        .build()
        .await
        .context("Failed to open checkpoint store; check [store] settings and permissions")?;

    if let Some(state) = pipeline.load_session(&session_id).await? {
        println!("Resuming session with {} previous turns", state.turn_count());
    }
    println!("Session ID: {session_id}");
    println!(
        "\nType '{}' to exit\n",
        config.app.quit_commands.first().map(String::as_str).unwrap_or("quit")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        if config
            .app
            .quit_commands
            .iter()
            .any(|q| q.eq_ignore_ascii_case(input))
        {
            println!("Happy cooking!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        match pipeline.process_turn(&session_id, input).await {
            Ok(outcome) => {
                println!("\nChef: {}\n", outcome.reply.content);
                if !outcome.preferences.is_empty() {
                    println!("Preferences noted: {}\n", outcome.preferences);
                }
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, "turn failed: {}", e);
                if e.is_retryable() {
                    println!("\nError: {e}. Nothing was saved for this message; please try again.\n");
                } else {
                    println!("\nError: {e}\n");
                }
            }
        }
    }

    Ok(())
}
