//! Interactive chat with the ChopWise food price backend.
//!
//! # Usage
//!
//! ```bash
//! # Use $CHOPWISE_BACKEND_URL or the hosted default
//! chopwise-chat
//!
//! # Point at a local backend and send prediction questions to /predict
//! chopwise-chat --backend-url http://localhost:8000 --routing intent
//!
//! # Read settings from a YAML file
//! chopwise-chat --config chopwise.yaml
//! ```
//!
//! Set `CHOPWISE_LOG=debug` to see request logs on stderr.

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use chopwise::ChopWise;
use chopwise::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, InFlightPolicy, PlainTextRenderer,
    Renderer, Submission, help_text, parse_command,
};

const LOG_ENV: &str = "CHOPWISE_LOG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("chopwise-chat [OPTIONS]");
    let config = ChatConfig::from_args(&args)?;

    let client = ChopWise::with_options(Some(config.backend_url.clone()), config.timeout)?;
    let base_url = client.base_url().to_string();
    let controller = ChatController::new(client, &config);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    println!("ChopWise – Smart Food Price Chatbot");
    println!("Backend: {base_url}");
    println!("Type your question, e.g. price of maize in Kano");
    println!("Type /help for commands, /quit to exit\n");

    if config.fetch_info {
        let info = controller.fetch_info().await;
        renderer.print_reference_data(&info, None);
    }

    // Index of the first message not yet shown. The line editor already
    // echoed user messages, so only bot messages are printed from the tail.
    let mut shown = 0;

    loop {
        shown = print_new_replies(&controller, &mut renderer, shown);

        let line = match rl.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        };

        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }

        if let Some(cmd) = parse_command(&line) {
            match cmd {
                ChatCommand::Quit => {
                    println!("Goodbye!");
                    break;
                }
                ChatCommand::Clear => {
                    controller.clear();
                    shown = 0;
                    renderer.print_info("Conversation cleared.");
                }
                ChatCommand::Help => {
                    for line in help_text().lines() {
                        println!("    {}", line);
                    }
                }
                ChatCommand::Info(section) => {
                    let info = controller.fetch_info().await;
                    renderer.print_reference_data(&info, section);
                }
                ChatCommand::ShowRouting => {
                    renderer.print_info(&format!("Routing: {}", controller.routing()));
                }
                ChatCommand::Routing(policy) => {
                    controller.set_routing(policy);
                    renderer.print_info(&format!("Routing set to {policy}"));
                }
                ChatCommand::Stats => print_stats(&controller),
                ChatCommand::ShowConfig => print_config(&controller, &config, &base_url),
                ChatCommand::Invalid(message) => renderer.print_error(&message),
            }
            continue;
        }

        match controller.submit(&line) {
            Submission::Ignored => {}
            Submission::Busy => {
                renderer.print_info("Still waiting for the previous reply.");
            }
            Submission::Pending(pending) => {
                if controller.in_flight_policy() == InFlightPolicy::Exclusive {
                    tokio::select! {
                        reply = pending.wait() => {
                            if let Err(err) = reply {
                                renderer.print_error(&err.to_string());
                            }
                        }
                        _ = tokio::signal::ctrl_c() => {
                            renderer.print_info("[stopped waiting; the reply will appear when it arrives]");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_new_replies(
    controller: &ChatController<ChopWise>,
    renderer: &mut dyn Renderer,
    shown: usize,
) -> usize {
    let new = controller.messages_since(shown);
    for message in new.iter().filter(|m| m.is_bot()) {
        renderer.print_message(message);
    }
    shown + new.len()
}

fn print_stats(controller: &ChatController<ChopWise>) {
    let stats = controller.stats();
    println!("    Session Statistics:");
    println!(
        "      Messages: {} ({} from you, {} from ChopWise)",
        stats.message_count, stats.user_messages, stats.bot_messages
    );
    println!(
        "      Questions sent: {} ({} replies, {} fallbacks)",
        stats.submitted, stats.replies, stats.fallbacks
    );
    println!("      Empty inputs ignored: {}", stats.ignored);
    println!("      Rejected while waiting: {}", stats.rejected_busy);
    println!("      In flight: {} ({:?})", stats.in_flight, stats.state);
    println!(
        "      Reference data: {}",
        if stats.info_loaded {
            "loaded"
        } else {
            "not loaded"
        }
    );
}

fn print_config(controller: &ChatController<ChopWise>, config: &ChatConfig, base_url: &str) {
    println!("    Current Configuration:");
    println!("      Backend: {}", base_url);
    println!("      Routing: {}", controller.routing());
    println!("      In-flight policy: {}", controller.in_flight_policy());
    println!("      Fallback: {}", controller.fallback().text());
    match config.timeout {
        Some(timeout) => println!("      Timeout: {} seconds", timeout.as_secs()),
        None => println!("      Timeout: (none)"),
    }
    println!(
        "      Color: {}",
        if config.use_color { "on" } else { "off" }
    );
}
