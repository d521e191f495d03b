//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the session and is never sent to the
//! backend.

use crate::routing::RoutingPolicy;

/// A section of the reference data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InfoSection {
    /// Food items.
    Foods,
    /// States.
    States,
    /// Local government areas.
    Lgas,
    /// Market outlets.
    Outlets,
    /// The date range of the data.
    Dates,
}

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Show reference data; `None` shows a summary.
    Info(Option<InfoSection>),

    /// Show the current routing policy.
    ShowRouting,

    /// Change the routing policy.
    Routing(RoutingPolicy),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be submitted as a question.
///
/// # Examples
///
/// ```
/// # use chopwise::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/routing intent").is_some());
/// assert!(parse_command("price of maize in Kano").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "info" => match argument {
            None => ChatCommand::Info(None),
            Some(arg) => match parse_info_section(arg) {
                Some(section) => ChatCommand::Info(Some(section)),
                None => ChatCommand::Invalid(
                    "/info expects foods, states, lgas, outlets, or dates".to_string(),
                ),
            },
        },
        "routing" => match argument {
            None => ChatCommand::ShowRouting,
            Some(arg) => match arg.parse::<RoutingPolicy>() {
                Ok(policy) => ChatCommand::Routing(policy),
                Err(_) => ChatCommand::Invalid("/routing expects 'chat' or 'intent'".to_string()),
            },
        },
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_info_section(value: &str) -> Option<InfoSection> {
    match value.to_lowercase().as_str() {
        "foods" | "food" => Some(InfoSection::Foods),
        "states" | "state" => Some(InfoSection::States),
        "lgas" | "lga" => Some(InfoSection::Lgas),
        "outlets" | "outlet" => Some(InfoSection::Outlets),
        "dates" | "date" | "date_range" => Some(InfoSection::Dates),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Ask a question, for example:
  price of maize white in Lagos
  predict price of beans in Abuja 3 months
  help

Available commands:
  /info [section]        Show reference data (foods, states, lgas, outlets, dates)
  /routing [chat|intent] Show or change how questions pick an endpoint
  /clear                 Clear conversation history
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear_and_help() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn parse_info() {
        assert_eq!(parse_command("/info"), Some(ChatCommand::Info(None)));
        assert_eq!(
            parse_command("/info foods"),
            Some(ChatCommand::Info(Some(InfoSection::Foods)))
        );
        assert_eq!(
            parse_command("/info  LGAs "),
            Some(ChatCommand::Info(Some(InfoSection::Lgas)))
        );
        assert_eq!(
            parse_command("/info dates"),
            Some(ChatCommand::Info(Some(InfoSection::Dates)))
        );
        assert!(matches!(
            parse_command("/info prices"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_routing() {
        assert_eq!(parse_command("/routing"), Some(ChatCommand::ShowRouting));
        assert_eq!(
            parse_command("/routing intent"),
            Some(ChatCommand::Routing(RoutingPolicy::IntentRouting))
        );
        assert_eq!(
            parse_command("/routing chat"),
            Some(ChatCommand::Routing(RoutingPolicy::ChatOnly))
        );
        assert_eq!(
            parse_command("/routing maybe"),
            Some(ChatCommand::Invalid(
                "/routing expects 'chat' or 'intent'".to_string()
            ))
        );
    }

    #[test]
    fn parse_stats_and_config() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
    }

    #[test]
    fn non_commands_are_questions() {
        assert_eq!(parse_command("price of yam in Kano"), None);
        assert_eq!(parse_command("help"), None);
        assert_eq!(parse_command("is 1/2 a bag cheaper?"), None);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/predict beans"),
            Some(ChatCommand::Invalid("Unknown command: /predict".to_string()))
        );
    }

    #[test]
    fn help_mentions_every_command() {
        let help = help_text();
        for command in ["/info", "/routing", "/clear", "/stats", "/config", "/help", "/quit"] {
            assert!(help.contains(command), "help text is missing {command}");
        }
    }
}
