//! Output rendering for the chat application.
//!
//! The [`Renderer`] trait separates what the REPL shows from how it is
//! written. [`PlainTextRenderer`] writes to stdout (or any writer) with
//! optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::chat::commands::InfoSection;
use crate::types::{ChatbotInfo, Message, Role};

/// ANSI escape code for dim text (used for info lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for green text (used for the user label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for cyan text (used for the bot label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Label printed before bot messages.
pub const BOT_LABEL: &str = "ChopWise";

/// Label printed before user messages.
pub const USER_LABEL: &str = "You";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print a conversation message with its speaker label.
    fn print_message(&mut self, message: &Message);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print reference data: a summary, or one section in full.
    fn print_reference_data(&mut self, info: &ChatbotInfo, section: Option<InfoSection>) {
        match section {
            None => self.print_info(&summarize_info(info)),
            Some(section) => {
                for line in format_section(info, section).lines() {
                    self.print_info(line);
                }
            }
        }
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Consumes the renderer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Terminal write failures are not actionable mid-conversation.
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_message(&mut self, message: &Message) {
        let (label, color) = match message.role {
            Role::User => (USER_LABEL, ANSI_GREEN),
            Role::Bot => (BOT_LABEL, ANSI_CYAN),
        };
        let text = if self.use_color {
            format!("{ANSI_BOLD}{color}{label}:{ANSI_RESET} {}", message.text)
        } else {
            format!("{label}: {}", message.text)
        };
        self.line(&text);
    }

    fn print_error(&mut self, error: &str) {
        let text = if self.use_color {
            format!("{ANSI_RED}Error: {error}{ANSI_RESET}")
        } else {
            format!("Error: {error}")
        };
        self.line(&text);
    }

    fn print_info(&mut self, info: &str) {
        let text = if self.use_color {
            format!("{ANSI_DIM}{info}{ANSI_RESET}")
        } else {
            info.to_string()
        };
        self.line(&text);
    }
}

/// One-line summary of the reference data.
pub fn summarize_info(info: &ChatbotInfo) -> String {
    if info.is_empty() {
        return "Reference data unavailable.".to_string();
    }
    let mut summary = format!(
        "{} foods, {} states, {} LGAs, {} outlets",
        info.foods.len(),
        info.states.len(),
        info.lgas.len(),
        info.outlets.len()
    );
    if !info.date_range.is_empty() {
        summary.push_str(&format!(
            "; prices from {} to {}",
            info.date_range.start, info.date_range.end
        ));
    }
    summary
}

/// Multi-line listing of one reference data section.
pub fn format_section(info: &ChatbotInfo, section: InfoSection) -> String {
    let (title, items) = match section {
        InfoSection::Foods => ("Foods", &info.foods),
        InfoSection::States => ("States", &info.states),
        InfoSection::Lgas => ("LGAs", &info.lgas),
        InfoSection::Outlets => ("Outlets", &info.outlets),
        InfoSection::Dates => {
            return if info.date_range.is_empty() {
                "Date range: (unknown)".to_string()
            } else {
                format!(
                    "Date range: {} to {}",
                    info.date_range.start, info.date_range.end
                )
            };
        }
    };
    if items.is_empty() {
        return format!("{title}: (none)");
    }
    let mut out = format!("{title} ({}):", items.len());
    for item in items {
        out.push_str("\n  - ");
        out.push_str(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DateRange;

    fn sample_info() -> ChatbotInfo {
        ChatbotInfo {
            foods: vec!["Maize white".to_string(), "Garri".to_string()],
            states: vec!["Kano".to_string()],
            lgas: vec![],
            outlets: vec!["Open market".to_string()],
            date_range: DateRange {
                start: "2017-01-15".to_string(),
                end: "2024-06-15".to_string(),
            },
        }
    }

    fn render<F: FnOnce(&mut PlainTextRenderer<Vec<u8>>)>(use_color: bool, f: F) -> String {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), use_color);
        f(&mut renderer);
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn plain_messages_have_labels() {
        let out = render(false, |r| {
            r.print_message(&Message::user("price of rice"));
            r.print_message(&Message::bot("₦1,200.00"));
        });
        assert_eq!(out, "You: price of rice\nChopWise: ₦1,200.00\n");
    }

    #[test]
    fn colored_output_is_reset() {
        let out = render(true, |r| r.print_error("boom"));
        assert_eq!(out, "\x1b[31mError: boom\x1b[0m\n");

        let out = render(true, |r| r.print_message(&Message::bot("hi")));
        assert!(out.starts_with(ANSI_BOLD));
        assert!(out.contains("ChopWise:"));
        assert!(out.ends_with("hi\n"));
    }

    #[test]
    fn summary_of_reference_data() {
        assert_eq!(
            summarize_info(&sample_info()),
            "2 foods, 1 states, 0 LGAs, 1 outlets; prices from 2017-01-15 to 2024-06-15"
        );
        assert_eq!(
            summarize_info(&ChatbotInfo::default()),
            "Reference data unavailable."
        );
    }

    #[test]
    fn sections_list_items() {
        let info = sample_info();
        assert_eq!(
            format_section(&info, InfoSection::Foods),
            "Foods (2):\n  - Maize white\n  - Garri"
        );
        assert_eq!(format_section(&info, InfoSection::Lgas), "LGAs: (none)");
        assert_eq!(
            format_section(&info, InfoSection::Dates),
            "Date range: 2017-01-15 to 2024-06-15"
        );
        assert_eq!(
            format_section(&ChatbotInfo::default(), InfoSection::Dates),
            "Date range: (unknown)"
        );

        let out = render(false, |r| {
            r.print_reference_data(&info, Some(InfoSection::States))
        });
        assert_eq!(out, "States (1):\n  - Kano\n");
    }
}
