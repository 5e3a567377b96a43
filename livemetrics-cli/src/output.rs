use std::collections::HashMap;

#[cfg(feature = "colored-output")]
use colored::*;
use live_metrics::DisplayTarget;
use serde_json::{Map, Value};

use crate::{cli::OutputFormat, error::Result};

const PLACEHOLDER: &str = "--";

pub struct OutputManager {
    colored: bool,
}

enum Color {
    Green,
    Yellow,
    Cyan,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// Render the current card texts. Cards without a value show a placeholder.
    pub fn format_cards(
        &self,
        cards: &HashMap<DisplayTarget, String>,
        hidden: &[DisplayTarget],
        format: OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.format_pretty(cards, hidden)),
            OutputFormat::Json => self.format_json(cards, hidden),
        }
    }

    fn format_pretty(
        &self,
        cards: &HashMap<DisplayTarget, String>,
        hidden: &[DisplayTarget],
    ) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize("Live Metrics:", &Color::Green, true));
        output.push('\n');

        for target in visible(hidden) {
            let value = cards.get(&target).map(String::as_str).unwrap_or(PLACEHOLDER);
            output.push_str(&format!(
                "  {:<18} {}\n",
                self.colorize(&format!("{}:", target.label()), &Color::Yellow, false),
                self.colorize(value, &Color::Cyan, false)
            ));
        }
        output
    }

    fn format_json(
        &self,
        cards: &HashMap<DisplayTarget, String>,
        hidden: &[DisplayTarget],
    ) -> Result<String> {
        let mut object = Map::new();
        for target in visible(hidden) {
            let value = cards
                .get(&target)
                .map(|text| Value::String(text.clone()))
                .unwrap_or(Value::Null);
            object.insert(target.id().to_string(), value);
        }
        Ok(serde_json::to_string(&Value::Object(object))?)
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold, self.colored);
            text.to_string()
        }
    }
}

fn visible(hidden: &[DisplayTarget]) -> impl Iterator<Item = DisplayTarget> + '_ {
    DisplayTarget::ALL
        .into_iter()
        .filter(move |target| !hidden.contains(target))
}
