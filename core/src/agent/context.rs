use crate::tools::planning::PLAN_SECTIONS;
use crate::traits::{ChatMessage, ToolSpec};
use chrono::NaiveDate;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const PROFILE_MAX_CHARS: usize = 20_000;
const PROFILE_FILE: &str = "TRAVELER.md";

const PLANNER_PROMPT: &str = "You are an expert travel agent and expense planner. You help users plan trips to any city in the world using real-time data, and you always answer with a complete, ready-to-use plan in a single well-structured Markdown document. Never reply with \"I'll prepare that\" or \"hold on\".

Every plan includes:
- A day-by-day itinerary with morning, afternoon and evening activities.
- Specific attractions with short descriptions, opening times, entry fees and tips.
- Two or three places to eat per day with cuisine, typical prices and location. Prefer local, authentic, budget-conscious options unless told otherwise.
- A line-by-line cost breakdown (accommodation, food, transport, attractions, extras) with a daily and an overall total, converted into the traveler's paying currency.
- Transport guidance between places with modes, durations and costs, including airport transfers when relevant.
- A weather summary for each day with temperature, rain chance and advisories.

Use the tools for weather, search, prices and all arithmetic. If real-time data is unavailable, say so plainly and suggest the best alternative instead of guessing.

Use Markdown headings, bullet points, numbered lists and tables where helpful, with a bold heading per day. Keep the tone friendly, knowledgeable and professional. End with a tip about what clothes and shoes to wear for the forecast weather, and whether to carry an umbrella.";

/// Assembles the system prompt and the opening messages of a session.
pub struct ContextBuilder {
    pub workspace: PathBuf,
    pub tool_specs: Vec<ToolSpec>,
    pub today: NaiveDate,
}

impl ContextBuilder {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
            tool_specs: vec![],
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_tool_specs(mut self, tool_specs: Vec<ToolSpec>) -> Self {
        self.tool_specs = tool_specs;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn build_system_prompt(&self) -> String {
        let mut parts = vec![PLANNER_PROMPT.to_string(), self.get_plan_outline()];

        if let Some(tools) = self.get_tool_instructions() {
            parts.push(tools);
        }

        parts.push(self.get_runtime_context());

        if let Some(profile) = self.load_traveler_profile() {
            parts.push(profile);
        }

        parts.join("\n\n---\n\n")
    }

    fn get_plan_outline(&self) -> String {
        let mut outline = String::from("## Document Outline\n\nOrder the final plan as:\n");
        for (i, section) in PLAN_SECTIONS.iter().enumerate() {
            let _ = writeln!(outline, "{}. {}", i + 1, section);
        }
        outline
    }

    fn get_tool_instructions(&self) -> Option<String> {
        if self.tool_specs.is_empty() {
            return None;
        }

        let mut instructions = String::from("## Available Tools\n\n");
        for tool in &self.tool_specs {
            let _ = writeln!(instructions, "- **{}**: {}", tool.name, tool.description);
        }
        instructions.push_str(
            "\nIf you cannot call tools natively, wrap a JSON object in <tool_call> tags:\n\n",
        );
        instructions.push_str(
            "<tool_call>\n{\"name\": \"get_weather_forecast\", \"arguments\": {\"city\": \"Venice\", \"days\": 5}}\n</tool_call>\n",
        );

        Some(instructions)
    }

    fn get_runtime_context(&self) -> String {
        format!(
            "## Runtime Context\n\nToday is {}.",
            self.today.format("%Y-%m-%d (%A)")
        )
    }

    fn load_traveler_profile(&self) -> Option<String> {
        let content = std::fs::read_to_string(self.workspace.join(PROFILE_FILE)).ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }

        let profile = if trimmed.chars().count() > PROFILE_MAX_CHARS {
            let truncated: String = trimmed.chars().take(PROFILE_MAX_CHARS).collect();
            format!("{truncated}\n\n[... truncated at {PROFILE_MAX_CHARS} chars]")
        } else {
            trimmed.to_string()
        };

        Some(format!("## Traveler Profile ({PROFILE_FILE})\n\n{profile}"))
    }

    /// The initial history of a session: system prompt, then the request.
    pub fn build_messages(&self, request: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.build_system_prompt()),
            ChatMessage::user(request.trim()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Role;
    use tempfile::TempDir;

    fn builder(tmp: &TempDir) -> ContextBuilder {
        ContextBuilder::new(tmp.path()).with_today(NaiveDate::from_ymd_opt(2025, 7, 14).unwrap())
    }

    #[test]
    fn messages_start_with_system_then_user() {
        let tmp = TempDir::new().unwrap();
        let messages = builder(&tmp).build_messages("  5 days in Venice  ");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "5 days in Venice");
    }

    #[test]
    fn prompt_has_date_and_outline() {
        let tmp = TempDir::new().unwrap();
        let prompt = builder(&tmp).build_system_prompt();
        assert!(prompt.contains("Today is 2025-07-14 (Monday)."));
        assert!(prompt.contains("7. 📅 Full Day-wise Itinerary"));
        assert!(!prompt.contains("## Available Tools"));
        assert!(!prompt.contains("Traveler Profile"));
    }

    #[test]
    fn prompt_lists_tools() {
        let tmp = TempDir::new().unwrap();
        let prompt = builder(&tmp)
            .with_tool_specs(vec![ToolSpec::new("add", "Add two numbers", &[])])
            .build_system_prompt();
        assert!(prompt.contains("- **add**: Add two numbers"));
        assert!(prompt.contains("<tool_call>"));
    }

    #[test]
    fn prompt_includes_traveler_profile() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("TRAVELER.md"), "Vegetarian, hates early mornings.\n")
            .unwrap();
        let prompt = builder(&tmp).build_system_prompt();
        assert!(prompt.contains("## Traveler Profile (TRAVELER.md)\n\nVegetarian"));
    }
}
