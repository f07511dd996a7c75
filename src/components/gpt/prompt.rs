use crate::error::{config_error, Error};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// System preamble sent with every completion
pub const SYSTEM_PREAMBLE: &str = "You are a calendar assistant. You always answer with a single JSON object describing one Google Calendar event and nothing else.";

const ENGLISH_TEMPLATE: &str = r#"You are a calendar assistant that converts natural language requests into structured calendar events.

Examples:
Input: "Schedule a meeting with John tomorrow at 2 PM for 1 hour"
Output: {
  "summary": "Meeting with John",
  "description": "Meeting with John",
  "start": {
    "dateTime": "2024-01-15T14:00:00",
    "timeZone": "UTC"
  },
  "end": {
    "dateTime": "2024-01-15T15:00:00",
    "timeZone": "UTC"
  },
  "attendees": ["john@example.com"]
}

Input: "Create a reminder for dentist appointment next Friday at 10 AM"
Output: {
  "summary": "Dentist appointment",
  "description": "Dentist appointment reminder",
  "start": {
    "dateTime": "2024-01-19T10:00:00",
    "timeZone": "UTC"
  },
  "end": {
    "dateTime": "2024-01-19T11:00:00",
    "timeZone": "UTC"
  },
  "attendees": []
}

Please convert the following natural language input to a calendar event JSON:
Input: "{input}"

Respond with valid JSON only, following the Google Calendar API event structure."#;

// The example dates are illustrative only; {today} anchors the model.
const JAPANESE_TEMPLATE: &str = r#"次の自然言語文からGoogleカレンダー用のイベント情報を抽出してください。
今日の日付: {today}

例:
入力: "明日の午後2時にジョンとの会議を1時間スケジュール"
出力: {
  "kind": "calendar#event",
  "summary": "ジョンとの会議",
  "description": "ジョンとの会議",
  "location": "",
  "start": {
    "dateTime": "{example_day}T14:00:00+09:00",
    "timeZone": "Asia/Tokyo"
  },
  "end": {
    "dateTime": "{example_day}T15:00:00+09:00",
    "timeZone": "Asia/Tokyo"
  },
  "attendees": ["john@example.com"],
  "colorId": "1"
}

以下の自然言語入力をGoogleカレンダーイベントJSONに変換してください:
入力: "{input}"

有効なJSONのみで応答し、GoogleカレンダーAPIイベント構造に従ってください。"#;

/// Language of the instruction prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptLanguage {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
}

impl FromStr for PromptLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(PromptLanguage::English),
            "ja" | "japanese" => Ok(PromptLanguage::Japanese),
            other => Err(config_error(&format!("Unknown prompt language: {}", other))),
        }
    }
}

impl PromptLanguage {
    /// Instruction template for this language
    pub fn template(&self) -> PromptTemplate {
        match self {
            PromptLanguage::English => PromptTemplate::English,
            PromptLanguage::Japanese => PromptTemplate::Japanese,
        }
    }
}

/// Fixed instruction prompts with worked examples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptTemplate {
    #[default]
    English,
    Japanese,
}

impl PromptTemplate {
    /// Raw template text with its placeholders
    pub fn text(&self) -> &'static str {
        match self {
            PromptTemplate::English => ENGLISH_TEMPLATE,
            PromptTemplate::Japanese => JAPANESE_TEMPLATE,
        }
    }

    /// Fill in the user input and the reference date
    pub fn render(&self, input: &str, today: NaiveDate) -> String {
        let example_day = today.succ_opt().unwrap_or(today);
        self.text()
            .replace("{today}", &today.format("%Y-%m-%d").to_string())
            .replace("{example_day}", &example_day.format("%Y-%m-%d").to_string())
            .replace("{input}", input)
    }
}
