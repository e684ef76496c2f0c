// 🪄 AI Prompt Configuration
// Per-field prompt text for the tender editor's generate buttons
//
// Only the configuration lives here; nothing in this crate calls a generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptField {
    Description,
    Objective,
    ScopeOfWork,
    EligibilityCriteria,
}

impl PromptField {
    pub const ALL: [PromptField; 4] = [
        PromptField::Description,
        PromptField::Objective,
        PromptField::ScopeOfWork,
        PromptField::EligibilityCriteria,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptField::Description => "description",
            PromptField::Objective => "objective",
            PromptField::ScopeOfWork => "scope_of_work",
            PromptField::EligibilityCriteria => "eligibility_criteria",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromptField::Description => "Description",
            PromptField::Objective => "Objective",
            PromptField::ScopeOfWork => "Scope of Work",
            PromptField::EligibilityCriteria => "Eligibility Criteria",
        }
    }
}

impl FromStr for PromptField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptField::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| format!("field {:?} has no configurable prompt", s))
    }
}

/// Stored prompt row (`ai_prompts` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPrompt {
    pub id: String,
    pub field_name: String,
    pub prompt_text: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

impl AiPrompt {
    pub fn new(field: PromptField, prompt_text: &str) -> Self {
        AiPrompt {
            id: uuid::Uuid::new_v4().to_string(),
            field_name: field.as_str().to_string(),
            prompt_text: prompt_text.to_string(),
            description: format!("Prompt used to generate the {} section", field.label()),
            updated_at: Utc::now(),
        }
    }
}

/// field → prompt text, as loaded for one screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptSet {
    prompts: HashMap<PromptField, String>,
}

impl PromptSet {
    /// Rows for unknown fields are ignored
    pub fn from_rows(rows: &[AiPrompt]) -> Self {
        let prompts = rows
            .iter()
            .filter_map(|row| {
                row.field_name
                    .parse::<PromptField>()
                    .ok()
                    .map(|field| (field, row.prompt_text.clone()))
            })
            .collect();
        PromptSet { prompts }
    }

    pub fn get(&self, field: PromptField) -> Option<&str> {
        self.prompts.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Fields that still have no stored prompt
    pub fn missing(&self) -> Vec<PromptField> {
        PromptField::ALL
            .into_iter()
            .filter(|f| !self.prompts.contains_key(f))
            .collect()
    }
}
