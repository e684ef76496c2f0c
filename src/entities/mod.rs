// Entity Models - records that sit next to tenders
//
// Vendors resolve organization names for the list view; prompts configure
// per-field text generation for the tender editor.

pub mod vendor;
pub mod prompt;

pub use vendor::{Vendor, organization_names, UNNAMED_ORGANIZATION};
pub use prompt::{AiPrompt, PromptField, PromptSet};
