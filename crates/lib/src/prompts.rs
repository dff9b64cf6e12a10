//! Prompt templates. All model-facing text lives here so tuning prompts
//! never touches pipeline control flow.

use crate::crm::{Category, CategoryId, PHOTO_CREATABLE, SUPPORTED_CATEGORIES};
use crate::intent::ActionHint;

/// Numbered module lines for classifier prompts: api name, current plural
/// label, and the static synonym vocabulary.
fn module_lines(catalog: &[Category]) -> String {
    catalog
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {} ({}) - {}",
                i + 1,
                c.id.api_name(),
                c.plural_label,
                c.id.synonyms()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn required_field_lines() -> String {
    SUPPORTED_CATEGORIES
        .into_iter()
        .map(|c| format!("- {}: {}", c.api_name(), c.required_fields().join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

const READ_FORMAT: &str = r#"Return JSON: {"action": "READ", "module": "Module_Name"}"#;
const CREATE_FORMAT: &str =
    r#"Return JSON: {"action": "CREATE", "module": "Module_Name", "data": {...}, "missing": [...]}"#;

/// System prompt for intent classification and text-path field extraction.
/// The provisional hint from the rule stage, when present, pins the action so
/// the model only resolves the module (and extracts fields for creates).
pub fn classifier_system_prompt(catalog: &[Category], hint: Option<ActionHint>) -> String {
    let mut prompt = String::from(
        "You are a CRM assistant for Keja Homes, a property management company. \
         Analyze the user request.\n\n",
    );
    if let Some(hint) = hint {
        let action = match hint {
            ActionHint::Read => "READ",
            ActionHint::Create => "CREATE",
        };
        prompt.push_str(&format!("ACTION: {}\n\n", action));
    }
    prompt.push_str("MODULES:\n");
    prompt.push_str(&module_lines(catalog));
    prompt.push_str("\n\n");
    match hint {
        Some(ActionHint::Read) => {
            prompt.push_str(READ_FORMAT);
        }
        Some(ActionHint::Create) => {
            prompt.push_str("REQUIRED FIELDS FOR CREATING:\n");
            prompt.push_str(&required_field_lines());
            prompt.push_str("\n\nExtract values the user provided, e.g. \"create booking for Ahmed in unit 701 for 50000\" fills First_Name, Unit and Amount. List required fields the user did not provide in \"missing\".\n\n");
            prompt.push_str(CREATE_FORMAT);
        }
        None => {
            prompt.push_str("If the user wants to add data:\n");
            prompt.push_str("REQUIRED FIELDS FOR CREATING:\n");
            prompt.push_str(&required_field_lines());
            prompt.push_str("\n\n");
            prompt.push_str(CREATE_FORMAT);
            prompt.push_str("\n\nIf the user is asking a question about existing data:\n");
            prompt.push_str(READ_FORMAT);
        }
    }
    prompt.push_str("\n\nIf no module clearly matches, return {\"action\": \"READ\", \"module\": \"UNKNOWN\"}.\nReturn ONLY valid JSON.");
    prompt
}

/// System prompt for the read-explanation step. `sampled` is true when the
/// backend matched more rows than were forwarded.
pub fn narrative_system_prompt(today: &str, sampled: bool) -> String {
    let mut prompt = format!(
        "You are the Keja Homes assistant for a property management company in Kenya \
         managing SkyWay Building. Today: {}.\n\n\
         CRITICAL RULES:\n\
         1. ALWAYS use Kenyan Shillings (KES) - NEVER use dollar signs ($)\n\
         2. Format amounts as: KES 1,495,826.50\n\
         3. When calculating totals, sum ALL numeric values from the relevant field\n\
         4. Double-check all calculations - be accurate\n\
         5. Be specific with names, dates, amounts\n\
         6. Keep responses concise but informative\n\n\
         IMPORTANT DATA INTERPRETATION:\n\
         - The \"Units\" field contains unit numbers separated by semicolons (;)\n\
         - Example: \"201; 204; 205; 507\" means 4 units, not 1 unit\n\
         - When asked how many units, split on the semicolon and COUNT each unit number\n\
         - Always list all unit numbers when relevant\n",
        today
    );
    if sampled {
        prompt.push_str(
            "\nSAMPLE LIMIT:\n\
             - The data below is only a sample of the matching records\n\
             - Do NOT claim totals, counts or aggregations are complete; \
             state that they cover the provided sample only\n",
        );
    } else {
        prompt.push_str(
            "\nThe data below contains ALL matching records; aggregations must cover every row.\n",
        );
    }
    prompt
}

/// User message for the read-explanation step.
pub fn narrative_user_message(
    question: &str,
    category: CategoryId,
    total: usize,
    forwarded: usize,
    rows_json: &str,
) -> String {
    format!(
        "Question: {}\n\nModule: {}\nTotal Records: {}\nRecords Provided: {}\n\nData:\n{}",
        question,
        category.api_name(),
        total,
        forwarded,
        rows_json
    )
}

/// System prompt for photo-based extraction.
pub fn vision_system_prompt() -> String {
    let modules = PHOTO_CREATABLE
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {} (fields: {})",
                i + 1,
                c.api_name(),
                c.required_fields().join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are the Keja Homes data extraction assistant. Extract data from this \
         form/document image.\n\n\
         MODULES YOU CAN CREATE RECORDS IN:\n{}\n\n\
         INSTRUCTIONS:\n\
         1. Look at the image carefully\n\
         2. Identify what type of form/document it is\n\
         3. Extract ALL visible data fields\n\
         4. Determine which module this data belongs to\n\
         5. Return JSON with the extracted data\n\n\
         RETURN FORMAT:\n\
         {{\"module\": \"Module_Name\", \"action\": \"CREATE\", \"data\": {{\"Field1\": \"value1\"}}, \
         \"summary\": \"Brief description of what was extracted\"}}\n\n\
         If you cannot read the image clearly, return:\n\
         {{\"module\": \"UNKNOWN\", \"action\": \"ERROR\", \"error\": \"Description of the problem\"}}\n\n\
         IMPORTANT: Use KES for currency. Dates should be YYYY-MM-DD format.",
        modules
    )
}

/// User text accompanying the photo payload.
pub fn vision_user_text(caption: &str) -> String {
    let caption = caption.trim();
    if caption.is_empty() {
        "Please extract data from this form/document.".to_string()
    } else {
        format!("Additional context: {}", caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::filter_catalog;

    fn static_catalog() -> Vec<Category> {
        filter_catalog(&[])
    }

    #[test]
    fn classifier_prompt_pins_the_hinted_action() {
        let p = classifier_system_prompt(&static_catalog(), Some(ActionHint::Read));
        assert!(p.contains("ACTION: READ"));
        assert!(!p.contains("REQUIRED FIELDS"));

        let p = classifier_system_prompt(&static_catalog(), Some(ActionHint::Create));
        assert!(p.contains("ACTION: CREATE"));
        assert!(p.contains("- Bookings: First_Name, Unit, Amount, Checked_in, Checked_out"));
    }

    #[test]
    fn unhinted_prompt_offers_both_formats() {
        let p = classifier_system_prompt(&static_catalog(), None);
        assert!(!p.contains("ACTION:"));
        assert!(p.contains(r#""action": "READ""#));
        assert!(p.contains(r#""action": "CREATE""#));
    }

    #[test]
    fn classifier_prompt_lists_all_13_modules() {
        let p = classifier_system_prompt(&static_catalog(), None);
        for c in SUPPORTED_CATEGORIES {
            assert!(p.contains(c.api_name()), "missing {}", c.api_name());
        }
        assert!(p.contains("13. "));
    }

    #[test]
    fn narrative_prompt_instructs_semicolon_splitting() {
        let p = narrative_system_prompt("2026-08-06", false);
        assert!(p.contains("separated by semicolons"));
        assert!(p.contains("means 4 units, not 1 unit"));
        assert!(p.contains("KES"));
        assert!(p.contains("ALL matching records"));
    }

    #[test]
    fn sampled_narrative_prompt_forbids_completeness_claims() {
        let p = narrative_system_prompt("2026-08-06", true);
        assert!(p.contains("only a sample"));
        assert!(p.contains("Do NOT claim"));
    }

    #[test]
    fn vision_prompt_enumerates_the_photo_creatable_modules() {
        let p = vision_system_prompt();
        for c in PHOTO_CREATABLE {
            assert!(p.contains(c.api_name()), "missing {}", c.api_name());
        }
        assert!(!p.contains("Rental_Payments"));
        assert!(p.contains(r#""action": "ERROR""#));
    }

    #[test]
    fn vision_user_text_uses_caption_when_present() {
        assert_eq!(
            vision_user_text(" booking form "),
            "Additional context: booking form"
        );
        assert_eq!(
            vision_user_text(""),
            "Please extract data from this form/document."
        );
    }
}
