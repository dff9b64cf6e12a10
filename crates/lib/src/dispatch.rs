//! Dispatcher: turns a resolved intent into backend calls and reply text.
//!
//! Everything here is pure over already-fetched data; the pipeline owns the
//! HTTP calls. Greeting, listing and capability replies are fixed texts that
//! never touch the backend. One user turn is one attempt — no retries.

use crate::crm::{CategoryId, RecordMap, WriteResponse};

/// Page size requested from the backend on reads.
pub const READ_PAGE_SIZE: usize = 200;

/// Maximum rows forwarded to the narration step.
pub const FORWARD_CAP: usize = 100;

/// Canned greeting reply chosen by sub-pattern (thanks / hello / bye /
/// acknowledgement / default).
pub fn greeting_reply(text: &str) -> String {
    let normalized = text.trim().trim_end_matches('!').trim().to_lowercase();
    if normalized.contains("thank") {
        return "You're welcome! Let me know if you need anything else about SkyWay Building."
            .to_string();
    }
    match normalized.as_str() {
        "hi" | "hello" | "hey" => "Hello! I'm your Keja Homes assistant. I can help you with:\n\
             - Bookings and reservations\n\
             - Tenants and owners info\n\
             - Monthly rent and payments\n\
             - Property units and availability\n\n\
             What would you like to know?"
            .to_string(),
        "bye" | "goodbye" => {
            "Goodbye! Feel free to message me anytime you need help with SkyWay Building."
                .to_string()
        }
        "ok" | "okay" | "cool" | "great" | "nice" | "awesome" | "perfect" | "alright"
        | "got it" => "Great! Let me know if you need anything else.".to_string(),
        _ => "Hi! How can I help you with SkyWay Building today?".to_string(),
    }
}

/// Fixed, business-line-grouped listing of the 13 supported categories.
/// Deliberately independent of whatever the backend catalog returned.
pub fn category_listing() -> String {
    "Available Modules:\n\n\
     AIRBNB/SHORT-TERM:\n\
     1. Bookings\n\
     2. Guests Database\n\
     3. Property Units\n\
     4. Airbnb Services\n\
     5. Airbnb Water Bills\n\n\
     LONG-TERM RENTALS:\n\
     6. Tenants\n\
     7. Monthly Rent\n\
     8. Rental Properties\n\
     9. Lease Management\n\
     10. Rental Services\n\
     11. Rental Water Bills\n\
     12. Rental Payments\n\n\
     OWNERS:\n\
     13. Unit Owner Database\n\n\
     Ask me about any of these!"
        .to_string()
}

/// Capability summary shown when no category could be resolved.
pub fn capability_summary() -> String {
    "I'm not sure what you're asking about. Here are things I can help with:\n\n\
     AIRBNB/SHORT-TERM:\n\
     - Bookings (reservations, check-ins, commissions)\n\
     - Guests (guest info)\n\
     - Property Units (units, rooms, rates)\n\
     - Airbnb Services (cleaning)\n\
     - Airbnb Water Bills\n\n\
     LONG-TERM RENTALS:\n\
     - Tenants\n\
     - Monthly Rent\n\
     - Rental Properties\n\
     - Lease Management\n\
     - Rental Services\n\
     - Rental Water Bills\n\
     - Rental Payments\n\n\
     OWNERS:\n\
     - Unit Owner Database\n\n\
     Try: 'Show all bookings' or 'List tenants'"
        .to_string()
}

/// Numbered clarification for missing required fields. Sent instead of any
/// backend write.
pub fn missing_fields_clarification(category: CategoryId, missing: &[&str]) -> String {
    let fields = missing
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. {}", i + 1, f.replace('_', " ")))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "To create a record in {}, I need:\n\n{}\n\nPlease provide these details.",
        category.label(),
        fields
    )
}

/// Generic prompt when a create was asked for but neither category nor data
/// could be determined.
pub fn create_details_prompt() -> String {
    "Please provide the details for the record you want to create. For example:\n\
     \"Create booking for Ahmed in unit 701 for KES 50000 from Jan 1 to Jan 15\""
        .to_string()
}

/// Fixed zero-result message; the narration model is never consulted for it.
pub fn no_records_message(category: CategoryId) -> String {
    format!(
        "No records found in {}. The module might be empty.",
        category.label()
    )
}

/// What a read dispatches into after the fetch: either the terminal
/// zero-result message, or rows for the narration step.
#[derive(Debug)]
pub enum ReadPlan {
    NoRecords(String),
    Narrate { total: usize, rows: Vec<RecordMap> },
}

/// Decide the read continuation from fetched records.
pub fn plan_read(category: CategoryId, records: Vec<RecordMap>) -> ReadPlan {
    let total = records.len();
    let rows = prepare_rows(records);
    if rows.is_empty() {
        ReadPlan::NoRecords(no_records_message(category))
    } else {
        ReadPlan::Narrate { total, rows }
    }
}

/// Trim fetched records for the model: drop internal/audit fields
/// (`$`-prefixed, id, Created_*, Modified_*), flatten lookup objects to their
/// display name, drop other nested values, and cap the row count.
pub fn prepare_rows(records: Vec<RecordMap>) -> Vec<RecordMap> {
    records
        .into_iter()
        .take(FORWARD_CAP)
        .map(|record| {
            let mut row = RecordMap::new();
            for (key, value) in record {
                if key.starts_with('$')
                    || key == "id"
                    || key.contains("Created_")
                    || key.contains("Modified_")
                {
                    continue;
                }
                match value {
                    serde_json::Value::Object(obj) => {
                        if let Some(name) = obj.get("name").and_then(|n| n.as_str()) {
                            row.insert(key, serde_json::Value::String(name.to_string()));
                        }
                    }
                    serde_json::Value::Array(_) | serde_json::Value::Null => {}
                    scalar => {
                        row.insert(key, scalar);
                    }
                }
            }
            row
        })
        .collect()
}

/// Interpret a write response for the text-path create.
pub fn interpret_write(category: CategoryId, res: &WriteResponse) -> String {
    if let Some(item) = res.data.as_ref().and_then(|d| d.first()) {
        if item.status.as_deref() == Some("success") {
            let id = item.record_id().unwrap_or_else(|| "unknown".to_string());
            return format!(
                "Successfully created record in {}!\n\nRecord ID: {}",
                category.label(),
                id
            );
        }
    }
    if let Some(code) = res.code.as_deref() {
        let detail = res.message.as_deref().unwrap_or(code);
        return format!("Error creating record: {}", detail);
    }
    "Record creation completed. Please check the CRM to verify.".to_string()
}

/// Interpret a write response for the photo-path create, carrying the vision
/// model's extraction summary through to the user.
pub fn interpret_photo_write(
    category: CategoryId,
    summary: Option<&str>,
    res: &WriteResponse,
) -> String {
    let extracted = summary
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("\n\nExtracted: {}", s))
        .unwrap_or_default();
    if let Some(item) = res.data.as_ref().and_then(|d| d.first()) {
        if item.status.as_deref() == Some("success") {
            let id = item.record_id().unwrap_or_else(|| "unknown".to_string());
            return format!(
                "Successfully created record from your photo!\n\nModule: {}\nRecord ID: {}{}",
                category.label(),
                id,
                extracted
            );
        }
    }
    if let Some(code) = res.code.as_deref() {
        let detail = res.message.as_deref().unwrap_or(code);
        return format!(
            "Error creating record: {}\n\nPlease check if all required fields were in the photo.",
            detail
        );
    }
    format!(
        "Record creation attempted. Please check the CRM to verify.{}",
        extracted
    )
}

/// Guidance when the photo could not be interpreted. Distinct wording from
/// the text-path capability summary.
pub fn photo_unrecognized_message() -> String {
    "I couldn't understand the form in your photo.\n\n\
     Please make sure:\n\
     1. The photo is clear and well-lit\n\
     2. All text is readable\n\
     3. It's a form I recognize (booking, guest, tenant, rent, owner)\n\n\
     You can also add a caption to help, like: 'This is a booking form'"
        .to_string()
}

/// A concrete problem the vision model reported with the image.
pub fn photo_error_message(error: &str) -> String {
    format!("Error processing photo: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_sub_patterns() {
        assert!(greeting_reply("thanks").starts_with("You're welcome!"));
        assert!(greeting_reply("Thank you!").starts_with("You're welcome!"));
        assert!(greeting_reply("hi").starts_with("Hello! I'm your Keja Homes assistant"));
        assert!(greeting_reply("hello!").starts_with("Hello!"));
        assert!(greeting_reply("bye").starts_with("Goodbye!"));
        assert_eq!(
            greeting_reply("got it"),
            "Great! Let me know if you need anything else."
        );
        assert_eq!(
            greeting_reply("good morning"),
            "Hi! How can I help you with SkyWay Building today?"
        );
    }

    #[test]
    fn listing_is_the_fixed_grouped_13_category_text() {
        let listing = category_listing();
        assert!(listing.starts_with("Available Modules:"));
        for header in ["AIRBNB/SHORT-TERM:", "LONG-TERM RENTALS:", "OWNERS:"] {
            assert!(listing.contains(header), "missing {}", header);
        }
        assert!(listing.contains("13. Unit Owner Database"));
        // 13 numbered entries, no more.
        assert_eq!(listing.matches(". ").count(), 13);
        assert!(!listing.contains("14."));
    }

    #[test]
    fn clarification_lists_exactly_the_missing_fields_numbered() {
        let msg =
            missing_fields_clarification(CategoryId::Bookings, &["Checked_in", "Checked_out"]);
        assert_eq!(
            msg,
            "To create a record in Bookings, I need:\n\n1. Checked in\n2. Checked out\n\nPlease provide these details."
        );
    }

    #[test]
    fn zero_rows_short_circuits_without_narration() {
        match plan_read(CategoryId::Tenants, Vec::new()) {
            ReadPlan::NoRecords(msg) => {
                assert_eq!(msg, "No records found in Tenants. The module might be empty.")
            }
            ReadPlan::Narrate { .. } => panic!("zero rows must not reach narration"),
        }
    }

    #[test]
    fn prepare_rows_strips_internal_fields_and_flattens_lookups() {
        let record: RecordMap = serde_json::from_str(
            r#"{
                "$approved": true,
                "id": "123",
                "Created_Time": "2026-01-01",
                "Modified_By": "x",
                "Owner": {"name": "Daniel Chege", "id": "9"},
                "Tags": ["a", "b"],
                "Empty": null,
                "Unit": "701",
                "Amount": 50000
            }"#,
        )
        .expect("parse");
        let rows = prepare_rows(vec![record]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.len(), 3);
        assert_eq!(row["Owner"], "Daniel Chege");
        assert_eq!(row["Unit"], "701");
        assert_eq!(row["Amount"], 50000);
    }

    #[test]
    fn prepare_rows_caps_forwarded_rows() {
        let records: Vec<RecordMap> = (0..150)
            .map(|i| {
                let mut m = RecordMap::new();
                m.insert("Unit".to_string(), serde_json::Value::from(i));
                m
            })
            .collect();
        assert_eq!(prepare_rows(records).len(), FORWARD_CAP);
    }

    #[test]
    fn backend_error_code_is_surfaced_verbatim() {
        let res: WriteResponse =
            serde_json::from_str(r#"{"code":"INVALID_DATA","message":"Unit not found"}"#)
                .expect("parse");
        assert_eq!(
            interpret_write(CategoryId::Bookings, &res),
            "Error creating record: Unit not found"
        );
    }

    #[test]
    fn successful_write_reports_the_generated_id() {
        let res: WriteResponse = serde_json::from_str(
            r#"{"data":[{"status":"success","details":{"id":"5725767000001052001"}}]}"#,
        )
        .expect("parse");
        assert_eq!(
            interpret_write(CategoryId::Bookings, &res),
            "Successfully created record in Bookings!\n\nRecord ID: 5725767000001052001"
        );
    }

    #[test]
    fn ambiguous_write_shape_advises_manual_verification() {
        let res: WriteResponse = serde_json::from_str(r#"{"data":[{"status":"pending"}]}"#)
            .expect("parse");
        assert_eq!(
            interpret_write(CategoryId::Bookings, &res),
            "Record creation completed. Please check the CRM to verify."
        );
    }

    #[test]
    fn photo_write_success_includes_module_and_summary() {
        let res: WriteResponse = serde_json::from_str(
            r#"{"data":[{"status":"success","details":{"id":"42"}}]}"#,
        )
        .expect("parse");
        let msg = interpret_photo_write(
            CategoryId::GuestsDatabase,
            Some("Guest passport details"),
            &res,
        );
        assert!(msg.starts_with("Successfully created record from your photo!"));
        assert!(msg.contains("Module: Guests Database"));
        assert!(msg.contains("Record ID: 42"));
        assert!(msg.ends_with("Extracted: Guest passport details"));
    }

    #[test]
    fn photo_write_error_adds_required_field_guidance() {
        let res: WriteResponse =
            serde_json::from_str(r#"{"code":"MANDATORY_NOT_FOUND","message":"Last_Name missing"}"#)
                .expect("parse");
        let msg = interpret_photo_write(CategoryId::GuestsDatabase, None, &res);
        assert!(msg.starts_with("Error creating record: Last_Name missing"));
        assert!(msg.contains("required fields were in the photo"));
    }
}
