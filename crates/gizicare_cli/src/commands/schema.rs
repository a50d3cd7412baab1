use crate::cli::SchemaPayload;
use crate::error::CliResult;
use gizicare_client::{ExerciseLog, IntakeLog, NewFoodDiaryEntry, ProfileInput, StepsSleepLog};

/// JSON schema of a request body, always printed as JSON.
pub(super) fn run(payload: SchemaPayload) -> CliResult<String> {
    let schema = match payload {
        SchemaPayload::Profile => schemars::schema_for!(ProfileInput),
        SchemaPayload::Exercise => schemars::schema_for!(ExerciseLog),
        SchemaPayload::StepsSleep => schemars::schema_for!(StepsSleepLog),
        SchemaPayload::Intake => schemars::schema_for!(IntakeLog),
        SchemaPayload::FoodEntry => schemars::schema_for!(NewFoodDiaryEntry),
    };
    Ok(serde_json::to_string_pretty(&schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_schema_lists_fields() {
        let text = run(SchemaPayload::Profile).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let props = value["properties"].as_object().unwrap();
        for field in ["name", "weight", "height", "age", "gender", "activity_level"] {
            assert!(props.contains_key(field), "missing {field}");
        }
    }
}
