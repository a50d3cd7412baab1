//! Turning detector output into food diary candidates.

use crate::food::HandoffItem;
use crate::{Detection, FoodItem};
use serde::Serialize;

/// One row of the detection review table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectedRow {
    /// `None` when no food item carries the detected label.
    pub food_item_id: Option<u64>,
    pub name: String,
    /// kcal per 100 g portion.
    pub calories: f64,
    pub grams_per_serving: f64,
    pub confidence: f64,
    pub accepted: bool,
    pub servings: f64,
}

impl DetectedRow {
    pub fn is_matched(&self) -> bool {
        self.food_item_id.is_some()
    }

    pub fn total_grams(&self) -> f64 {
        self.grams_per_serving * self.servings
    }

    /// Portion count (100 g units) handed to the food diary.
    pub fn portion_size(&self) -> f64 {
        self.total_grams() / crate::food::GRAMS_PER_PORTION
    }
}

/// Match a detection to a catalogue item by case-insensitive name.
pub fn match_detection(detection: &Detection, catalog: &[FoodItem]) -> DetectedRow {
    let label = detection.label.trim().to_lowercase();
    match catalog.iter().find(|item| item.name.to_lowercase() == label) {
        Some(item) => DetectedRow {
            food_item_id: Some(item.id),
            name: item.name.clone(),
            calories: item.calories,
            grams_per_serving: item.grams_per_serving(),
            confidence: detection.confidence,
            accepted: true,
            servings: 1.0,
        },
        None => DetectedRow {
            food_item_id: None,
            name: format!("Unknown ({})", detection.label),
            calories: 0.0,
            grams_per_serving: 100.0,
            confidence: detection.confidence,
            accepted: true,
            servings: 1.0,
        },
    }
}

pub fn match_detections(detections: &[Detection], catalog: &[FoodItem]) -> Vec<DetectedRow> {
    detections
        .iter()
        .map(|d| match_detection(d, catalog))
        .collect()
}

/// Append new rows, skipping matched foods that are already listed.
/// Unmatched rows are always appended.
pub fn merge_rows(rows: &mut Vec<DetectedRow>, incoming: Vec<DetectedRow>) {
    for row in incoming {
        let duplicate = row
            .food_item_id
            .is_some_and(|id| rows.iter().any(|r| r.food_item_id == Some(id)));
        if !duplicate {
            rows.push(row);
        }
    }
}

/// Accepted, matched rows as hand-off items. Unmatched rows have no food
/// item to log and are dropped with a debug line.
pub fn to_handoff(rows: &[DetectedRow]) -> Vec<HandoffItem> {
    rows.iter()
        .filter(|r| r.accepted)
        .filter_map(|r| match r.food_item_id {
            Some(food_item_id) => Some(HandoffItem {
                food_item_id,
                portion_size: r.portion_size(),
            }),
            None => {
                tracing::debug!("dropping unmatched detection {}", r.name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<FoodItem> {
        vec![
            FoodItem {
                id: 1,
                name: "Nasi Putih".into(),
                image: None,
                calories: 130.0,
                category_id: Some(1),
                gram_per_serving: Some(150.0),
            },
            FoodItem {
                id: 2,
                name: "Tempe".into(),
                image: None,
                calories: 190.0,
                category_id: Some(2),
                gram_per_serving: None,
            },
        ]
    }

    fn det(label: &str) -> Detection {
        Detection {
            class_id: None,
            label: label.into(),
            confidence: 0.9,
        }
    }

    #[test]
    fn matches_case_insensitively() {
        let row = match_detection(&det("  nasi putih "), &catalog());
        assert_eq!(row.food_item_id, Some(1));
        assert_eq!(row.grams_per_serving, 150.0);
        assert_eq!(row.name, "Nasi Putih");
    }

    #[test]
    fn unmatched_detection_is_unknown() {
        let row = match_detection(&det("Rendang"), &catalog());
        assert!(!row.is_matched());
        assert_eq!(row.name, "Unknown (Rendang)");
        assert_eq!(row.calories, 0.0);
        assert_eq!(row.grams_per_serving, 100.0);
    }

    #[test]
    fn merge_skips_known_duplicates_only() {
        let mut rows = match_detections(&[det("tempe"), det("pizza")], &catalog());
        merge_rows(
            &mut rows,
            match_detections(&[det("Tempe"), det("pizza"), det("nasi putih")], &catalog()),
        );
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            ["Tempe", "Unknown (pizza)", "Unknown (pizza)", "Nasi Putih"]
        );
    }

    #[test]
    fn handoff_uses_grams_times_servings() {
        let mut rows = match_detections(&[det("nasi putih"), det("tempe"), det("x")], &catalog());
        rows[0].servings = 2.0;
        rows[1].accepted = false;
        let items = to_handoff(&rows);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].food_item_id, 1);
        assert_eq!(items[0].portion_size, 3.0);
    }
}
