//! Food diary selection and grouping.

use crate::{FoodDiaryEntry, FoodItem, MealType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grams in one portion.
pub const GRAMS_PER_PORTION: f64 = 100.0;

/// A food picked for the entry being composed. `portion_size` counts
/// 100 g portions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFood {
    #[serde(alias = "food_item_id")]
    pub food_item_id: u64,
    #[serde(alias = "portion_size")]
    pub portion_size: f64,
}

/// Items staged by the detection screen for the food diary.
pub type HandoffItem = SelectedFood;

/// Add `grams` of a food, accumulating onto an existing selection.
pub fn add_food(selection: &mut Vec<SelectedFood>, food_item_id: u64, grams: f64) {
    let portions = grams / GRAMS_PER_PORTION;
    match selection.iter_mut().find(|f| f.food_item_id == food_item_id) {
        Some(existing) => existing.portion_size += portions,
        None => selection.push(SelectedFood {
            food_item_id,
            portion_size: portions,
        }),
    }
}

pub fn remove_food(selection: &mut Vec<SelectedFood>, food_item_id: u64) {
    selection.retain(|f| f.food_item_id != food_item_id);
}

/// Append hand-off items whose food is not selected yet. Returns how many
/// were added.
pub fn merge_handoff(selection: &mut Vec<SelectedFood>, handoff: &[HandoffItem]) -> usize {
    let mut added = 0;
    for item in handoff {
        if selection.iter().any(|f| f.food_item_id == item.food_item_id) {
            continue;
        }
        selection.push(*item);
        added += 1;
    }
    added
}

/// kcal of the selection. Foods missing from `catalog` contribute nothing.
pub fn selection_calories(selection: &[SelectedFood], catalog: &[FoodItem]) -> f64 {
    selection
        .iter()
        .filter_map(|f| {
            catalog
                .iter()
                .find(|item| item.id == f.food_item_id)
                .map(|item| item.calories * f.portion_size)
        })
        .sum()
}

/// Display name for a raw meal type string. Unknown types are upper-cased.
pub fn meal_type_label(raw: &str) -> String {
    match MealType::parse(raw) {
        Some(meal) => meal.label().to_string(),
        None => raw.to_uppercase(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MealGroup<'a> {
    pub meal_type: MealType,
    pub label: &'static str,
    pub entries: Vec<&'a FoodDiaryEntry>,
    pub calories: f64,
}

/// Group a day's entries by meal, in breakfast/lunch/dinner/snack order.
pub fn group_by_meal(entries: &[FoodDiaryEntry]) -> Vec<MealGroup<'_>> {
    let mut groups: BTreeMap<MealType, Vec<&FoodDiaryEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.meal_type).or_default().push(entry);
    }
    groups
        .into_iter()
        .map(|(meal_type, entries)| MealGroup {
            meal_type,
            label: meal_type.label(),
            calories: entries.iter().map(|e| e.calories()).sum(),
            entries,
        })
        .collect()
}

/// Ids of every entry of one meal, for deleting the whole group.
pub fn entry_ids_for_meal(entries: &[FoodDiaryEntry], meal: MealType) -> Vec<u64> {
    entries
        .iter()
        .filter(|e| e.meal_type == meal)
        .map(|e| e.id)
        .collect()
}

pub fn day_calories(entries: &[FoodDiaryEntry]) -> f64 {
    entries.iter().map(FoodDiaryEntry::calories).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FoodInput, FoodItemRef};
    use chrono::NaiveDate;

    fn item(id: u64, calories: f64) -> FoodItem {
        FoodItem {
            id,
            name: format!("food {id}"),
            image: None,
            calories,
            category_id: None,
            gram_per_serving: None,
        }
    }

    fn entry(id: u64, meal: MealType, kcal: f64, portion: f64) -> FoodDiaryEntry {
        FoodDiaryEntry {
            id,
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            meal_type: meal,
            notes: None,
            food_inputs: vec![FoodInput {
                id: None,
                food_item: FoodItemRef {
                    name: "x".into(),
                    calories: kcal,
                },
                portion_size: portion,
            }],
        }
    }

    #[test]
    fn add_food_converts_grams_and_accumulates() {
        let mut sel = Vec::new();
        add_food(&mut sel, 3, 150.0);
        add_food(&mut sel, 3, 50.0);
        add_food(&mut sel, 4, 100.0);
        assert_eq!(sel.len(), 2);
        assert_eq!(sel[0].portion_size, 2.0);
        assert_eq!(sel[1].portion_size, 1.0);
        remove_food(&mut sel, 3);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn selection_calories_ignores_unknown_items() {
        let sel = vec![
            SelectedFood {
                food_item_id: 1,
                portion_size: 1.5,
            },
            SelectedFood {
                food_item_id: 99,
                portion_size: 2.0,
            },
        ];
        assert_eq!(selection_calories(&sel, &[item(1, 130.0)]), 195.0);
    }

    #[test]
    fn handoff_skips_already_selected_foods() {
        let mut sel = vec![SelectedFood {
            food_item_id: 1,
            portion_size: 1.0,
        }];
        let handoff = [
            SelectedFood {
                food_item_id: 1,
                portion_size: 3.0,
            },
            SelectedFood {
                food_item_id: 2,
                portion_size: 0.5,
            },
        ];
        assert_eq!(merge_handoff(&mut sel, &handoff), 1);
        assert_eq!(sel[0].portion_size, 1.0);
        assert_eq!(sel[1].food_item_id, 2);
    }

    #[test]
    fn handoff_items_use_camel_case_keys() {
        let v = serde_json::to_value(SelectedFood {
            food_item_id: 5,
            portion_size: 1.2,
        })
        .unwrap();
        assert_eq!(v, serde_json::json!({"foodItemId": 5, "portionSize": 1.2}));
    }

    #[test]
    fn meal_labels() {
        assert_eq!(meal_type_label("breakfast"), "Sarapan");
        assert_eq!(meal_type_label("Dinner"), "Makan Malam");
        assert_eq!(meal_type_label("brunch"), "BRUNCH");
    }

    #[test]
    fn groups_follow_meal_order() {
        let entries = vec![
            entry(1, MealType::Snack, 100.0, 1.0),
            entry(2, MealType::Breakfast, 200.0, 1.0),
            entry(3, MealType::Snack, 50.0, 2.0),
        ];
        let groups = group_by_meal(&entries);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].meal_type, MealType::Breakfast);
        assert_eq!(groups[1].label, "Camilan");
        assert_eq!(groups[1].calories, 200.0);
        assert_eq!(entry_ids_for_meal(&entries, MealType::Snack), vec![1, 3]);
        assert_eq!(day_calories(&entries), 400.0);
    }
}
