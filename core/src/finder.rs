//! Recipe lookup by available ingredients. Read-only over the catalog.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::models::RecipeIngredientRow;

struct Candidate {
    name: String,
    ingredients: HashSet<String>,
}

/// Group join rows into `recipe id -> (name, ingredient set)`, ordered by id.
/// Recipes without quantity rows never appear.
fn group_by_recipe(rows: Vec<RecipeIngredientRow>) -> BTreeMap<i64, Candidate> {
    let mut grouped: BTreeMap<i64, Candidate> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.recipe_id)
            .or_insert_with(|| Candidate {
                name: row.recipe_name,
                ingredients: HashSet::new(),
            })
            .ingredients
            .insert(row.ingredient_name);
    }
    grouped
}

/// Names of every recipe whose ingredients include all of `required`,
/// ordered by recipe id.
///
/// An empty `required` set matches every recipe that has at least one
/// ingredient.
pub fn find_recipes(db: &Database, required: &BTreeSet<String>) -> Result<Vec<String>> {
    find_recipes_for_meals(db, required, &BTreeSet::new())
}

/// Like [`find_recipes`], additionally requiring the recipe to be served at
/// one of `meals` when that set is non-empty.
pub fn find_recipes_for_meals(
    db: &Database,
    required: &BTreeSet<String>,
    meals: &BTreeSet<String>,
) -> Result<Vec<String>> {
    let candidates = group_by_recipe(db.recipe_ingredient_rows()?);

    let served: Option<HashSet<i64>> = if meals.is_empty() {
        None
    } else {
        Some(
            db.serve_rows()?
                .into_iter()
                .filter(|(_, meal)| meals.contains(meal))
                .map(|(recipe_id, _)| recipe_id)
                .collect(),
        )
    };

    let found: Vec<String> = candidates
        .into_iter()
        .filter(|(id, _)| served.as_ref().is_none_or(|ids| ids.contains(id)))
        .filter(|(_, c)| required.iter().all(|name| c.ingredients.contains(name)))
        .map(|(_, c)| c.name)
        .collect();

    debug!(?required, ?meals, matches = found.len(), "recipe search");
    Ok(found)
}
