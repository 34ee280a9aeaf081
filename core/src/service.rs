use std::collections::BTreeSet;
use std::path::Path;

use crate::db::Database;
use crate::error::Result;
use crate::finder;
use crate::models::{
    CatalogExport, EXPORT_VERSION, Ingredient, Meal, Measure, QuantityInput, Recipe, RecipeDetail,
};

/// Entry point for callers (the CLI today). Owns the database handle from
/// `initialize` until `shutdown`.
pub struct FoodBlog {
    db: Database,
}

impl FoodBlog {
    pub fn initialize(path: &Path) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self { db })
    }

    pub fn initialize_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    pub fn shutdown(self) -> Result<()> {
        self.db.close()
    }

    // --- Writes ---

    pub fn add_recipe(&self, name: &str, description: &str) -> Result<i64> {
        self.db.add_recipe(name, description)
    }

    pub fn add_serve(&self, recipe_id: i64, meal_ids: &[i64]) -> Result<Vec<i64>> {
        self.db.add_serve(recipe_id, meal_ids)
    }

    pub fn add_quantity(
        &self,
        recipe_id: i64,
        measure_id: i64,
        ingredient_id: i64,
        amount: i64,
    ) -> Result<i64> {
        self.db
            .add_quantity(recipe_id, measure_id, ingredient_id, amount)
    }

    pub fn add_quantity_input(&self, recipe_id: i64, input: QuantityInput) -> Result<i64> {
        self.add_quantity(recipe_id, input.measure_id, input.ingredient_id, input.amount)
    }

    // --- Reference data ---

    pub fn list_meals(&self) -> Result<Vec<Meal>> {
        self.db.list_meals()
    }

    pub fn list_measures(&self) -> Result<Vec<Measure>> {
        self.db.list_measures()
    }

    pub fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        self.db.list_ingredients()
    }

    // --- Recipes ---

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        self.db.list_recipes()
    }

    pub fn recipe_detail(&self, recipe_id: i64) -> Result<Option<RecipeDetail>> {
        self.db.recipe_detail(recipe_id)
    }

    pub fn find_recipes(&self, required: &BTreeSet<String>) -> Result<Vec<String>> {
        finder::find_recipes(&self.db, required)
    }

    pub fn find_recipes_for_meals(
        &self,
        required: &BTreeSet<String>,
        meals: &BTreeSet<String>,
    ) -> Result<Vec<String>> {
        finder::find_recipes_for_meals(&self.db, required, meals)
    }

    // --- Export ---

    pub fn export_all(&self) -> Result<CatalogExport> {
        let mut recipes = Vec::new();
        for recipe in self.db.list_recipes()? {
            recipes.push(RecipeDetail {
                meals: self.db.recipe_meals(recipe.id)?,
                ingredients: self.db.recipe_quantities(recipe.id)?,
                recipe,
            });
        }
        Ok(CatalogExport {
            version: EXPORT_VERSION,
            meals: self.db.list_meals()?,
            ingredients: self.db.list_ingredients()?,
            measures: self.db.list_measures()?,
            recipes,
        })
    }
}
