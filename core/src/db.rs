use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{Error, Result, StorageContext};
use crate::models::{
    INGREDIENTS, Ingredient, MEALS, MEASURES, Meal, Measure, QuantityLine, Recipe, RecipeDetail,
    RecipeIngredientRow,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the catalog at `path`, creating the relations and
    /// seeding reference data. Safe to call on an existing file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .storage(&format!("opening database {}", path.display()))?;
        debug!(path = %path.display(), "opened database");
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().storage("opening in-memory database")?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)
            .storage("enabling foreign keys")?;
        let db = Database { conn };
        db.migrate()?;
        db.seed()?;
        Ok(db)
    }

    /// Release the connection. Dropping the handle does the same but
    /// discards any close error.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| Error::from_sqlite("closing database", e))
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .storage("reading schema version")?;

        if version < 1 {
            // Files written before versioning already carry these tables;
            // IF NOT EXISTS adopts them untouched.
            self.conn
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS meals (
                        meal_id INTEGER PRIMARY KEY,
                        meal_name TEXT UNIQUE NOT NULL
                    );

                    CREATE TABLE IF NOT EXISTS ingredients (
                        ingredient_id INTEGER PRIMARY KEY,
                        ingredient_name TEXT UNIQUE NOT NULL
                    );

                    CREATE TABLE IF NOT EXISTS measures (
                        measure_id INTEGER PRIMARY KEY,
                        measure_name TEXT UNIQUE
                    );

                    CREATE TABLE IF NOT EXISTS recipes (
                        recipe_id INTEGER PRIMARY KEY,
                        recipe_name TEXT NOT NULL,
                        recipe_description TEXT
                    );

                    CREATE TABLE IF NOT EXISTS serve (
                        serve_id INTEGER PRIMARY KEY,
                        recipe_id INTEGER NOT NULL REFERENCES recipes(recipe_id),
                        meal_id INTEGER NOT NULL REFERENCES meals(meal_id)
                    );

                    CREATE TABLE IF NOT EXISTS quantity (
                        quantity_id INTEGER PRIMARY KEY,
                        measure_id INTEGER NOT NULL REFERENCES measures(measure_id),
                        ingredient_id INTEGER NOT NULL REFERENCES ingredients(ingredient_id),
                        quantity INTEGER NOT NULL CHECK (quantity > 0),
                        recipe_id INTEGER NOT NULL REFERENCES recipes(recipe_id)
                    );

                    CREATE INDEX IF NOT EXISTS idx_serve_recipe ON serve(recipe_id);
                    CREATE INDEX IF NOT EXISTS idx_quantity_recipe ON quantity(recipe_id);

                    PRAGMA user_version = 1;",
                )
                .storage("creating schema")?;
            debug!("schema at version 1");
        }

        Ok(())
    }

    fn seed(&self) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .storage("starting seed transaction")?;
        for (table, id_col, name_col, rows) in [
            ("meals", "meal_id", "meal_name", MEALS),
            ("ingredients", "ingredient_id", "ingredient_name", INGREDIENTS),
            ("measures", "measure_id", "measure_name", MEASURES),
        ] {
            let op = format!("seeding {table}");
            // Only an id clash is skipped; a seed name stored under another
            // id fails the UNIQUE constraint instead.
            let mut insert = tx
                .prepare(&format!(
                    "INSERT INTO {table} ({id_col}, {name_col}) VALUES (?1, ?2)
                     ON CONFLICT({id_col}) DO NOTHING"
                ))
                .storage(&op)?;
            let mut stored = tx
                .prepare(&format!("SELECT {name_col} FROM {table} WHERE {id_col} = ?1"))
                .storage(&op)?;
            for &(id, name) in rows {
                if insert.execute(params![id, name]).storage(&op)? > 0 {
                    continue;
                }
                let existing: Option<String> = stored
                    .query_row(params![id], |row| row.get(0))
                    .storage(&op)?;
                if existing.as_deref().unwrap_or_default() != name {
                    return Err(Error::Constraint(format!(
                        "{op}: id {id} holds '{}', expected '{name}'",
                        existing.unwrap_or_default()
                    )));
                }
                debug!(table, id, name, "seed row already present");
            }
        }
        tx.commit().storage("committing seed data")
    }

    // --- Row mapping helpers ---

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }

    fn named_rows<T>(
        &self,
        sql: &str,
        op: &str,
        build: impl Fn(i64, String) -> T,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql).storage(op)?;
        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let name: Option<String> = row.get(1)?;
                Ok(build(id, name.unwrap_or_default()))
            })
            .storage(op)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage(op)?;
        Ok(rows)
    }

    // --- Reference data ---

    pub fn list_meals(&self) -> Result<Vec<Meal>> {
        self.named_rows(
            "SELECT meal_id, meal_name FROM meals ORDER BY meal_id",
            "listing meals",
            |id, name| Meal { id, name },
        )
    }

    pub fn list_measures(&self) -> Result<Vec<Measure>> {
        self.named_rows(
            "SELECT measure_id, measure_name FROM measures ORDER BY measure_id",
            "listing measures",
            |id, name| Measure { id, name },
        )
    }

    pub fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        self.named_rows(
            "SELECT ingredient_id, ingredient_name FROM ingredients ORDER BY ingredient_id",
            "listing ingredients",
            |id, name| Ingredient { id, name },
        )
    }

    // --- Recipes ---

    /// Insert a recipe with id `1 + max(recipe_id)`. The max lookup and the
    /// insert run as one statement.
    pub fn add_recipe(&self, name: &str, description: &str) -> Result<i64> {
        let id: i64 = self
            .conn
            .query_row(
                "INSERT INTO recipes (recipe_id, recipe_name, recipe_description)
                 SELECT COALESCE(MAX(recipe_id), 0) + 1, ?1, ?2 FROM recipes
                 RETURNING recipe_id",
                params![name, description],
                |row| row.get(0),
            )
            .storage(&format!("inserting recipe '{name}'"))?;
        info!(id, name, "added recipe");
        Ok(id)
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        self.conn
            .query_row(
                "SELECT recipe_id, recipe_name, recipe_description FROM recipes WHERE recipe_id = ?1",
                params![id],
                Self::recipe_from_row,
            )
            .optional()
            .storage("reading recipe")
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let op = "listing recipes";
        let mut stmt = self
            .conn
            .prepare("SELECT recipe_id, recipe_name, recipe_description FROM recipes ORDER BY recipe_id")
            .storage(op)?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)
            .storage(op)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage(op)?;
        Ok(recipes)
    }

    // --- Serve ---

    /// Record that `recipe_id` can be served at each of `meal_ids`, one row
    /// per id in input order. Duplicates are stored as given. Either every
    /// row is inserted or none is.
    pub fn add_serve(&self, recipe_id: i64, meal_ids: &[i64]) -> Result<Vec<i64>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .storage("starting serve transaction")?;
        let mut ids = Vec::with_capacity(meal_ids.len());
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO serve (serve_id, recipe_id, meal_id)
                     SELECT COALESCE(MAX(serve_id), 0) + 1, ?1, ?2 FROM serve
                     RETURNING serve_id",
                )
                .storage("preparing serve insert")?;
            for &meal_id in meal_ids {
                let id: i64 = stmt
                    .query_row(params![recipe_id, meal_id], |row| row.get(0))
                    .storage(&format!("inserting serve for meal {meal_id}"))?;
                ids.push(id);
            }
        }
        tx.commit().storage("committing serve rows")?;
        info!(recipe_id, ?meal_ids, "added serve rows");
        Ok(ids)
    }

    pub fn recipe_meals(&self, recipe_id: i64) -> Result<Vec<Meal>> {
        let op = "reading recipe meals";
        let mut stmt = self
            .conn
            .prepare(
                "SELECT m.meal_id, m.meal_name
                 FROM serve s
                 JOIN meals m ON s.meal_id = m.meal_id
                 WHERE s.recipe_id = ?1
                 ORDER BY s.serve_id",
            )
            .storage(op)?;
        let meals = stmt
            .query_map(params![recipe_id], |row| {
                Ok(Meal {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .storage(op)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage(op)?;
        Ok(meals)
    }

    /// Every (recipe id, meal name) pair in the serve relation.
    pub fn serve_rows(&self) -> Result<Vec<(i64, String)>> {
        let op = "reading serve rows";
        let mut stmt = self
            .conn
            .prepare(
                "SELECT s.recipe_id, m.meal_name
                 FROM serve s
                 JOIN meals m ON s.meal_id = m.meal_id
                 ORDER BY s.serve_id",
            )
            .storage(op)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .storage(op)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage(op)?;
        Ok(rows)
    }

    // --- Quantity ---

    pub fn add_quantity(
        &self,
        recipe_id: i64,
        measure_id: i64,
        ingredient_id: i64,
        amount: i64,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(Error::Constraint(format!(
                "quantity must be greater than 0, got {amount}"
            )));
        }
        let id: i64 = self
            .conn
            .query_row(
                "INSERT INTO quantity (quantity_id, measure_id, ingredient_id, quantity, recipe_id)
                 SELECT COALESCE(MAX(quantity_id), 0) + 1, ?1, ?2, ?3, ?4 FROM quantity
                 RETURNING quantity_id",
                params![measure_id, ingredient_id, amount, recipe_id],
                |row| row.get(0),
            )
            .storage(&format!("inserting quantity for recipe {recipe_id}"))?;
        info!(id, recipe_id, measure_id, ingredient_id, amount, "added quantity");
        Ok(id)
    }

    pub fn recipe_quantities(&self, recipe_id: i64) -> Result<Vec<QuantityLine>> {
        let op = "reading recipe quantities";
        let mut stmt = self
            .conn
            .prepare(
                "SELECT q.quantity_id, q.quantity, ms.measure_name, i.ingredient_name
                 FROM quantity q
                 JOIN measures ms ON q.measure_id = ms.measure_id
                 JOIN ingredients i ON q.ingredient_id = i.ingredient_id
                 WHERE q.recipe_id = ?1
                 ORDER BY q.quantity_id",
            )
            .storage(op)?;
        let lines = stmt
            .query_map(params![recipe_id], |row| {
                Ok(QuantityLine {
                    id: row.get(0)?,
                    amount: row.get(1)?,
                    measure: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    ingredient: row.get(3)?,
                })
            })
            .storage(op)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage(op)?;
        Ok(lines)
    }

    pub fn recipe_detail(&self, recipe_id: i64) -> Result<Option<RecipeDetail>> {
        let Some(recipe) = self.get_recipe(recipe_id)? else {
            return Ok(None);
        };
        Ok(Some(RecipeDetail {
            meals: self.recipe_meals(recipe_id)?,
            ingredients: self.recipe_quantities(recipe_id)?,
            recipe,
        }))
    }

    /// The quantity ⋈ ingredient ⋈ recipe join: one row per ingredient line.
    pub fn recipe_ingredient_rows(&self) -> Result<Vec<RecipeIngredientRow>> {
        let op = "joining recipe ingredients";
        let mut stmt = self
            .conn
            .prepare(
                "SELECT q.recipe_id, r.recipe_name, i.ingredient_name
                 FROM quantity q
                 JOIN ingredients i ON q.ingredient_id = i.ingredient_id
                 JOIN recipes r ON r.recipe_id = q.recipe_id
                 ORDER BY q.recipe_id, q.quantity_id",
            )
            .storage(op)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RecipeIngredientRow {
                    recipe_id: row.get(0)?,
                    recipe_name: row.get(1)?,
                    ingredient_name: row.get(2)?,
                })
            })
            .storage(op)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage(op)?;
        Ok(rows)
    }

    #[cfg(test)]
    fn count(&self, table: &str) -> i64 {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_reference_data() {
        let db = Database::open_in_memory().unwrap();

        let meals = db.list_meals().unwrap();
        let names: Vec<&str> = meals.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["breakfast", "brunch", "lunch", "supper"]);
        assert_eq!(meals[0].id, 1);

        let ingredients = db.list_ingredients().unwrap();
        assert_eq!(ingredients.len(), 6);
        assert_eq!(ingredients[5].name, "sugar");

        let measures = db.list_measures().unwrap();
        assert_eq!(measures.len(), 8);
        assert_eq!(measures[3].name, "cup");
        assert_eq!(measures[7].name, "");
    }

    #[test]
    fn test_open_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("food_blog.db");

        let db = Database::open(&path).unwrap();
        db.add_recipe("Pancakes", "fluffy").unwrap();
        db.close().unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.count("meals"), 4);
        assert_eq!(db.count("ingredients"), 6);
        assert_eq!(db.count("measures"), 8);
        assert_eq!(db.count("recipes"), 1);
    }

    #[test]
    fn test_open_adopts_legacy_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE meals(meal_id INT PRIMARY KEY, meal_name VARCHAR(255) UNIQUE NOT NULL);
                 CREATE TABLE ingredients(ingredient_id INT PRIMARY KEY, ingredient_name VARCHAR(255) UNIQUE NOT NULL);
                 CREATE TABLE measures(measure_id INT PRIMARY KEY, measure_name VARCHAR(255) UNIQUE);
                 CREATE TABLE recipes(recipe_id INT PRIMARY KEY, recipe_name VARCHAR(255) NOT NULL, recipe_description VARCHAR(255));
                 CREATE TABLE serve(serve_id INT PRIMARY KEY, recipe_id INT NOT NULL, meal_id INT NOT NULL,
                     FOREIGN KEY(recipe_id) REFERENCES recipes(recipe_id)
                     FOREIGN KEY(meal_id) REFERENCES meals(meal_id));
                 CREATE TABLE quantity(quantity_id INT PRIMARY KEY, measure_id INT NOT NULL, ingredient_id INT NOT NULL,
                     quantity INT NOT NULL, recipe_id INT NOT NULL,
                     FOREIGN KEY(measure_id) REFERENCES measures(measure_id)
                     FOREIGN KEY(ingredient_id) REFERENCES ingredients(ingredient_id)
                     FOREIGN KEY(recipe_id) REFERENCES recipes(recipe_id));
                 INSERT INTO meals VALUES (1, 'breakfast');
                 INSERT INTO recipes VALUES (7, 'Old Tea', 'legacy');",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.count("meals"), 4);
        assert_eq!(db.get_recipe(7).unwrap().unwrap().name, "Old Tea");
        assert_eq!(db.add_recipe("New Tea", "fresh").unwrap(), 8);
    }

    fn legacy_meals_file(dir: &Path, rows: &str) -> std::path::PathBuf {
        let path = dir.join("legacy.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE meals(meal_id INT PRIMARY KEY, meal_name VARCHAR(255) UNIQUE NOT NULL);
             {rows}"
        ))
        .unwrap();
        path
    }

    #[test]
    fn test_open_rejects_seed_id_holding_other_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = legacy_meals_file(dir.path(), "INSERT INTO meals VALUES (1, 'lunch');");

        let err = Database::open(&path).err().unwrap();
        assert!(err.is_constraint(), "{err}");
        assert!(err.to_string().contains("breakfast"), "{err}");
    }

    #[test]
    fn test_open_rejects_seed_name_under_other_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = legacy_meals_file(dir.path(), "INSERT INTO meals VALUES (9, 'breakfast');");

        let err = Database::open(&path).err().unwrap();
        assert!(err.is_constraint(), "{err}");
    }

    #[test]
    fn test_open_unopenable_path_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Database::open(dir.path()).err().unwrap();
        assert!(matches!(err, Error::Storage { .. }), "{err}");
    }

    #[test]
    fn test_add_recipe_ids_start_at_one_and_increase() {
        let db = Database::open_in_memory().unwrap();
        let ids: Vec<i64> = ["A", "B", "C"]
            .iter()
            .map(|name| db.add_recipe(name, "").unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_add_recipe_continues_after_gap() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO recipes (recipe_id, recipe_name) VALUES (10, 'Imported')",
                [],
            )
            .unwrap();
        assert_eq!(db.add_recipe("Next", "").unwrap(), 11);
    }

    #[test]
    fn test_get_recipe_missing_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_recipe(42).unwrap().is_none());
        assert!(db.recipe_detail(42).unwrap().is_none());
    }

    #[test]
    fn test_add_serve_records_meals() {
        let db = Database::open_in_memory().unwrap();
        let recipe_id = db.add_recipe("Porridge", "oats").unwrap();
        let serve_ids = db.add_serve(recipe_id, &[1, 3]).unwrap();
        assert_eq!(serve_ids, vec![1, 2]);

        let meals: Vec<String> = db
            .recipe_meals(recipe_id)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(meals, vec!["breakfast", "lunch"]);
    }

    #[test]
    fn test_add_serve_keeps_duplicates() {
        let db = Database::open_in_memory().unwrap();
        let recipe_id = db.add_recipe("Toast", "").unwrap();
        db.add_serve(recipe_id, &[2, 2]).unwrap();
        assert_eq!(db.recipe_meals(recipe_id).unwrap().len(), 2);
    }

    #[test]
    fn test_add_serve_unknown_meal_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let recipe_id = db.add_recipe("Toast", "").unwrap();
        let err = db.add_serve(recipe_id, &[1, 99]).unwrap_err();
        assert!(err.is_constraint(), "{err}");
        assert_eq!(db.count("serve"), 0);
    }

    #[test]
    fn test_add_quantity() {
        let db = Database::open_in_memory().unwrap();
        let recipe_id = db.add_recipe("Pancakes", "fluffy").unwrap();
        let id = db.add_quantity(recipe_id, 4, 1, 5).unwrap();
        assert_eq!(id, 1);

        let lines = db.recipe_quantities(recipe_id).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].amount, 5);
        assert_eq!(lines[0].measure, "cup");
        assert_eq!(lines[0].ingredient, "milk");
    }

    #[test]
    fn test_add_quantity_rejects_non_positive_amount() {
        let db = Database::open_in_memory().unwrap();
        let recipe_id = db.add_recipe("Nothing", "").unwrap();
        assert!(db.add_quantity(recipe_id, 1, 1, 0).unwrap_err().is_constraint());
        assert!(db.add_quantity(recipe_id, 1, 1, -3).unwrap_err().is_constraint());
        assert_eq!(db.count("quantity"), 0);
    }

    #[test]
    fn test_add_quantity_rejects_unknown_references() {
        let db = Database::open_in_memory().unwrap();
        let recipe_id = db.add_recipe("Cake", "").unwrap();
        // unknown measure, ingredient, recipe
        assert!(db.add_quantity(recipe_id, 99, 1, 1).unwrap_err().is_constraint());
        assert!(db.add_quantity(recipe_id, 1, 99, 1).unwrap_err().is_constraint());
        assert!(db.add_quantity(recipe_id + 1, 1, 1, 1).unwrap_err().is_constraint());
    }

    #[test]
    fn test_recipe_detail() {
        let db = Database::open_in_memory().unwrap();
        let recipe_id = db.add_recipe("Milkshake", "cold").unwrap();
        db.add_serve(recipe_id, &[2]).unwrap();
        db.add_quantity(recipe_id, 1, 1, 250).unwrap();
        db.add_quantity(recipe_id, 8, 3, 5).unwrap();

        let detail = db.recipe_detail(recipe_id).unwrap().unwrap();
        assert_eq!(detail.recipe.name, "Milkshake");
        assert_eq!(detail.recipe.description.as_deref(), Some("cold"));
        assert_eq!(detail.meals[0].name, "brunch");
        let names: Vec<&str> = detail
            .ingredients
            .iter()
            .map(|q| q.ingredient.as_str())
            .collect();
        assert_eq!(names, vec!["milk", "strawberry"]);
    }

    #[test]
    fn test_recipe_ingredient_rows_skip_recipes_without_quantities() {
        let db = Database::open_in_memory().unwrap();
        let a = db.add_recipe("A", "").unwrap();
        db.add_recipe("B", "").unwrap();
        db.add_quantity(a, 2, 6, 10).unwrap();

        let rows = db.recipe_ingredient_rows().unwrap();
        assert_eq!(
            rows,
            vec![RecipeIngredientRow {
                recipe_id: a,
                recipe_name: "A".to_string(),
                ingredient_name: "sugar".to_string(),
            }]
        );
    }

    #[test]
    fn test_list_recipes() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.list_recipes().unwrap().is_empty());
        db.add_recipe("Recipe A", "first").unwrap();
        db.add_recipe("Recipe B", "second").unwrap();
        let recipes = db.list_recipes().unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[1].name, "Recipe B");
    }
}
