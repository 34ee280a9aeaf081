mod catalog;
mod helpers;
mod query;
mod session;

pub(crate) use catalog::{
    cmd_export, cmd_ingredients, cmd_meals, cmd_measures, cmd_recipes, cmd_show,
};
pub(crate) use query::cmd_find;
pub(crate) use session::cmd_interactive;
