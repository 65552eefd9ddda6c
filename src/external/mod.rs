pub mod alternative_me;
pub mod gold_api;
pub mod json_source;
mod numeric;
pub mod open_er_api;
pub mod yahoo;
