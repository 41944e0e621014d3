pub mod search_terms;
pub mod site;
pub mod table;
