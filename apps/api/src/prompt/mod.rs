// Prompt library: CRUD, version ledger persistence, field checks, and template variables.

pub mod handlers;
pub mod store;
pub mod validation;
pub mod variables;
