// Dynamic form engine: state store, entry mutations, shared completion
// predicate, batch validator, completion meter. Handlers expose the
// mutations over HTTP.

pub mod completeness;
pub mod entries;
pub mod handlers;
pub mod predicate;
pub mod store;
pub mod validation;
