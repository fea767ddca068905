//! Status reconciliation and unfilled-set resolution.

mod reconciler;
mod resolver;

pub use reconciler::{id_for_name, name_for_id, StatusReconciler};
pub use resolver::UnfilledResolver;
