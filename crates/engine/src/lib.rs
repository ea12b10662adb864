pub mod natord;
pub mod reconcile;
pub mod rename;
pub mod synth;

pub use natord::natural_cmp;
pub use reconcile::reconcile;
pub use rename::execute;
pub use synth::{plan_rename, synthesize};
