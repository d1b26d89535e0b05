pub mod filter_order;
pub mod filter_where;
pub mod shaped;
pub mod shaper;
pub mod types;

pub use shaped::{BaseQuery, ShapedQuery};
pub use shaper::QueryShaper;
pub use types::*;
