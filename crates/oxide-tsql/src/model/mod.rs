//! The query model: a dialect-neutral representation of SELECT-like queries
//! and of the schema objects that DDL statements operate on.
//!
//! The model is the stable interface between whatever front end builds
//! queries and the renderers in [`crate::render`]. Renderers only borrow it.

mod column;
mod index;
mod operator;
mod projection;
mod select;
mod table;

pub use column::{Column, ColumnKind, DefaultValue, KeyType};
pub use index::{Index, IndexColumn};
pub use operator::{Comparison, Operator};
pub use projection::{Function, Order, OrderByProjection, Projection, SelectProjection};
pub use select::{Data, OperationType, Select, SetOperation, Target, Top, TopType};
pub use table::Table;
