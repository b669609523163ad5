//! Search: filter trees, index selection, expression compilation, and
//! paginated execution.

pub mod compile;
pub mod condition;
pub mod engine;
pub mod filter;
pub mod index;
pub mod output;
pub mod request;
pub mod table;

pub use compile::compile;
pub use condition::{Condition, Operator};
pub use engine::{Search, Termination, paginate};
pub use filter::{AttributePath, Entry, FilterBuilder, FilterTree, Group};
pub use index::{IndexDescriptor, IndexKind, IndexSelection, resolve_index, select_index};
pub use output::{MergedPages, SearchOutput};
pub use request::{IndexChoice, Order, PageResult, RequestDescriptor, SearchOptions, Select};
pub use table::{ReadCapability, SearchDefaults, Table};
