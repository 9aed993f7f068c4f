mod planning;
mod work_item;

pub use planning::{Iteration, IterationSelector, Owner, Release, flatten, owners_from};
pub use work_item::{DEFAULT_KIND, NOT_LOADED, NewWorkItem, Reference, WorkItem, WorkItemUpdate};
