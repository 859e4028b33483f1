//! Command implementations.

pub mod compare;
pub mod config;
pub mod delete;
pub mod extract;
pub mod list;
pub mod merge;
pub mod resume;

pub use self::compare::execute_compare;
pub use self::config::execute_config;
pub use self::delete::execute_delete;
pub use self::extract::execute_extract;
pub use self::list::execute_list;
pub use self::merge::execute_merge;
pub use self::resume::execute_resume;
