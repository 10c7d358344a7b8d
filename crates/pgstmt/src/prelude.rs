//! Convenient re-exports for typical usage.
//!
//! ```
//! use pgstmt::prelude::*;
//! ```

pub use crate::config::StmtConfig;
pub use crate::error::{StmtError, StmtResult};
pub use crate::format::Modifier;
pub use crate::helpers::{
    AssignOptions, Column, ColumnConfig, ColumnContext, ColumnSet, ColumnSetOptions,
    UpdateOptions,
};
pub use crate::ident::TableName;
