//! Generic building blocks for resource list and form pages.

pub mod autocomplete;
pub mod effects;
pub mod field;
pub mod filters;
pub mod form;
pub mod import_export;
pub mod table;
pub mod tabbed;

pub use autocomplete::{AutocompleteOption, build_options, filter_options};
pub use effects::{Effect, Effects, Toast, ToastLevel};
pub use field::{FieldConfig, FieldKind, ForeignKeyConfig, SelectOption, select_options};
pub use filters::{FilterComposer, FilterConfig, FilterOption};
pub use form::{AdminForm, FormConfig, FormMode, FormView};
pub use import_export::{ExportFile, ExportFormat, ImportReport};
pub use table::{CellFormat, ColumnDef, Modifiers, TableAction, TableKey, TableState, TableView};
pub use tabbed::{InlineConfig, InlineTable, ParentLink, TabConfig};
