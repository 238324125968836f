mod confirm_dialog;
mod list;
mod picker;
mod table;
mod text_input;

pub use confirm_dialog::{ConfirmDialog, ConfirmEvent};
pub use list::{List, ListEvent, ListRow};
pub use picker::{Picker, PickerEvent};
pub use table::{DataTable, TableEvent};
pub use text_input::{TextInput, TextInputEvent};
