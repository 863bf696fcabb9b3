pub mod advanced;
pub mod draw;
pub mod editor;
pub mod events;
pub mod input;
pub mod preset_list;
pub mod preview;
pub mod providers;
pub mod state;
pub mod wizard;
pub mod wizard_flags;

pub use draw::render_to_buffer;
pub use events::{handle_key, run};
pub use input::{handle_text_input_key, TextInput};
pub use state::{App, BackendChoice, Dialog, Outcome, PendingAction, Screen};
