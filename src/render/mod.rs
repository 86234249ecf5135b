pub mod html;

pub use html::{export_html, write_html};
