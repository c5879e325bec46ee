mod html;
mod web;

pub use html::{html_to_text, PageMetadata};
pub use web::WebPageLoader;
