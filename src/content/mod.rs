pub mod images;
pub mod links;
pub mod sanitize;

pub use images::extract_image_urls;
pub use links::normalize_google_link;
pub use sanitize::{escape_html, strip_dangerous_markup};
