//! XML utilities.

mod utils;

pub use utils::{
    element_children, find_by_path, find_child, find_children, get_attribute, get_tag_name,
    get_text, is_qti_element,
};
