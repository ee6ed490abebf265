//! Site sections and their public link prefixes.

pub const SECTION_NEWS: i32 = 1;
pub const SECTION_FORUM: i32 = 2;
pub const SECTION_GALLERY: i32 = 3;
pub const SECTION_POLLS: i32 = 5;

/// Public path prefix of a section, always ending in `/`.
pub fn section_link(section_id: i32) -> String {
    match section_id {
        SECTION_NEWS => "/news/".to_string(),
        SECTION_FORUM => "/forum/".to_string(),
        SECTION_GALLERY => "/gallery/".to_string(),
        SECTION_POLLS => "/polls/".to_string(),
        other => format!("/sections/{other}/"),
    }
}
