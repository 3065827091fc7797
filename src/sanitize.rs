//! Input cleaning applied to user-authored course content before it is stored.

use std::path::Path;

/// Image extensions accepted for course cover images.
pub const ACCEPTED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "tif"];

/// Strips markup that could execute when the text is rendered again.
///
/// Harmless formatting tags survive; `<script>`/`<style>` elements are dropped
/// together with their content and event-handler attributes are removed.
pub fn sanitize_html(input: &str) -> String {
    ammonia::clean(input)
}

pub fn sanitize_in_place(value: &mut String) {
    *value = sanitize_html(value);
}

/// Lowercased extension of an uploaded file name, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_ascii_lowercase)
}

pub fn is_accepted_image(file_name: &str) -> bool {
    file_extension(file_name)
        .is_some_and(|ext| ACCEPTED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_content_is_removed() {
        let cleaned = sanitize_html("Rust <script>alert('x')</script>basics");
        assert!(!cleaned.contains("<script"));
        assert!(!cleaned.contains("alert"));
        assert_eq!(cleaned, "Rust basics");
    }

    #[test]
    fn event_handlers_are_stripped() {
        let cleaned = sanitize_html(r#"<b onclick="steal()">bold</b>"#);
        assert_eq!(cleaned, "<b>bold</b>");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(sanitize_html("Ownership and borrowing"), "Ownership and borrowing");
    }

    #[test]
    fn sanitizing_twice_is_stable() {
        let once = sanitize_html(r#"<img src=x onerror="boom()"><i>hi</i>"#);
        assert_eq!(sanitize_html(&once), once);
    }

    #[test]
    fn image_extensions_are_allow_listed() {
        assert!(is_accepted_image("cover.png"));
        assert!(is_accepted_image("cover.JPEG"));
        assert!(is_accepted_image("scan.tif"));
        assert!(!is_accepted_image("cover.svg"));
        assert!(!is_accepted_image("payload.exe"));
        assert!(!is_accepted_image("no_extension"));
    }
}
