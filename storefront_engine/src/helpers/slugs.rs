/// Turns a display name into a URL slug: lowercase ASCII letters and digits separated by single dashes.
///
/// `"Home & Garden"` becomes `"home-garden"`. Returns an empty string if the name has no usable characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
