//! Identifier and path conventions shared by the backends.

/// `org.acme.vehicle` → `org/acme/vehicle`.
pub fn namespace_path(namespace: &str) -> String {
    namespace.replace('.', "/")
}

/// Go package name for a namespace: `org.acme-co.vehicle` → `org_acme_co_vehicle`.
pub fn go_package(namespace: &str) -> String {
    namespace
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Upper-case the first character: `wheels` → `Wheels`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Last segment of a possibly qualified type name.
pub fn simple_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

/// Escape text for XML attribute and element content.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_conversions() {
        assert_eq!(namespace_path("org.acme.vehicle"), "org/acme/vehicle");
        assert_eq!(go_package("org.Acme-co.vehicle"), "org_acme_co_vehicle");
        assert_eq!(simple_name("org.acme.Car"), "Car");
        assert_eq!(simple_name("Car"), "Car");
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize("wheels"), "Wheels");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("éclair"), "Éclair");
    }

    #[test]
    fn xml_escape_covers_markup() {
        assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
