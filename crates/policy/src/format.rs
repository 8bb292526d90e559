//! Human-readable reason strings.

/// Title-case `s`: a letter is uppercased when it does not follow another
/// letter, and lowercased otherwise (`"credit card"` → `"Credit Card"`,
/// `"t-shirt"` → `"T-Shirt"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut after_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}

/// `"<Category Title> detected"` for a sensitive-information category.
pub fn category_reason(category: &str) -> String {
    format!("{} detected", title_case(&category.replace('_', " ")))
}

/// `"<Flag Title> detected"` for an image flag; `:` separates a flag from
/// its subject (`concerning_label:Gun` → `"Concerning Label: Gun detected"`).
pub fn flag_reason(flag: &str) -> String {
    format!(
        "{} detected",
        title_case(&flag.replace('_', " ").replace(':', ": "))
    )
}
