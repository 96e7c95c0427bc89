//! Case conversion helpers for template, endpoint and URL names.

/// Splits a CamelCase name into its words.
///
/// Only words starting with an uppercase letter are kept, so leading
/// lowercase text and separators are dropped: `"CartItemCreate"` becomes
/// `["Cart", "Item", "Create"]`.
pub fn camel_to_list(name: &str, lower: bool) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if current.len() > 1 {
                words.push(std::mem::take(&mut current));
            }
            current.clear();
            current.push(ch);
        } else if (ch.is_ascii_lowercase() || ch.is_ascii_digit()) && !current.is_empty() {
            current.push(ch);
        } else {
            if current.len() > 1 {
                words.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() > 1 {
        words.push(current);
    }

    if lower {
        words.iter().map(|w| w.to_ascii_lowercase()).collect()
    } else {
        words
    }
}

/// `"CartItem"` -> `"cart_item"`.
pub fn camel_to_snake(name: &str) -> String {
    camel_to_list(name, true).join("_")
}

/// `"cart_item"` -> `"CartItem"`.
pub fn snake_to_camel(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_list() {
        assert_eq!(camel_to_list("CartItemCreate", false), ["Cart", "Item", "Create"]);
        assert_eq!(camel_to_list("Order2Show", true), ["order2", "show"]);
        assert!(camel_to_list("lower", false).is_empty());
    }

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("Customer"), "customer");
        assert_eq!(camel_to_snake("CartItem"), "cart_item");
        assert_eq!(camel_to_snake("CustomerCreate"), "customer_create");
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("cart_item"), "CartItem");
        assert_eq!(snake_to_camel("order"), "Order");
        assert_eq!(snake_to_camel("__a__b"), "AB");
    }
}
