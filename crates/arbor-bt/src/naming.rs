/// Returns `base`, or `base (n)` with the smallest `n >= 1` not already taken.
///
/// A trailing ` (n)` on `base` is dropped before numbering, so a copy of
/// `Wait (1)` becomes `Wait (2)` rather than `Wait (1) (1)`.
pub fn unique_name<'a>(existing: impl IntoIterator<Item = &'a str>, base: &str) -> String {
    let taken: Vec<&str> = existing.into_iter().collect();
    if !taken.contains(&base) {
        return base.to_string();
    }

    let stem = strip_counter(base);
    (1u32..)
        .map(|n| format!("{stem} ({n})"))
        .find(|candidate| !taken.contains(&candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

fn strip_counter(name: &str) -> &str {
    let Some(body) = name.strip_suffix(')') else {
        return name;
    };
    let Some(open) = body.rfind(" (") else {
        return name;
    };
    let digits = &body[open + 2..];
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        &name[..open]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::unique_name;

    #[test]
    fn free_name_is_kept() {
        assert_eq!(unique_name(["Wait"], "Sequence"), "Sequence");
    }

    #[test]
    fn taken_name_gets_counter() {
        assert_eq!(unique_name(["Wait", "Wait (1)"], "Wait"), "Wait (2)");
        assert_eq!(unique_name(["Wait", "Wait (1)"], "Wait (1)"), "Wait (2)");
    }

    #[test]
    fn non_numeric_suffix_is_part_of_the_stem() {
        assert_eq!(unique_name(["A (x)"], "A (x)"), "A (x) (1)");
    }
}
