//! Count-and-noun formatting for log lines.

/// `3 modules`, `1 module`, `0 idle modules`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(1, "module"), "1 module");
        assert_eq!(plural_count(0, "idle module"), "0 idle modules");
        assert_eq!(plural_count(120, "module"), "120 modules");
    }
}
