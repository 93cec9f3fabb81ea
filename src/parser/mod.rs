/// Parse operator input into course IDs.
///
/// Tokens are separated by commas, spaces or newlines. Anything that is not a
/// plain non-negative integer is dropped. Order and duplicates are kept.
pub fn parse_course_ids(input: &str) -> Vec<u64> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|token| token.parse::<u64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_separators() {
        let ids = parse_course_ids("111, 222\n333\t444,,555");
        assert_eq!(ids, vec![111, 222, 333, 444, 555]);
    }

    #[test]
    fn test_non_numeric_tokens_are_dropped() {
        let ids = parse_course_ids("abc 12x -5 +7 3.0 42");
        assert_eq!(ids, vec![42]);
    }

    #[test]
    fn test_duplicates_and_order_kept() {
        assert_eq!(parse_course_ids("9 1 9"), vec![9, 1, 9]);
        assert!(parse_course_ids("  \n ").is_empty());
    }

    #[test]
    fn test_overflowing_id_is_dropped() {
        assert_eq!(parse_course_ids("99999999999999999999999 7"), vec![7]);
    }
}
