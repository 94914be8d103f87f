/// Whitespace-separated tokens that contain at least one letter or digit.
pub(crate) fn count_words(text: &str) -> usize {
    text.split_whitespace().filter(|token| token.chars().any(char::is_alphanumeric)).count()
}
