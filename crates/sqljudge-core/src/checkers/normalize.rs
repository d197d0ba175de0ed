/// Canonical form both solution and reference are executed in.
///
/// Statement terminators are dropped, line breaks become single spaces and
/// surrounding whitespace is trimmed. Trimming runs last so the result is a
/// fixed point: normalizing twice changes nothing.
pub fn normalize_query(query: &str) -> String {
    query
        .replace(';', "")
        .replace("\r\n", " ")
        .replace('\n', " ")
        .trim()
        .to_string()
}
