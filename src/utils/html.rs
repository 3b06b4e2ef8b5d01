use ammonia;

/// Clean teacher-authored HTML (question content, options, statements,
/// exam descriptions) before it is stored and later rendered to students.
///
/// Whitelist-based: safe formatting tags such as <b>, <sub> and <sup>
/// (needed for formulas like H<sub>2</sub>O) survive, while <script>,
/// <iframe> and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_markup_survives() {
        assert_eq!(clean_html("H<sub>2</sub>O"), "H<sub>2</sub>O");
    }

    #[test]
    fn test_script_removed() {
        assert_eq!(clean_html("NaCl<script>alert(1)</script>"), "NaCl");
    }
}
