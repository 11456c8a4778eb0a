// src/parse/text.rs
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static MULTI_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").unwrap());

/// Accent- and case-fold a header or name for comparison: NFKD decomposition
/// with combining marks stripped, internal whitespace collapsed, trimmed,
/// uppercased. `" Duração "` and `"DURACAO"` fold to the same string.
pub fn fold(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    MULTI_WS
        .replace_all(stripped.trim(), " ")
        .to_uppercase()
}

/// Force a single space around hyphens so `"PRE-PROJETO"`, `"PRE -PROJETO"`
/// and `"PRE - PROJETO"` all compare equal after folding.
pub fn normalize_hyphen_spaces(s: &str) -> String {
    HYPHEN_SPACES.replace_all(s, " - ").to_string()
}

/// Case-insensitive, accent-insensitive substring match used for milestone
/// markers ("Fundação", "Fim Físico", ...).
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

/// Module label from a raw module index cell: `"0"` → `"MÓD. 01"`,
/// `"1,0"` → `"MÓD. 02"`. Anything unparseable counts as index 0.
pub fn module_label(raw: &str) -> String {
    let idx = raw
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map(|v| v as i64)
        .unwrap_or(0);
    format!("MÓD. {:02}", idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents_case_and_padding() {
        assert_eq!(fold(" idempreendimento "), "IDEMPREENDIMENTO");
        assert_eq!(fold("Duração"), "DURACAO");
        assert_eq!(fold("Fim  Físico"), "FIM FISICO");
        assert_eq!(fold("término"), "TERMINO");
    }

    #[test]
    fn hyphen_spacing_is_normalized() {
        assert_eq!(normalize_hyphen_spaces("PRE-PROJETO"), "PRE - PROJETO");
        assert_eq!(normalize_hyphen_spaces("PRE  -  PROJETO"), "PRE - PROJETO");
        assert_eq!(normalize_hyphen_spaces("PRE - PROJETO"), "PRE - PROJETO");
    }

    #[test]
    fn marker_match_ignores_accents() {
        assert!(contains_folded("Início da fundacao", "Fundação"));
        assert!(contains_folded("FIM FÍSICO DA OBRA", "Fim Fisico"));
        assert!(!contains_folded("Estrutura", "Fundação"));
    }

    #[test]
    fn module_labels_are_one_based_and_padded() {
        assert_eq!(module_label("0"), "MÓD. 01");
        assert_eq!(module_label("1,0"), "MÓD. 02");
        assert_eq!(module_label("9"), "MÓD. 10");
        assert_eq!(module_label("n/a"), "MÓD. 01");
    }
}
