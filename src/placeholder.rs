//! Placeholder normalization.
//!
//! Platforms spell runtime parameters differently (`%d`, `%@`, `{0}`), so the
//! same UI string extracted on two platforms would never compare equal.
//! [`normalize`] rewrites every recognized parameter as `{N}`, numbered by
//! order of appearance, and returns the original parameter texts so that
//! [`denormalize`] can put them back.

use indexmap::IndexMap;

/// printf flag characters.
const PRINTF_FLAGS: &str = "-+#0123456789";
/// printf width (and precision) characters.
const PRINTF_WIDTH: &str = "0123456789*";
/// Separator between width and precision.
const PRINTF_PRECISION_SEP: char = '.';
/// printf length modifiers.
const PRINTF_LENGTH: &str = "hlL";
/// printf conversion specifiers. `%` only ever appears as the `%%` escape.
const PRINTF_SPECIFIERS: &str = "cdieEfgGosuxXpn%@";

/// Position inside a printf conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrintfPhase {
    Flags,
    Width,
    Precision,
    Length,
}

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Text,
    Printf(PrintfPhase),
    /// Inside `{`, with the number of digits seen so far.
    Brace(usize),
}

/// Result of feeding one character to a printf conversion.
enum PrintfStep {
    /// The character belongs to the conversion; stay in the given phase.
    Continue(PrintfPhase),
    /// The character completed a conversion.
    Complete,
    /// The character cannot continue the conversion.
    Reject,
}

fn printf_step(phase: PrintfPhase, c: char) -> PrintfStep {
    let mut phase = phase;
    loop {
        match phase {
            PrintfPhase::Flags => {
                if PRINTF_FLAGS.contains(c) {
                    return PrintfStep::Continue(PrintfPhase::Flags);
                }
                phase = PrintfPhase::Width;
            }
            PrintfPhase::Width => {
                if c == PRINTF_PRECISION_SEP {
                    return PrintfStep::Continue(PrintfPhase::Precision);
                }
                if PRINTF_WIDTH.contains(c) {
                    return PrintfStep::Continue(PrintfPhase::Width);
                }
                phase = PrintfPhase::Length;
            }
            PrintfPhase::Precision => {
                if c == PRINTF_PRECISION_SEP || PRINTF_WIDTH.contains(c) {
                    return PrintfStep::Continue(PrintfPhase::Precision);
                }
                phase = PrintfPhase::Length;
            }
            PrintfPhase::Length => {
                if PRINTF_LENGTH.contains(c) {
                    return PrintfStep::Continue(PrintfPhase::Length);
                }
                return if PRINTF_SPECIFIERS.contains(c) {
                    PrintfStep::Complete
                } else {
                    PrintfStep::Reject
                };
            }
        }
    }
}

/// Accumulates canonical output and captured parameters.
#[derive(Debug, Default)]
struct Normalizer {
    output: String,
    params: Vec<String>,
    token: String,
}

impl Normalizer {
    fn capture(&mut self) {
        let index = self.params.len();
        self.output.push('{');
        self.output.push_str(&index.to_string());
        self.output.push('}');
        self.params.push(std::mem::take(&mut self.token));
    }

    fn flush_token(&mut self) {
        self.output.push_str(&self.token);
        self.token.clear();
    }

    /// Handles `c` outside of any parameter and returns the next state.
    fn start(&mut self, c: char) -> ScanState {
        match c {
            '%' => {
                self.token.push(c);
                ScanState::Printf(PrintfPhase::Flags)
            }
            '{' => {
                self.token.push(c);
                ScanState::Brace(0)
            }
            _ => {
                self.output.push(c);
                ScanState::Text
            }
        }
    }

    fn feed(&mut self, state: ScanState, c: char) -> ScanState {
        match state {
            ScanState::Text => self.start(c),
            ScanState::Printf(phase) => {
                if c == '%' {
                    // `%%` (or `%5%`) is literal text, and scanning resumes after it.
                    self.token.push(c);
                    self.flush_token();
                    return ScanState::Text;
                }
                match printf_step(phase, c) {
                    PrintfStep::Continue(next) => {
                        self.token.push(c);
                        ScanState::Printf(next)
                    }
                    PrintfStep::Complete => {
                        self.token.push(c);
                        self.capture();
                        ScanState::Text
                    }
                    PrintfStep::Reject => {
                        self.flush_token();
                        self.start(c)
                    }
                }
            }
            ScanState::Brace(digits) => {
                if c.is_ascii_digit() {
                    self.token.push(c);
                    ScanState::Brace(digits + 1)
                } else if c == '}' && digits > 0 {
                    self.token.push(c);
                    self.capture();
                    ScanState::Text
                } else {
                    self.flush_token();
                    self.start(c)
                }
            }
        }
    }

    fn finish(mut self) -> (String, Vec<String>) {
        self.flush_token();
        (self.output, self.params)
    }
}

/// Replaces printf-style (`%03.3lld`, `%@`) and brace-style (`{5}`) parameters
/// with `{0}`, `{1}`, ... in order of appearance.
///
/// Returns the canonical string and the exact text of every replaced
/// parameter. Sequences that look like the start of a parameter but never
/// complete one are copied through unchanged; this function does not fail.
///
/// # Examples
/// ```
/// use l10n_sync::placeholder::normalize;
///
/// let (canonical, params) = normalize("%03d of %03.3lld for {0} %@");
/// assert_eq!(canonical, "{0} of {1} for {2} {3}");
/// assert_eq!(params, vec!["%03d", "%03.3lld", "{0}", "%@"]);
/// ```
#[must_use]
pub fn normalize(raw: &str) -> (String, Vec<String>) {
    let mut normalizer = Normalizer::default();
    let mut state = ScanState::Text;
    for c in raw.chars() {
        state = normalizer.feed(state, c);
    }
    normalizer.finish()
}

/// Picks two private-use characters that occur nowhere in `texts`.
fn pick_sentinels(texts: &[&str]) -> (char, char) {
    let mut candidates = ('\u{E000}'..='\u{F8FF}')
        .filter(|candidate| !texts.iter().any(|text| text.contains(*candidate)));
    let open = candidates.next().unwrap_or('\u{E000}');
    let close = candidates.next().unwrap_or('\u{E001}');
    (open, close)
}

/// Reverses [`normalize`] using a parameter list, possibly taken from a
/// different platform's occurrence of the same string.
///
/// Literal braces in `canonical` are first swapped for sentinels. Then each
/// `{k}` that has a parameter is substituted, and finally the sentinels become
/// braces again. Substituted parameters are never re-scanned, so a parameter
/// such as `{5}` cannot be mistaken for an index token. Indices without a
/// parameter stay as they are.
#[must_use]
pub fn denormalize(canonical: &str, params: &[String]) -> String {
    let texts: Vec<&str> =
        std::iter::once(canonical).chain(params.iter().map(String::as_str)).collect();
    let (open, close) = pick_sentinels(&texts);

    let mut result: String = canonical
        .chars()
        .map(|c| match c {
            '{' => open,
            '}' => close,
            other => other,
        })
        .collect();

    for (index, param) in params.iter().enumerate() {
        let token = format!("{open}{index}{close}");
        result = result.replace(&token, param);
    }

    result.chars().map(|c| if c == open { '{' } else if c == close { '}' } else { c }).collect()
}

/// Adds original-style entries for native strings whose parameters were
/// normalized away.
///
/// For each raw native string that has at least one parameter and a
/// translated canonical form in `translations`, inserts
/// `raw -> denormalize(translation, params)`. Returns a new map; the input is
/// left untouched.
#[must_use]
pub fn restore_params_to_translations<S: AsRef<str>>(
    native_strings: impl IntoIterator<Item = S>,
    translations: &IndexMap<String, Option<String>>,
) -> IndexMap<String, Option<String>> {
    let mut restored = translations.clone();
    for raw in native_strings {
        let raw = raw.as_ref();
        let (canonical, params) = normalize(raw);
        if params.is_empty() || canonical == raw {
            continue;
        }
        if let Some(Some(translation)) = translations.get(&canonical) {
            restored.insert(raw.to_string(), Some(denormalize(translation, &params)));
        }
    }
    restored
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::matchers::is_empty as empty;
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn params(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[rstest]
    #[case::empty("")]
    #[case::plain("Hello, world")]
    #[case::escaped_percent("100%% sure")]
    #[case::lone_percent("100% sure")]
    #[case::trailing_percent("50 %")]
    #[case::named_brace("{name} is here")]
    #[case::empty_brace("{} stays")]
    #[case::unclosed_brace("{12 apples")]
    #[case::dollar("costs %$")]
    fn normalize_without_params_is_identity(#[case] raw: &str) {
        let (canonical, found) = normalize(raw);

        assert_that!(canonical, eq(raw));
        assert_that!(found, empty());
    }

    #[googletest::test]
    fn normalize_mixed_printf_and_brace_params() {
        let (canonical, found) = normalize("%03d of %03.3lld for {0} %@");

        expect_that!(canonical, eq("{0} of {1} for {2} {3}"));
        expect_that!(found, elements_are![eq("%03d"), eq("%03.3lld"), eq("{0}"), eq("%@")]);
    }

    #[googletest::test]
    fn normalize_resumes_after_percent_escape() {
        let (canonical, found) = normalize("-3.3lld of {5} %$ {x} %d%%%d %");

        expect_that!(canonical, eq("-3.3lld of {0} %$ {x} {1}%%{2} %"));
        expect_that!(found, elements_are![eq("{5}"), eq("%d"), eq("%d")]);
    }

    #[googletest::test]
    fn normalize_keeps_rejected_prefix_and_rescans_rejecting_char() {
        let (canonical, found) = normalize("%-5q then %{1}");

        expect_that!(canonical, eq("%-5q then %{0}"));
        expect_that!(found, elements_are![eq("{1}")]);
    }

    #[googletest::test]
    fn normalize_brace_interrupted_by_printf() {
        let (canonical, found) = normalize("{1%d}");

        expect_that!(canonical, eq("{1{0}}"));
        expect_that!(found, elements_are![eq("%d")]);
    }

    #[rstest]
    #[case::width_star("%*d", "%*d")]
    #[case::precision_star("%.*s", "%.*s")]
    #[case::long_long("%llu", "%llu")]
    #[case::long_double("%Lf", "%Lf")]
    #[case::object("%@", "%@")]
    #[case::hex("%08X", "%08X")]
    #[case::plus_flag("%+i", "%+i")]
    fn normalize_printf_grammar(#[case] raw: &str, #[case] param: &str) {
        let (canonical, found) = normalize(raw);

        assert_that!(canonical, eq("{0}"));
        assert_that!(found, elements_are![eq(param)]);
    }

    #[rstest]
    #[case("")]
    #[case("%03d of %03.3lld for {0} %@")]
    #[case("{literal} {0} and }{ and {{1}} %%")]
    #[case("{1%d} {x %s")]
    #[case("Tap \u{2026} for %1$@? no: %q")]
    #[case("\u{E000}0\u{E001} sentinel lookalike {0}")]
    fn denormalize_reverses_normalize(#[case] raw: &str) {
        let (canonical, found) = normalize(raw);

        assert_that!(denormalize(&canonical, &found), eq(raw));
    }

    #[googletest::test]
    fn denormalize_with_other_platform_params() {
        let restored = denormalize("{0} of {1} %$ {x} {2} %", &params(&["{1}", "{5}", "%d"]));

        expect_that!(restored, eq("{1} of {5} %$ {x} %d %"));
    }

    #[googletest::test]
    fn denormalize_leaves_unknown_indices() {
        let restored = denormalize("{0} and {3}", &params(&["%s"]));

        expect_that!(restored, eq("%s and {3}"));
    }

    #[googletest::test]
    fn restore_params_adds_raw_entries() {
        let mut translations = IndexMap::new();
        translations.insert("{0} files".to_string(), Some("{0} fichiers".to_string()));
        translations.insert("Open".to_string(), Some("Ouvrir".to_string()));
        translations.insert("{0} left".to_string(), None);

        let restored =
            restore_params_to_translations(["%d files", "Open", "%d left", "{0} files"], &translations);

        expect_that!(restored.get("%d files"), some(eq(&Some("%d fichiers".to_string()))));
        expect_that!(restored.get("%d left"), none());
        expect_that!(restored.get("{0} files"), some(eq(&Some("{0} fichiers".to_string()))));
        expect_that!(restored.len(), eq(4));
        expect_that!(translations.len(), eq(3));
    }
}
