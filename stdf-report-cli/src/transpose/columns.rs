//! Test column header tokenizer
//!
//! Pivoted sheets name their test columns
//! `<test number> <test name>[: <sub-label>]`, where the sub-label may carry
//! trim settings such as `Coarse Code 3, Fine Code 12`.

const COARSE_CODE: &str = "Coarse Code ";
const FINE_CODE: &str = "Fine Code ";

/// A parsed test column header
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestColumn {
    pub number: u64,
    pub name: String,
    /// Sub-label with the trim codes and commas removed
    pub sub_label: Option<String>,
    pub trim_code: Option<u64>,
    pub fine_code: Option<u64>,
}

/// Parse a header; `None` when it is not a test column
pub fn parse_test_column(header: &str) -> Option<TestColumn> {
    let digits_end = header
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(header.len());
    if digits_end == 0 {
        return None;
    }
    let number = header[..digits_end].parse::<u64>().ok()?;

    let rest = &header[digits_end..];
    let body = rest.trim_start();
    if body.len() == rest.len() {
        // At least one whitespace character must separate number and name
        return None;
    }

    let (name, sub) = match body.split_once(':') {
        Some((name, sub)) => (name, Some(sub)),
        None => (body, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let sub = sub.filter(|s| !s.is_empty()).unwrap_or_default();
    let trim_code = find_code(sub, COARSE_CODE).map(|(_, _, v)| v);
    let fine_code = find_code(sub, FINE_CODE).map(|(_, _, v)| v);
    let cleaned = remove_codes(sub).replace(',', "");
    let cleaned = cleaned.trim();

    Some(TestColumn {
        number,
        name: name.to_string(),
        sub_label: (!cleaned.is_empty()).then(|| cleaned.to_string()),
        trim_code,
        fine_code,
    })
}

/// First `<label><digits>` in `text`: (start, end, value)
fn find_code(text: &str, label: &str) -> Option<(usize, usize, u64)> {
    let mut from = 0;
    while let Some(pos) = text[from..].find(label) {
        let start = from + pos;
        let digits_start = start + label.len();
        let digits_len = text[digits_start..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len() - digits_start);
        if digits_len > 0 {
            let end = digits_start + digits_len;
            if let Ok(value) = text[digits_start..end].parse() {
                return Some((start, end, value));
            }
        }
        from = digits_start;
    }
    None
}

/// Strip every coarse/fine code occurrence
fn remove_codes(text: &str) -> String {
    let mut out = text.to_string();
    for label in [COARSE_CODE, FINE_CODE] {
        while let Some((start, end, _)) = find_code(&out, label) {
            out.replace_range(start..end, "");
        }
    }
    out
}
