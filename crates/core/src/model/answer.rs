use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while building an answer key.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnswerKeyError {
    #[error("correct answer must be finite, got {0}")]
    NonFiniteAnswer(f64),

    #[error("tolerance must be finite and > 0, got {0}")]
    InvalidTolerance(f64),

    #[error("label answer cannot be empty")]
    EmptyLabel,
}

/// Why a submitted answer was rejected without counting as an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidAnswer {
    /// Nothing but whitespace was entered.
    Empty,
    /// The text is not a finite number.
    NotANumber,
    /// The text contains characters a name cannot have.
    NotALabel,
}

impl InvalidAnswer {
    /// Feedback line for the presentation layer.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            InvalidAnswer::Empty => "Please enter an answer",
            InvalidAnswer::NotANumber => "Please enter a valid number",
            InvalidAnswer::NotALabel => "Please enter a valid name (letters only)",
        }
    }
}

//
// ─── ANSWER KEY ────────────────────────────────────────────────────────────────
//

/// The expected answer of one problem and how submissions are compared to it.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    /// A number accepted within an absolute tolerance.
    ///
    /// A correct value of exactly zero only accepts an exact zero.
    Numeric { value: f64, tolerance: f64 },
    /// A case-insensitive name (shape, angle type).
    Label(String),
}

impl AnswerKey {
    /// Build a numeric key.
    ///
    /// # Errors
    ///
    /// Returns `AnswerKeyError` if `value` is not finite or `tolerance` is not
    /// a finite positive number.
    pub fn numeric(value: f64, tolerance: f64) -> Result<Self, AnswerKeyError> {
        if !value.is_finite() {
            return Err(AnswerKeyError::NonFiniteAnswer(value));
        }
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(AnswerKeyError::InvalidTolerance(tolerance));
        }
        Ok(Self::Numeric { value, tolerance })
    }

    /// Build a label key. The label is stored normalized.
    ///
    /// # Errors
    ///
    /// Returns `AnswerKeyError::EmptyLabel` if the label is blank.
    pub fn label(value: impl AsRef<str>) -> Result<Self, AnswerKeyError> {
        let normalized = normalize_label(value.as_ref());
        if normalized.is_empty() {
            return Err(AnswerKeyError::EmptyLabel);
        }
        Ok(Self::Label(normalized))
    }

    /// Compare raw user input against this key.
    ///
    /// Returns `Ok(true)` for a correct answer, `Ok(false)` for a wrong one and
    /// `Err` when the input is not a syntactically valid answer at all.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAnswer` if `raw` cannot be interpreted.
    pub fn check(&self, raw: &str) -> Result<bool, InvalidAnswer> {
        match self {
            AnswerKey::Numeric { value, tolerance } => {
                let submitted = parse_number(raw)?;
                Ok(numeric_matches(submitted, *value, *tolerance))
            }
            AnswerKey::Label(expected) => {
                let submitted = parse_label(raw)?;
                Ok(submitted == *expected)
            }
        }
    }

    /// Text shown to the learner once the answer is revealed.
    #[must_use]
    pub fn reveal(&self) -> String {
        match self {
            AnswerKey::Numeric { value, .. } => format_number(*value),
            AnswerKey::Label(label) => label.clone(),
        }
    }
}

/// Numeric comparison with the zero special case.
#[must_use]
pub fn numeric_matches(submitted: f64, correct: f64, tolerance: f64) -> bool {
    if correct == 0.0 {
        return submitted == 0.0;
    }
    (submitted - correct).abs() < tolerance
}

fn parse_number(raw: &str) -> Result<f64, InvalidAnswer> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidAnswer::Empty);
    }
    // `f64::from_str` accepts "inf" and "NaN"; neither is an answer.
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(InvalidAnswer::NotANumber),
    }
}

fn parse_label(raw: &str) -> Result<String, InvalidAnswer> {
    let normalized = normalize_label(raw);
    if normalized.is_empty() {
        return Err(InvalidAnswer::Empty);
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '-')
    {
        return Err(InvalidAnswer::NotALabel);
    }
    Ok(normalized)
}

fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_key_accepts_within_tolerance_only() {
        let key = AnswerKey::numeric(50.0, 0.01).unwrap();
        assert_eq!(key.check("50.005"), Ok(true));
        assert_eq!(key.check(" 49.995 "), Ok(true));
        assert_eq!(key.check("50.02"), Ok(false));
        assert_eq!(key.check("49"), Ok(false));
    }

    #[test]
    fn zero_answer_requires_exact_match() {
        let key = AnswerKey::numeric(0.0, 0.5).unwrap();
        assert_eq!(key.check("0"), Ok(true));
        assert_eq!(key.check("0.0"), Ok(true));
        assert_eq!(key.check("0.1"), Ok(false));
        assert_eq!(key.check("-0.0001"), Ok(false));
    }

    #[test]
    fn non_numbers_are_invalid() {
        let key = AnswerKey::numeric(12.0, 0.1).unwrap();
        assert_eq!(key.check("abc"), Err(InvalidAnswer::NotANumber));
        assert_eq!(key.check("NaN"), Err(InvalidAnswer::NotANumber));
        assert_eq!(key.check("inf"), Err(InvalidAnswer::NotANumber));
        assert_eq!(key.check("   "), Err(InvalidAnswer::Empty));
    }

    #[test]
    fn label_key_is_case_and_space_insensitive() {
        let key = AnswerKey::label("Square-Based  Pyramid").unwrap();
        assert_eq!(key.check("square-based pyramid"), Ok(true));
        assert_eq!(key.check("  SQUARE-BASED   PYRAMID "), Ok(true));
        assert_eq!(key.check("cone"), Ok(false));
        assert_eq!(key.check("cube3"), Err(InvalidAnswer::NotALabel));
    }

    #[test]
    fn key_construction_validates_inputs() {
        assert!(matches!(
            AnswerKey::numeric(f64::NAN, 0.1),
            Err(AnswerKeyError::NonFiniteAnswer(_))
        ));
        assert_eq!(
            AnswerKey::numeric(1.0, 0.0),
            Err(AnswerKeyError::InvalidTolerance(0.0))
        );
        assert_eq!(AnswerKey::label(" "), Err(AnswerKeyError::EmptyLabel));
    }

    #[test]
    fn reveal_trims_trailing_zeros() {
        assert_eq!(AnswerKey::numeric(12.5, 0.1).unwrap().reveal(), "12.5");
        assert_eq!(AnswerKey::numeric(310.0, 0.1).unwrap().reveal(), "310");
        assert_eq!(AnswerKey::numeric(3.14159, 0.1).unwrap().reveal(), "3.14");
    }
}
