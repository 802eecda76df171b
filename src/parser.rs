// 🗣️ Free-Text Interpreter
// Turns "<account> <thu|chi> <amount> <note>" messages into structured intents
//
// Examples:
//   "vietin chi 10k an sang"     → expense 10,000 from vietin, note "an sang"
//   "momo thu 200k khach chuyen" → income 200,000 to momo, note "khach chuyen"

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::db::Direction;
use crate::error::{LedgerError, Result};

// ============================================================================
// GRAMMAR
// ============================================================================

/// Whole-word keyword for an expense
pub const EXPENSE_KEYWORD: &str = "chi";

/// Whole-word keyword for income
pub const INCOME_KEYWORD: &str = "thu";

/// First number in the text, with an optional unit.
///
/// Units glued to the digits ("10k", "2tr", "5nghìn") take any word starting
/// with k/ng/tr. Units separated by one space must be a known unit word, so
/// "5 tra sua" stays 5 with note "tra sua".
static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([0-9]+(?:[.,][0-9]+)?)(?:(k|ng\w*|tr\w*)|\s(k|ngh[iì]n|ng[aà]n|tri[eệ]u|tr)\b)?",
    )
    .expect("amount pattern is a valid regex")
});

/// Multiplier for a unit suffix
fn unit_multiplier(unit: &str) -> f64 {
    if unit.starts_with('k') || unit.starts_with("ng") {
        1_000.0
    } else if unit.starts_with("tr") {
        1_000_000.0
    } else {
        1.0
    }
}

// ============================================================================
// PARSED INTENT
// ============================================================================

/// Staging value produced by the interpreter, converted into a transaction by the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedIntent {
    /// First word before the first "chi"/"thu" substring (may be empty)
    pub account: String,
    pub direction: Direction,
    pub amount: f64,
    /// Everything after the amount token, trimmed
    pub note: String,
}

// ============================================================================
// PARSER
// ============================================================================

/// Interpret one line of free text.
///
/// Fails with [`LedgerError::Unparsable`] when there is no standalone
/// `chi`/`thu` word or no number anywhere in the text. There is no partial result.
pub fn parse_free_text(raw: &str) -> Result<ParsedIntent> {
    let text = raw.trim().to_lowercase();
    let tokens: Vec<&str> = text.split_whitespace().collect();

    // Expense is checked first when both keywords are present
    let direction = if has_token(&tokens, EXPENSE_KEYWORD) {
        Direction::Expense
    } else if has_token(&tokens, INCOME_KEYWORD) {
        Direction::Income
    } else {
        tracing::debug!(input = %raw, "no direction keyword");
        return Err(LedgerError::Unparsable);
    };

    let account = account_prefix(&text);

    // First numeric match in the whole text, even if it precedes the keyword
    let caps = match AMOUNT_PATTERN.captures(&text) {
        Some(caps) => caps,
        None => {
            tracing::debug!(input = %raw, "no amount");
            return Err(LedgerError::Unparsable);
        }
    };

    let whole = caps.get(0).ok_or(LedgerError::Unparsable)?;
    let number = caps.get(1).ok_or(LedgerError::Unparsable)?.as_str();
    let mut amount: f64 = number
        .replace(',', ".")
        .parse()
        .map_err(|_| LedgerError::Unparsable)?;

    if let Some(unit) = caps.get(2).or_else(|| caps.get(3)) {
        amount *= unit_multiplier(unit.as_str());
    }

    if !amount.is_finite() {
        tracing::debug!(input = %raw, "amount overflows");
        return Err(LedgerError::Unparsable);
    }

    let note = text[whole.end()..].trim().to_string();

    Ok(ParsedIntent {
        account,
        direction,
        amount,
        note,
    })
}

fn has_token(tokens: &[&str], keyword: &str) -> bool {
    tokens.iter().any(|t| *t == keyword)
}

/// First word before the first "chi" substring, then before the first "thu"
/// substring. Keywords are raw substrings here, so "richie chi" yields "ri".
/// Nothing left ("chi 10k food") yields an empty account.
fn account_prefix(text: &str) -> String {
    let before_chi = text.split(EXPENSE_KEYWORD).next().unwrap_or("");
    let before_thu = before_chi.split(INCOME_KEYWORD).next().unwrap_or("");

    before_thu
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn intent(account: &str, direction: Direction, amount: f64, note: &str) -> ParsedIntent {
        ParsedIntent {
            account: account.to_string(),
            direction,
            amount,
            note: note.to_string(),
        }
    }

    #[test]
    fn test_expense_with_k_suffix() {
        assert_eq!(
            parse_free_text("vietin chi 10k an sang").unwrap(),
            intent("vietin", Direction::Expense, 10_000.0, "an sang")
        );
    }

    #[test]
    fn test_income_with_k_suffix() {
        assert_eq!(
            parse_free_text("momo thu 200k khach chuyen").unwrap(),
            intent("momo", Direction::Income, 200_000.0, "khach chuyen")
        );
    }

    #[test]
    fn test_no_direction_keyword() {
        assert!(matches!(
            parse_free_text("hello world"),
            Err(LedgerError::Unparsable)
        ));
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        let parsed = parse_free_text("chicken chi 5 test").unwrap();
        assert_eq!(parsed, intent("", Direction::Expense, 5.0, "test"));

        // "chi" only inside another word
        assert!(matches!(
            parse_free_text("chicken 5 test"),
            Err(LedgerError::Unparsable)
        ));
        assert!(matches!(
            parse_free_text("thuoc 5 test"),
            Err(LedgerError::Unparsable)
        ));
    }

    #[test]
    fn test_no_amount() {
        assert!(matches!(
            parse_free_text("vietin chi an sang"),
            Err(LedgerError::Unparsable)
        ));
    }

    #[test]
    fn test_million_suffix_with_decimal() {
        let parsed = parse_free_text("tcb chi 1.5tr tien nha").unwrap();
        assert_eq!(parsed.amount, 1_500_000.0);
        assert_eq!(parsed.note, "tien nha");

        let comma = parse_free_text("tcb chi 1,5tr tien nha").unwrap();
        assert_eq!(comma.amount, 1_500_000.0);

        let word = parse_free_text("tcb thu 2 triệu lương").unwrap();
        assert_eq!(word.amount, 2_000_000.0);
        assert_eq!(word.note, "lương");
    }

    #[test]
    fn test_thousand_suffixes() {
        assert_eq!(parse_free_text("cash chi 3 nghin banh mi").unwrap().amount, 3_000.0);
        assert_eq!(parse_free_text("cash chi 3 nghìn banh mi").unwrap().amount, 3_000.0);
        assert_eq!(parse_free_text("cash chi 3ngàn banh mi").unwrap().amount, 3_000.0);
        assert_eq!(parse_free_text("cash chi 25k").unwrap().amount, 25_000.0);
        assert_eq!(parse_free_text("cash chi 2.5k tra da").unwrap().amount, 2_500.0);
    }

    #[test]
    fn test_bare_number_taken_literally() {
        let parsed = parse_free_text("cash chi 45000 cafe").unwrap();
        assert_eq!(parsed.amount, 45_000.0);
        assert_eq!(parsed.note, "cafe");
    }

    #[test]
    fn test_separated_word_that_is_not_a_unit() {
        let parsed = parse_free_text("cash chi 5 tra sua").unwrap();
        assert_eq!(parsed.amount, 5.0);
        assert_eq!(parsed.note, "tra sua");

        let parsed = parse_free_text("cash chi 30 khach").unwrap();
        assert_eq!(parsed.amount, 30.0);
        assert_eq!(parsed.note, "khach");
    }

    #[test]
    fn test_normalizes_case_and_whitespace() {
        assert_eq!(
            parse_free_text("   VietIn  CHI 10K  Ăn Sáng  ").unwrap(),
            intent("vietin", Direction::Expense, 10_000.0, "ăn sáng")
        );
    }

    #[test]
    fn test_expense_wins_when_both_keywords_present() {
        let parsed = parse_free_text("momo thu 50k chi ho").unwrap();
        assert_eq!(parsed.direction, Direction::Expense);
        assert_eq!(parsed.account, "momo");
        assert_eq!(parsed.amount, 50_000.0);
        assert_eq!(parsed.note, "chi ho");
    }

    #[test]
    fn test_first_number_wins_even_before_keyword() {
        let parsed = parse_free_text("acb2 chi 100k test").unwrap();
        assert_eq!(parsed.account, "acb2");
        assert_eq!(parsed.amount, 2.0);
        assert_eq!(parsed.note, "chi 100k test");
    }

    #[test]
    fn test_missing_account_is_empty() {
        let parsed = parse_free_text("chi 10k food").unwrap();
        assert_eq!(parsed, intent("", Direction::Expense, 10_000.0, "food"));
    }

    #[test]
    fn test_empty_note() {
        let parsed = parse_free_text("momo thu 200k").unwrap();
        assert_eq!(parsed.note, "");
    }

    #[test]
    fn test_account_stops_at_keyword_substring() {
        assert_eq!(parse_free_text("kathu thu 5k luong").unwrap().account, "ka");
        assert_eq!(parse_free_text("richie chi 5k an").unwrap().account, "ri");
        assert_eq!(parse_free_text("machine thu 7 x").unwrap().account, "ma");

        let parsed = parse_free_text("kathu thu 5k luong").unwrap();
        assert_eq!(parsed.direction, Direction::Income);
        assert_eq!(parsed.amount, 5_000.0);
    }

    #[test]
    fn test_overflowing_amount_is_unparsable() {
        let huge = format!("vietin chi 1{} x", "0".repeat(400));
        assert!(matches!(parse_free_text(&huge), Err(LedgerError::Unparsable)));
    }

    #[test]
    fn test_zero_amount() {
        let parsed = parse_free_text("momo thu 0 test").unwrap();
        assert_eq!(parsed.amount, 0.0);
    }
}
