// ⚡ Quick-Add Shortcuts
// Closed set of menu buttons that record a zero-amount placeholder

use crate::db::{Direction, OwnerId, TransactionId};
use crate::error::Result;
use crate::store::LedgerStore;

/// Note attached to every shortcut entry
pub const QUICK_NOTE: &str = "quick add (0)";

/// One predefined (direction, label) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickAdd {
    ExpenseFood,
    ExpenseTransport,
    ExpenseSalary,
    ExpenseShopping,
    ExpenseOther,
    IncomeSalary,
}

impl QuickAdd {
    /// Menu order
    pub const ALL: [QuickAdd; 6] = [
        QuickAdd::ExpenseFood,
        QuickAdd::ExpenseTransport,
        QuickAdd::ExpenseSalary,
        QuickAdd::ExpenseShopping,
        QuickAdd::ExpenseOther,
        QuickAdd::IncomeSalary,
    ];

    pub fn direction(&self) -> Direction {
        match self {
            QuickAdd::IncomeSalary => Direction::Income,
            _ => Direction::Expense,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuickAdd::ExpenseFood => "food",
            QuickAdd::ExpenseTransport => "transport",
            QuickAdd::ExpenseSalary | QuickAdd::IncomeSalary => "salary",
            QuickAdd::ExpenseShopping => "shopping",
            QuickAdd::ExpenseOther => "other",
        }
    }

    /// Text shown on the button
    pub fn button_text(&self) -> String {
        match self {
            QuickAdd::IncomeSalary => "Thu lương".to_string(),
            _ => format!("Chi {}", self.label()),
        }
    }

    /// Opaque payload sent back when the button is pressed, e.g. `quick_expense|food`
    pub fn callback_data(&self) -> String {
        format!("quick_{}|{}", self.direction().as_str(), self.label())
    }

    pub fn from_callback_data(data: &str) -> Option<QuickAdd> {
        let (action, label) = data.split_once('|')?;
        if label.contains('|') {
            return None;
        }

        QuickAdd::ALL
            .into_iter()
            .find(|q| action == format!("quick_{}", q.direction().as_str()) && label == q.label())
    }

    /// Append the zero-amount entry for this shortcut
    pub fn record<S: LedgerStore + ?Sized>(&self, store: &S, owner: OwnerId) -> Result<TransactionId> {
        store.append(owner, 0.0, self.direction(), self.label(), QUICK_NOTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use std::num::NonZeroU32;

    #[test]
    fn test_callback_data_round_trips_for_every_shortcut() {
        for quick in QuickAdd::ALL {
            assert_eq!(QuickAdd::from_callback_data(&quick.callback_data()), Some(quick));
        }
    }

    #[test]
    fn test_callback_data_format() {
        assert_eq!(QuickAdd::ExpenseFood.callback_data(), "quick_expense|food");
        assert_eq!(QuickAdd::IncomeSalary.callback_data(), "quick_income|salary");
        assert_eq!(QuickAdd::ExpenseSalary.callback_data(), "quick_expense|salary");
    }

    #[test]
    fn test_unknown_callback_data_rejected() {
        for data in ["", "quick_expense", "quick_expense|pets", "quick_income|food", "a|b|c", "quick_expense|food|x"] {
            assert_eq!(QuickAdd::from_callback_data(data), None, "{:?}", data);
        }
    }

    #[test]
    fn test_button_text() {
        assert_eq!(QuickAdd::ExpenseTransport.button_text(), "Chi transport");
        assert_eq!(QuickAdd::IncomeSalary.button_text(), "Thu lương");
    }

    #[test]
    fn test_record_appends_zero_amount() {
        let store = SqliteStore::open_in_memory().unwrap();
        QuickAdd::IncomeSalary.record(&store, 5).unwrap();

        let txs = store.list(5, NonZeroU32::new(1).unwrap()).unwrap();
        assert_eq!(txs[0].amount, 0.0);
        assert_eq!(txs[0].direction, Direction::Income);
        assert_eq!(txs[0].label, "salary");
        assert_eq!(txs[0].note, QUICK_NOTE);
    }
}
