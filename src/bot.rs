// 💬 Chat Front-End
// Transport-agnostic command handling: text in, reply (text + buttons) out

use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::db::{Direction, OwnerId, Transaction};
use crate::error::LedgerError;
use crate::parser::parse_free_text;
use crate::quick::QuickAdd;
use crate::report::{MonthlyReport, Period};
use crate::store::LedgerStore;

const GREETING: &str = "👋 Xin chào! Mình là bot quản lý thu chi.\n\n\
Bạn có thể nhập nhanh như sau:\n\
• vietin chi 10k ăn sáng\n\
• momo thu 200k khách chuyển\n\n\
Hoặc dùng lệnh:\n\
/list — xem danh sách giao dịch\n\
/report — xem báo cáo tháng\n\
/quick — thêm nhanh qua nút chọn";

const NOT_UNDERSTOOD: &str =
    "❓ Không hiểu. Thử gõ như: 'vietin chi 10k ăn sáng' hoặc 'momo thu 200k khách chuyển'.";

const NO_TRANSACTIONS: &str = "📭 Chưa có giao dịch nào.";
const BAD_REPORT_ARG: &str = "Sai định dạng. Dùng /report YYYY-MM";
const BAD_LIST_ARG: &str = "Sai định dạng. Dùng /list N (N > 0)";
const BAD_CALLBACK: &str = "Lỗi dữ liệu.";
const STORAGE_FAILURE: &str = "⚠️ Không thể truy cập dữ liệu lúc này, vui lòng thử lại sau.";

// ============================================================================
// REPLY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    /// One button per row
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            buttons: Vec::new(),
        }
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    /// Raw argument, validated when handled
    List(Option<String>),
    Report(Option<String>),
    Quick,
    Unknown(String),
    /// Anything that is not a slash command
    Text(String),
}

impl Command {
    pub fn parse(message: &str) -> Command {
        let trimmed = message.trim();
        if !trimmed.starts_with('/') {
            return Command::Text(trimmed.to_string());
        }

        let mut parts = trimmed.split_whitespace();
        let head = parts.next().unwrap_or("/");
        // Telegram group syntax: /list@budget_bot
        let name = head[1..].split('@').next().unwrap_or("");
        let arg = parts.next().map(str::to_string);

        match name {
            "start" | "help" => Command::Start,
            "list" => Command::List(arg),
            "report" => Command::Report(arg),
            "quick" => Command::Quick,
            other => Command::Unknown(other.to_string()),
        }
    }
}

// ============================================================================
// BOT
// ============================================================================

pub struct Bot<S: LedgerStore + ?Sized> {
    store: Arc<S>,
    default_limit: NonZeroU32,
}

impl<S: LedgerStore + ?Sized> Bot<S> {
    pub fn new(store: Arc<S>, default_limit: NonZeroU32) -> Self {
        Bot {
            store,
            default_limit,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one inbound chat message
    pub fn handle_message(&self, owner: OwnerId, message: &str) -> Reply {
        match Command::parse(message) {
            Command::Start => Reply::text(GREETING),
            Command::List(arg) => self.list(owner, arg.as_deref()),
            Command::Report(arg) => self.report(owner, arg.as_deref()),
            Command::Quick => quick_menu(),
            Command::Unknown(name) => {
                tracing::debug!(command = %name, "unknown command");
                Reply::text(GREETING)
            }
            Command::Text(text) => self.record_text(owner, &text),
        }
    }

    /// Handle a pressed menu button
    pub fn handle_callback(&self, owner: OwnerId, data: &str) -> Reply {
        let Some(quick) = QuickAdd::from_callback_data(data) else {
            tracing::debug!(data, "rejected callback data");
            return Reply::text(BAD_CALLBACK);
        };

        match quick.record(&*self.store, owner) {
            Ok(_) => Reply::text(format!(
                "Đã thêm {} {} (0đ)",
                direction_word(quick.direction()),
                quick.label()
            )),
            Err(err) => failure(err),
        }
    }

    fn record_text(&self, owner: OwnerId, text: &str) -> Reply {
        let intent = match parse_free_text(text) {
            Ok(intent) => intent,
            Err(_) => return Reply::text(NOT_UNDERSTOOD),
        };

        match self.store.append(
            owner,
            intent.amount,
            intent.direction,
            &intent.account,
            &intent.note,
        ) {
            Ok(_) => Reply::text(format!(
                "✅ Đã ghi {} {:.0}đ từ {} - {}",
                intent.direction, intent.amount, intent.account, intent.note
            )),
            Err(err) => failure(err),
        }
    }

    fn list(&self, owner: OwnerId, arg: Option<&str>) -> Reply {
        let limit = match arg {
            None => self.default_limit,
            Some(raw) => match raw.parse::<NonZeroU32>() {
                Ok(n) => n,
                Err(_) => return Reply::text(BAD_LIST_ARG),
            },
        };

        match self.store.list(owner, limit) {
            Ok(txs) if txs.is_empty() => Reply::text(NO_TRANSACTIONS),
            Ok(txs) => Reply::text(
                txs.iter()
                    .map(format_transaction)
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            ),
            Err(err) => failure(err),
        }
    }

    fn report(&self, owner: OwnerId, arg: Option<&str>) -> Reply {
        let period = match arg {
            None => Period::current(),
            Some(raw) => match raw.parse::<Period>() {
                Ok(period) => period,
                Err(_) => return Reply::text(BAD_REPORT_ARG),
            },
        };

        match self.store.monthly_report(owner, period.year(), period.month()) {
            Ok(report) => Reply::text(format_report(&report)),
            Err(LedgerError::InvalidPeriod(_)) => Reply::text(BAD_REPORT_ARG),
            Err(err) => failure(err),
        }
    }
}

fn quick_menu() -> Reply {
    Reply {
        text: "Chọn nhanh:".to_string(),
        buttons: QuickAdd::ALL
            .iter()
            .map(|q| Button {
                text: q.button_text(),
                callback_data: q.callback_data(),
            })
            .collect(),
    }
}

fn failure(err: LedgerError) -> Reply {
    tracing::warn!(error = %err, "ledger operation failed");
    Reply::text(STORAGE_FAILURE)
}

fn direction_word(direction: Direction) -> &'static str {
    match direction {
        Direction::Income => "thu",
        Direction::Expense => "chi",
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Whole units with thousands separators: 1234567.4 → "1,234,567"
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_transaction(tx: &Transaction) -> String {
    let note = if tx.note.is_empty() {
        String::new()
    } else {
        format!("- {}", tx.note)
    };

    format!(
        "{}. [{}] {} — {} {}\n    {}",
        tx.id,
        tx.direction,
        format_amount(tx.amount),
        tx.label,
        note,
        tx.recorded_at.format("%Y-%m-%d %H:%M:%S")
    )
}

pub fn format_report(report: &MonthlyReport) -> String {
    let mut msg = format!(
        "📊 Báo cáo {}\nTổng thu: {}\nTổng chi: {}\nSố dư: {}\n\nChi tiết:\n",
        report.period,
        format_amount(report.income()),
        format_amount(report.expense()),
        format_amount(report.balance())
    );

    if report.is_empty() {
        msg.push_str("(Không có giao dịch)");
    } else {
        for row in &report.by_label {
            let label = if row.label.is_empty() { "Khác" } else { &row.label };
            msg.push_str(&format!(
                "- [{}] {}: {}\n",
                row.direction,
                label,
                format_amount(row.total)
            ));
        }
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::{Datelike, Utc};
    use pretty_assertions::assert_eq;

    fn bot() -> Bot<SqliteStore> {
        Bot::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            NonZeroU32::new(10).unwrap(),
        )
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/list"), Command::List(None));
        assert_eq!(Command::parse("/list 5"), Command::List(Some("5".to_string())));
        assert_eq!(Command::parse("/report@budget_bot 2024-12"), Command::Report(Some("2024-12".to_string())));
        assert_eq!(Command::parse("/quick"), Command::Quick);
        assert_eq!(Command::parse("/foo"), Command::Unknown("foo".to_string()));
        assert_eq!(
            Command::parse("  vietin chi 10k  "),
            Command::Text("vietin chi 10k".to_string())
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1_000.0), "1,000");
        assert_eq!(format_amount(1_234_567.4), "1,234,567");
        assert_eq!(format_amount(-170_000.0), "-170,000");
    }

    #[test]
    fn test_free_text_is_recorded() {
        let bot = bot();
        let reply = bot.handle_message(1, "vietin chi 10k an sang");
        assert_eq!(reply.text, "✅ Đã ghi expense 10000đ từ vietin - an sang");

        let txs = bot.store().list(1, NonZeroU32::new(1).unwrap()).unwrap();
        assert_eq!(txs[0].label, "vietin");
        assert_eq!(txs[0].amount, 10_000.0);
    }

    #[test]
    fn test_unparsable_text_records_nothing() {
        let bot = bot();
        let reply = bot.handle_message(1, "hello world");
        assert_eq!(reply.text, NOT_UNDERSTOOD);
        assert_eq!(bot.store().count().unwrap(), 0);
    }

    #[test]
    fn test_list_empty_and_filled() {
        let bot = bot();
        assert_eq!(bot.handle_message(1, "/list").text, NO_TRANSACTIONS);

        bot.handle_message(1, "momo thu 200k khach chuyen");
        let reply = bot.handle_message(1, "/list");
        assert!(reply.text.starts_with("1. [income] 200,000 — momo - khach chuyen\n    "));

        assert_eq!(bot.handle_message(1, "/list 0").text, BAD_LIST_ARG);
        assert_eq!(bot.handle_message(1, "/list abc").text, BAD_LIST_ARG);
    }

    #[test]
    fn test_report_current_month() {
        let bot = bot();
        bot.handle_message(1, "momo thu 200k khach chuyen");
        bot.handle_message(1, "vietin chi 10k an sang");
        bot.handle_callback(1, "quick_expense|food");

        let now = Utc::now();
        let reply = bot.handle_message(1, "/report");
        let expected = format!(
            "📊 Báo cáo {}-{:02}\nTổng thu: 200,000\nTổng chi: 10,000\nSố dư: 190,000\n\nChi tiết:\n\
             - [income] momo: 200,000\n- [expense] vietin: 10,000\n- [expense] food: 0\n",
            now.year(),
            now.month()
        );
        assert_eq!(reply.text, expected);
    }

    #[test]
    fn test_report_empty_and_bad_argument() {
        let bot = bot();
        let reply = bot.handle_message(1, "/report 2020-01");
        assert!(reply.text.ends_with("(Không có giao dịch)"));
        assert!(reply.text.contains("Số dư: 0"));

        assert_eq!(bot.handle_message(1, "/report 2024-13").text, BAD_REPORT_ARG);
        assert_eq!(bot.handle_message(1, "/report tomorrow").text, BAD_REPORT_ARG);
    }

    #[test]
    fn test_empty_label_shown_as_other() {
        let bot = bot();
        bot.handle_message(1, "chi 10k food");
        let reply = bot.handle_message(1, "/report");
        assert!(reply.text.contains("- [expense] Khác: 10,000"));
    }

    #[test]
    fn test_quick_menu_and_callbacks() {
        let bot = bot();
        let menu = bot.handle_message(1, "/quick");
        assert_eq!(menu.text, "Chọn nhanh:");
        assert_eq!(menu.buttons.len(), 6);
        assert_eq!(menu.buttons[5].text, "Thu lương");

        let reply = bot.handle_callback(1, &menu.buttons[0].callback_data);
        assert_eq!(reply.text, "Đã thêm chi food (0đ)");
        let reply = bot.handle_callback(1, "quick_income|salary");
        assert_eq!(reply.text, "Đã thêm thu salary (0đ)");

        assert_eq!(bot.handle_callback(1, "garbage").text, BAD_CALLBACK);
        assert_eq!(bot.store().count().unwrap(), 2);
    }

    #[test]
    fn test_works_with_trait_object_store() {
        let store: Arc<dyn LedgerStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let bot = Bot::new(store, NonZeroU32::new(10).unwrap());

        assert_eq!(bot.handle_callback(2, "quick_expense|other").text, "Đã thêm chi other (0đ)");
        assert_eq!(bot.store().list(2, NonZeroU32::new(1).unwrap()).unwrap().len(), 1);
    }
}
