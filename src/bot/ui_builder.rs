//! UI Builder module for formatting draft status and reply suffixes

use crate::draft::OrderDraft;
use crate::localization::{t_args_lang, t_lang};

/// Human-readable status of a draft, as shown to the assistant
pub fn format_draft_summary(draft: &OrderDraft, language_code: Option<&str>) -> String {
    if *draft == OrderDraft::default() {
        return t_lang("draft-none", language_code);
    }

    let missing = t_lang("draft-missing", language_code);
    let field = |value: &str| {
        if value.is_empty() {
            missing.clone()
        } else {
            value.to_string()
        }
    };

    let products = if draft.products.is_empty() {
        missing.clone()
    } else {
        draft
            .products
            .iter()
            .map(|line| format!("{} ({})", line.name, line.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "{}\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n{}: {}",
        t_lang("draft-header", language_code),
        t_lang("draft-customer", language_code),
        field(&draft.customer_name),
        t_lang("draft-address", language_code),
        field(&draft.delivery_address),
        t_lang("draft-payment", language_code),
        field(&draft.payment_method),
        t_lang("draft-date", language_code),
        field(&draft.delivery_date),
        t_lang("draft-products", language_code),
        products
    )
}

/// Append a localized notice to the assistant's reply
pub fn append_notice(reply: &str, key: &str, language_code: Option<&str>) -> String {
    join_reply(reply, &t_lang(key, language_code))
}

/// Assistant reply followed by the order registration notice
pub fn format_confirmation(reply: &str, order_id: i32, language_code: Option<&str>) -> String {
    let notice = t_args_lang(
        "order-registered",
        &[("order_id", &order_id.to_string())],
        language_code,
    );
    join_reply(reply, &notice)
}

fn join_reply(reply: &str, notice: &str) -> String {
    if reply.is_empty() {
        notice.to_string()
    } else {
        format!("{reply}\n\n{notice}")
    }
}
