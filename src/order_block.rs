//! # Order Block Module
//!
//! The assistant is asked to close every reply with an order-state block:
//!
//! ```text
//! <pedido>{"customer_name": "Ana", "products": [{"name": "AI Virtual Assistant", "quantity": 2}]}</pedido>
//! ```
//!
//! This module strips that block from the visible reply and turns it into a
//! [`DraftUpdate`] that can be applied to the chat's [`OrderDraft`].

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::draft::{DraftLine, OrderDraft};
use crate::models::{Catalog, CatalogOrigin};

lazy_static! {
    static ref ORDER_BLOCK_REGEX: Regex =
        Regex::new(r"(?is)<pedido>(.*?)</pedido>").expect("Order block pattern should be valid");
}

/// A product as named by the assistant
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductMention {
    pub name: String,
    pub quantity: i32,
}

/// Order fields inferred by the assistant; absent fields leave the draft untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DraftUpdate {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<ProductMention>>,
}

/// Assistant reply split into the customer-visible text and the order state
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub text: String,
    pub update: Option<DraftUpdate>,
}

/// Remove every order block from `raw`; the last well-formed one wins
pub fn split_reply(raw: &str) -> ParsedReply {
    let mut update = None;

    for captures in ORDER_BLOCK_REGEX.captures_iter(raw) {
        let body = strip_code_fence(&captures[1]);
        match serde_json::from_str::<DraftUpdate>(body) {
            Ok(parsed) => update = Some(parsed),
            Err(e) => warn!(error = %e, "Ignoring malformed order block"),
        }
    }

    let text = ORDER_BLOCK_REGEX.replace_all(raw, "").trim().to_string();
    ParsedReply { text, update }
}

fn strip_code_fence(body: &str) -> &str {
    let body = body.trim().trim_matches('`').trim();
    body.strip_prefix("json").map(str::trim).unwrap_or(body)
}

/// Apply `update` to `draft`, resolving product names against `catalog`.
///
/// Empty strings never overwrite collected values. A present product list
/// replaces the draft's lines. Returns the names that matched no product.
///
/// Built-in fallback ids do not identify store rows, so a fallback catalog
/// never resolves or replaces product lines.
pub fn apply_update(
    draft: &mut OrderDraft,
    update: &DraftUpdate,
    catalog: &Catalog,
) -> Vec<String> {
    fill(&mut draft.customer_name, &update.customer_name);
    fill(&mut draft.delivery_address, &update.delivery_address);
    fill(&mut draft.payment_method, &update.payment_method);
    fill(&mut draft.delivery_date, &update.delivery_date);

    let mut unresolved = Vec::new();
    if let Some(mentions) = &update.products {
        if catalog.origin == CatalogOrigin::Fallback {
            warn!(
                mentioned = mentions.len(),
                kept = draft.products.len(),
                "Catalog is in fallback mode, keeping current product lines"
            );
            return unresolved;
        }
        let mut lines = Vec::with_capacity(mentions.len());
        for mention in mentions.iter().filter(|m| !m.name.trim().is_empty()) {
            match catalog.find_product(&mention.name) {
                Some(product) => lines.push(DraftLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    quantity: mention.quantity,
                }),
                None => unresolved.push(mention.name.clone()),
            }
        }
        draft.set_products(lines);
    }

    unresolved
}

fn fill(field: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        if !value.is_empty() {
            *field = value.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{default_categories, default_products};

    fn catalog() -> Catalog {
        Catalog {
            origin: CatalogOrigin::Live,
            products: default_products(),
            categories: default_categories(),
        }
    }

    #[test]
    fn test_split_reply_strips_block() {
        let raw = "¡Perfecto Ana! ¿Confirmas el pedido?\n<pedido>{\"customer_name\": \"Ana\", \"products\": [{\"name\": \"AI Virtual Assistant\", \"quantity\": 2}]}</pedido>";

        let parsed = split_reply(raw);

        assert_eq!(parsed.text, "¡Perfecto Ana! ¿Confirmas el pedido?");
        let update = parsed.update.unwrap();
        assert_eq!(update.customer_name.as_deref(), Some("Ana"));
        assert_eq!(update.products.unwrap()[0].quantity, 2);
    }

    #[test]
    fn test_split_reply_accepts_code_fence() {
        let raw = "Listo.\n<PEDIDO>\n```json\n{\"payment_method\": \"cash\"}\n```\n</PEDIDO>";
        let parsed = split_reply(raw);
        assert_eq!(parsed.text, "Listo.");
        assert_eq!(
            parsed.update.unwrap().payment_method.as_deref(),
            Some("cash")
        );
    }

    #[test]
    fn test_malformed_block_is_removed_but_ignored() {
        let parsed = split_reply("Hola <pedido>{not json}</pedido>");
        assert_eq!(parsed.text, "Hola");
        assert!(parsed.update.is_none());
    }

    #[test]
    fn test_reply_without_block() {
        let parsed = split_reply("  ¿Qué producto te interesa?  ");
        assert_eq!(parsed.text, "¿Qué producto te interesa?");
        assert!(parsed.update.is_none());
    }

    #[test]
    fn test_apply_update_resolves_products_and_keeps_fields() {
        let mut draft = OrderDraft {
            customer_name: "Ana".to_string(),
            ..Default::default()
        };
        let update = DraftUpdate {
            customer_name: Some("".to_string()),
            delivery_address: Some(" Calle 5 ".to_string()),
            products: Some(vec![
                ProductMention {
                    name: "ai virtual assistant".to_string(),
                    quantity: 2,
                },
                ProductMention {
                    name: "Quantum Toaster".to_string(),
                    quantity: 1,
                },
            ]),
            ..Default::default()
        };

        let unresolved = apply_update(&mut draft, &update, &catalog());

        assert_eq!(unresolved, vec!["Quantum Toaster".to_string()]);
        assert_eq!(draft.customer_name, "Ana");
        assert_eq!(draft.delivery_address, "Calle 5");
        assert_eq!(draft.products.len(), 1);
        assert_eq!(draft.products[0].product_id, 2);
        assert_eq!(draft.products[0].name, "AI Virtual Assistant");
    }

    #[test]
    fn test_apply_update_without_products_keeps_lines() {
        let mut draft = OrderDraft::default();
        draft.add_product(2, "AI Virtual Assistant", 1);

        apply_update(&mut draft, &DraftUpdate::default(), &catalog());

        assert_eq!(draft.products.len(), 1);
    }

    #[test]
    fn test_blank_product_names_are_skipped() {
        let parsed = split_reply(
            "Hola\n<pedido>{\"products\": [{\"name\": \"\", \"quantity\": 1}]}</pedido>",
        );
        let mut draft = OrderDraft::default();

        let unresolved = apply_update(&mut draft, &parsed.update.unwrap(), &catalog());

        assert!(unresolved.is_empty());
        assert!(draft.products.is_empty());
    }

    #[test]
    fn test_fallback_catalog_keeps_product_lines() {
        let parsed = split_reply(
            "Anotado\n<pedido>{\"payment_method\": \"cash\", \
             \"products\": [{\"name\": \"AI Virtual Assistant\", \"quantity\": 2}]}</pedido>",
        );
        let fallback = Catalog {
            origin: CatalogOrigin::Fallback,
            ..catalog()
        };
        let mut draft = OrderDraft::default();
        draft.add_product(7, "Content Generator", 1);

        let unresolved = apply_update(&mut draft, &parsed.update.unwrap(), &fallback);

        assert!(unresolved.is_empty());
        assert_eq!(draft.payment_method, "cash");
        assert_eq!(draft.products.len(), 1);
        assert_eq!(draft.products[0].product_id, 7);
        assert_eq!(draft.products[0].quantity, 1);
    }

    #[test]
    fn test_repeated_huge_quantities_never_wrap() {
        let parsed = split_reply(
            "Listo\n<pedido>{\"products\": [\
             {\"name\": \"AI Virtual Assistant\", \"quantity\": 2147483647}, \
             {\"name\": \"ai virtual assistant\", \"quantity\": 2147483647}]}</pedido>",
        );
        let mut draft = OrderDraft::default();

        apply_update(&mut draft, &parsed.update.unwrap(), &catalog());

        assert_eq!(draft.products.len(), 1);
        assert_eq!(draft.products[0].quantity, i32::MAX);
    }
}
