//! # Localization Tests
//!
//! Message lookup, language resolution and argument formatting for the
//! embedded Fluent resources.

use order_assistant::localization::{t_args_lang, t_lang, LocalizationManager};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("draft-none", "es", None);
        assert_eq!(message, "No hay pedido en proceso");
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_unsupported_language_falls_back_to_spanish() {
        let manager = setup_localization();

        assert_eq!(manager.resolve_language(Some("fr")), "es");
        assert_eq!(manager.resolve_language(None), "es");

        let message = manager.get_message_in_language("draft-missing", "fr", None);
        assert_eq!(message, "No especificado");
    }

    #[test]
    fn test_region_subtag_is_ignored() {
        let manager = setup_localization();

        assert_eq!(manager.resolve_language(Some("en-US")), "en");
        assert_eq!(manager.resolve_language(Some("ES_ar")), "es");
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("order_id", "314");

        let message = manager.get_message_in_language("order-registered", "es", Some(&args));
        assert!(message.contains("314"));
        // No bidi isolation marks around the placeable
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_every_key_exists_in_both_languages() {
        let manager = setup_localization();
        let keys = [
            "apology-processing",
            "apology-commit",
            "order-registered",
            "order-cancelled",
            "draft-none",
            "draft-header",
            "draft-customer",
            "draft-address",
            "draft-payment",
            "draft-date",
            "draft-products",
            "draft-missing",
        ];

        for language in ["es", "en"] {
            for key in keys {
                let message = manager.get_message_in_language(key, language, None);
                assert!(
                    !message.starts_with("Missing"),
                    "{key} missing for {language}"
                );
            }
        }
    }

    #[test]
    fn test_global_helpers() {
        assert_eq!(t_lang("draft-none", Some("en")), "No order in progress");
        assert_eq!(
            t_args_lang("order-registered", &[("order_id", "9")], Some("en")),
            "Order registered successfully! Order number: 9"
        );
    }
}
