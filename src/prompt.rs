//! Prompt composition for the assistant oracle.
//!
//! Pure functions only: everything the prompt needs is passed in.

use crate::models::{Catalog, Category, Product, StoredMessage};

const CHARACTER_PROMPT: &str = "\
Eres el asistente virtual de un pequeño emprendimiento que vende por Instagram, WhatsApp y en su tienda local.

Para tomar un pedido necesitas:
1. El nombre del cliente
2. La dirección de entrega
3. El método de pago
4. La fecha de entrega deseada
5. Los productos y sus cantidades

Cuando tengas todos los datos, muestra un resumen del pedido y pregunta si desea confirmarlo.
Si el cliente confirma, el sistema registra el pedido y actualiza el inventario.
Si el cliente cancela, el sistema descarta el pedido y se empieza de nuevo.

Al final de cada respuesta agrega, en una línea aparte, el estado del pedido con este formato exacto:
<pedido>{\"customer_name\": \"\", \"delivery_address\": \"\", \"payment_method\": \"\", \"delivery_date\": \"\", \"products\": [{\"name\": \"\", \"quantity\": 1}]}</pedido>
Usa solo nombres de productos tal como aparecen en el catálogo y deja vacío lo que aún no sepas.";

const USER_LABEL: &str = "Usuario";
const ASSISTANT_LABEL: &str = "Asistente";

/// One catalog line per product
pub fn format_products(products: &[Product]) -> String {
    products
        .iter()
        .map(|p| format!("- {} ({}): {} - Stock: {}", p.name, p.category, p.price, p.stock))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_categories(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| format!("- {} ({} productos)", c.name, c.quantity))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Transcript lines, in the order given (callers pass oldest first)
pub fn format_history(history: &[StoredMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let speaker = if m.is_from_assistant {
                ASSISTANT_LABEL
            } else {
                USER_LABEL
            };
            format!("{speaker}: {}", m.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the single prompt sent to the oracle for one turn
pub fn compose_prompt(
    catalog: &Catalog,
    draft_summary: &str,
    history: &[StoredMessage],
    new_message: &str,
) -> String {
    format!(
        "{CHARACTER_PROMPT}

Productos disponibles:
{products}

Categorías disponibles:
{categories}

Estado actual del pedido:
{draft_summary}

Historial de la conversación:
{history}

Ahora, responde al siguiente mensaje del usuario como el asistente virtual descrito anteriormente, sin incluir ningún prefijo o etiqueta en tu respuesta:

{USER_LABEL}: {new_message}",
        products = format_products(&catalog.products),
        categories = format_categories(&catalog.categories),
        history = format_history(history),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogOrigin;
    use crate::seed::{default_categories, default_products};
    use chrono::Utc;

    fn message(text: &str, is_from_assistant: bool) -> StoredMessage {
        StoredMessage {
            chat_id: 1,
            text: text.to_string(),
            is_from_assistant,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_history_labels_speakers() {
        let history = vec![message("hola", false), message("¡Hola! ¿Qué deseas?", true)];
        assert_eq!(
            format_history(&history),
            "Usuario: hola\nAsistente: ¡Hola! ¿Qué deseas?"
        );
    }

    #[test]
    fn test_compose_prompt_sections_in_order() {
        let catalog = Catalog {
            origin: CatalogOrigin::Live,
            products: default_products(),
            categories: default_categories(),
        };
        let history = vec![message("hola", false), message("¡Hola!", true)];

        let prompt = compose_prompt(&catalog, "No hay pedido en proceso", &history, "quiero 2");

        let products_at = prompt
            .find("- AI Virtual Assistant (Assistants): €149.99 - Stock: 28")
            .unwrap();
        let categories_at = prompt.find("- Vision (1 productos)").unwrap();
        let draft_at = prompt.find("No hay pedido en proceso").unwrap();
        let history_at = prompt.find("Usuario: hola\nAsistente: ¡Hola!").unwrap();
        assert!(products_at < categories_at);
        assert!(categories_at < draft_at);
        assert!(draft_at < history_at);
        assert!(prompt.ends_with("Usuario: quiero 2"));
    }

    #[test]
    fn test_user_text_is_not_interpreted_as_placeholder() {
        let catalog = Catalog {
            origin: CatalogOrigin::Fallback,
            products: vec![],
            categories: vec![],
        };
        let prompt = compose_prompt(&catalog, "-", &[], "{history} {products}");
        assert!(prompt.ends_with("Usuario: {history} {products}"));
    }
}
