//! Plain-text rendering of the conversation timeline.

use contoso_chat::{Message, MessageId, QuickReply, Sender};
use contoso_core::types::{Field, Product};

pub const TYPING_INDICATOR: &str = "Assistant is typing...";

const COLUMNS: [&str; 6] = ["Product", "Price", "Rating", "Reviews", "Stock", "Category"];
const MISSING: &str = "-";

/// Prints each message once, in timeline order.
#[derive(Debug, Default)]
pub struct Renderer {
    last_shown: MessageId,
}

impl Renderer {
    /// Render messages not yet shown. A re-initialized timeline (ids
    /// restarting at 1) is rendered from the top.
    pub fn render_new(&mut self, messages: &[Message]) -> String {
        if messages.first().is_some_and(|m| m.id <= self.last_shown)
            && messages.last().is_some_and(|m| m.id < self.last_shown)
        {
            self.last_shown = 0;
        }
        let shown = self.last_shown;
        let mut out = String::new();
        for message in messages.iter().filter(|m| m.id > shown) {
            out.push_str(&render_message(message));
            self.last_shown = message.id;
        }
        out
    }
}

pub fn render_message(message: &Message) -> String {
    let time = message.timestamp.display_time();
    if let Some(products) = message.products.as_deref().filter(|p| !p.is_empty()) {
        return if message.is_comparison == Some(true) {
            comparison_table(products)
        } else {
            products.iter().map(product_card).collect()
        };
    }

    let mut out = match message.sender {
        Sender::User => format!("[{}] you: {}\n", time, message.text),
        Sender::Bot => format!("[{}] assistant: {}\n", time, message.text),
    };
    if message.is_pending_confirmation() {
        out.push_str("          (/confirm if this is you, /reject to change it)\n");
    }
    out
}

pub fn render_quick_replies(replies: &[QuickReply]) -> String {
    if replies.is_empty() {
        return String::new();
    }
    let chips: Vec<String> = replies
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] {}", i + 1, r.label))
        .collect();
    format!("Try: {}   (/quick <n>)\n", chips.join("  "))
}

/// Side-by-side table, one row per product.
pub fn comparison_table(products: &[Product]) -> String {
    let rows: Vec<[String; 6]> = products
        .iter()
        .map(|p| {
            [
                field_cell(&p.name, Clone::clone),
                price_cell(p),
                rating_cell(&p.rating),
                reviews_cell(p),
                stock_cell(&p.in_stock),
                field_cell(&p.category, Clone::clone),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&table_line(&COLUMNS.map(String::from), &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("-+-")));
    for row in &rows {
        out.push_str(&table_line(row, &widths));
    }
    out
}

fn table_line(cells: &[String; 6], widths: &[usize; 6]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    format!("{}\n", padded.join(" | ").trim_end())
}

/// A standalone card for one product.
pub fn product_card(product: &Product) -> String {
    let mut out = format!("+ {}\n", field_cell(&product.name, Clone::clone));
    if product.price.is_present() {
        out.push_str(&format!("  Price:    {}\n", price_cell(product)));
    }
    if product.rating.is_present() || product.has_reviews() {
        out.push_str(&format!(
            "  Rating:   {} ({} reviews)\n",
            rating_cell(&product.rating),
            reviews_cell(product)
        ));
    }
    if product.in_stock.is_present() {
        out.push_str(&format!("  Stock:    {}\n", stock_cell(&product.in_stock)));
    }
    if let Some(category) = product.category.value() {
        out.push_str(&format!("  Category: {}\n", category));
    }
    if let Some(description) = product.description.value() {
        out.push_str(&format!("  {}\n", description));
    }
    if let Some(link) = product.link.value() {
        out.push_str(&format!("  {}\n", link));
    }
    out
}

fn price_cell(product: &Product) -> String {
    let Some(price) = product.price.value() else {
        return MISSING.to_string();
    };
    match product.original_price.value() {
        Some(original) if original > price => {
            format!("{} (was {})", format_amount(*price), format_amount(*original))
        }
        _ => format_amount(*price),
    }
}

fn reviews_cell(product: &Product) -> String {
    product
        .review_total()
        .map(|n| n.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn rating_cell(rating: &Field<f64>) -> String {
    field_cell(rating, |r| format!("{:.1}/5", r))
}

fn stock_cell(in_stock: &Field<bool>) -> String {
    field_cell(in_stock, |s| {
        let label = if *s { "In stock" } else { "Out of stock" };
        label.to_string()
    })
}

fn field_cell<T>(field: &Field<T>, show: impl Fn(&T) -> String) -> String {
    field.value().map(show).unwrap_or_else(|| MISSING.to_string())
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("₹{:.0}", amount)
    } else {
        format!("₹{:.2}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contoso_chat::QuickReplyCatalog;

    fn phones() -> Vec<Product> {
        let mut nova = Product::named("Nova 5").with_price(14999.0).with_rating(4.3);
        nova.original_price = Field::Value(17999.0);
        nova.reviews = Field::Value(812);
        nova.in_stock = Field::Value(true);
        let lite = Product::named("Pixel Lite").with_price(21999.0).with_rating(4.6);
        vec![nova, lite]
    }

    #[test]
    fn test_comparison_table_layout() {
        let table = comparison_table(&phones());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Product"));
        assert!(lines[0].contains("Category"));
        assert!(lines[2].contains("₹14999 (was ₹17999)"));
        assert!(lines[2].contains("4.3/5"));
        assert!(lines[2].contains("In stock"));
        assert!(lines[3].starts_with("Pixel Lite"));
        // Absent cells are dashed.
        assert!(lines[3].contains("| -"));
    }

    #[test]
    fn test_table_columns_align() {
        let table = comparison_table(&phones());
        let positions: Vec<Option<usize>> = table
            .lines()
            .filter(|l| !l.starts_with('-'))
            .map(|l| l.char_indices().find(|(_, c)| *c == '|').map(|(i, _)| l[..i].chars().count()))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_product_card_skips_absent_fields() {
        let card = product_card(&Product::named("Cable").with_price(299.0));
        assert!(card.contains("+ Cable"));
        assert!(card.contains("₹299"));
        assert!(!card.contains("Rating"));
        assert!(!card.contains("Stock"));
    }

    #[test]
    fn test_nameless_product_shows_dash() {
        let mut unnamed = Product::named("x").with_price(10.0).with_rating(4.0);
        unnamed.name = Field::Absent;
        assert!(product_card(&unnamed).starts_with("+ -\n"));

        let table = comparison_table(&[Product::named("P1").with_price(5.0), unnamed]);
        assert!(table.lines().nth(3).is_some_and(|l| l.starts_with("- ")));
    }

    #[test]
    fn test_review_count_key_is_shown() {
        let mut product = Product::named("Cable").with_rating(4.0);
        product.review_count = Field::Value(42);
        assert!(product_card(&product).contains("(42 reviews)"));
    }

    #[test]
    fn test_renderer_tracks_last_shown_across_calls() {
        let mut renderer = Renderer::default();
        let timeline = vec![
            Message::bot(1, "Hi!"),
            Message::user(2, "phones"),
            Message::bot(3, "Here"),
        ];
        let out = renderer.render_new(&timeline);
        assert_eq!(out.lines().count(), 3);
        assert_eq!(renderer.last_shown, 3);
        assert!(renderer.render_new(&timeline).is_empty());
    }

    #[test]
    fn test_null_price_shows_dash_in_card() {
        let mut product = Product::named("Mystery");
        product.price = Field::Null;
        assert!(product_card(&product).contains("Price:    -"));
    }

    #[test]
    fn test_products_message_uses_classification() {
        let table = render_message(&Message::products(3, phones(), true));
        assert!(table.starts_with("Product"));

        let cards = render_message(&Message::products(3, phones(), false));
        assert!(cards.starts_with("+ Nova 5"));
        assert!(cards.contains("+ Pixel Lite"));
    }

    #[test]
    fn test_prompt_has_hint() {
        let out = render_message(&Message::email_prompt(1, "Is a@x.com you?"));
        assert!(out.contains("assistant: Is a@x.com you?"));
        assert!(out.contains("/confirm"));
    }

    #[test]
    fn test_renderer_shows_each_message_once() {
        let mut renderer = Renderer::default();
        let mut timeline = vec![Message::bot(1, "Hi!")];
        assert!(renderer.render_new(&timeline).contains("Hi!"));
        assert!(renderer.render_new(&timeline).is_empty());

        timeline.push(Message::user(2, "phones"));
        let out = renderer.render_new(&timeline);
        assert!(out.contains("you: phones"));
        assert!(!out.contains("Hi!"));
    }

    #[test]
    fn test_renderer_restarts_on_new_session() {
        let mut renderer = Renderer::default();
        renderer.render_new(&[Message::bot(1, "Hi!"), Message::user(2, "x")]);
        let out = renderer.render_new(&[Message::bot(1, "Welcome back")]);
        assert!(out.contains("Welcome back"));
    }

    #[test]
    fn test_quick_replies_numbered_from_one() {
        let out = render_quick_replies(QuickReplyCatalog::all());
        assert!(out.contains("[1] Show phones"));
        assert!(out.contains("[5] Shipping info"));
        assert!(render_quick_replies(&[]).is_empty());
    }
}
