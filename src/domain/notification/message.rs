//! Alert rendering

use rust_decimal::Decimal;

use crate::domain::price::ChangeDetector;
use crate::shared::types::PriceReading;
use crate::shared::utils::{format_amount, format_local_time};

use super::{AlertMessage, NotificationEvent};

const SUBJECT: &str = "Gold Price Alert";

/// Formats a [`NotificationEvent`] into mail-ready content
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    city: Option<String>,
    currency_symbol: String,
    detector: ChangeDetector,
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self::new(None, "₹")
    }
}

impl MessageTemplate {
    pub fn new(city: Option<String>, currency_symbol: impl Into<String>) -> Self {
        Self {
            city: city.filter(|c| !c.trim().is_empty()),
            currency_symbol: currency_symbol.into(),
            detector: ChangeDetector::new(),
        }
    }

    pub fn render(&self, event: &NotificationEvent) -> AlertMessage {
        let generated_at = format_local_time(&event.occurred_at);
        let headline = match &self.city {
            Some(city) => format!("The gold price has changed in {}.", city),
            None => "The gold price has changed.".to_string(),
        };

        AlertMessage {
            subject: SUBJECT.to_string(),
            html: self.render_html(&headline, &event.previous, &event.current, &generated_at),
            text: self.render_text(&headline, &event.previous, &event.current, &generated_at),
            previous: event.previous.clone(),
            current: event.current.clone(),
        }
    }

    fn render_html(
        &self,
        headline: &str,
        previous: &PriceReading,
        current: &PriceReading,
        generated_at: &str,
    ) -> String {
        let multi = current.len() > 1;
        let label_header = if multi {
            r#"<th style="padding: 10px; background: #f4f4f4; border: 1px solid #ddd; text-align: left;">Field</th>"#
        } else {
            ""
        };

        let mut rows = String::new();
        for (name, value) in current.fields() {
            let old = previous
                .get(name)
                .map(|v| format_amount(v, &self.currency_symbol))
                .unwrap_or_else(|| "-".to_string());
            let label = if multi {
                format!(
                    r#"<td style="padding: 10px; border: 1px solid #ddd;">{}</td>"#,
                    escape_html(name)
                )
            } else {
                String::new()
            };
            rows.push_str(&format!(
                r#"<tr>{}<td style="padding: 10px; border: 1px solid #ddd;">{}</td><td style="padding: 10px; border: 1px solid #ddd;">{}</td><td style="padding: 10px; border: 1px solid #ddd;">{}</td></tr>"#,
                label,
                escape_html(&old),
                escape_html(&format_amount(value, &self.currency_symbol)),
                self.change_label(previous, current, name),
            ));
        }

        format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 20px auto; padding: 20px; border: 1px solid #ddd; border-radius: 10px;">
    <h2 style="text-align: center; color: #333;">{subject}</h2>
    <p style="font-size: 16px; color: #555;">{headline}</p>
    <table style="width: 100%; border-collapse: collapse; margin-top: 20px;">
        <thead>
            <tr>{label_header}<th style="padding: 10px; background: #f4f4f4; border: 1px solid #ddd; text-align: left;">Previous Price</th><th style="padding: 10px; background: #f4f4f4; border: 1px solid #ddd; text-align: left;">Current Price</th><th style="padding: 10px; background: #f4f4f4; border: 1px solid #ddd; text-align: left;">Change</th></tr>
        </thead>
        <tbody>
            {rows}
        </tbody>
    </table>
    <p style="font-size: 14px; color: #999; text-align: center; margin-top: 20px;">Notification generated at {generated_at}</p>
</div>"#,
            subject = SUBJECT,
            headline = escape_html(headline),
        )
    }

    fn render_text(
        &self,
        headline: &str,
        previous: &PriceReading,
        current: &PriceReading,
        generated_at: &str,
    ) -> String {
        let mut text = format!("{}\n\n", headline);
        for (name, value) in current.fields() {
            let old = previous
                .get(name)
                .map(|v| format_amount(v, &self.currency_symbol))
                .unwrap_or_else(|| "-".to_string());
            text.push_str(&format!(
                "{}: {} -> {} ({})\n",
                name,
                old,
                format_amount(value, &self.currency_symbol),
                self.change_label(previous, current, name)
            ));
        }
        text.push_str(&format!("\nNotification generated at {}\n", generated_at));
        text
    }

    // "+0.45%", "-6.67%", or "-" when the previous value was zero
    fn change_label(&self, previous: &PriceReading, current: &PriceReading, field: &str) -> String {
        match self.detector.percentage_change(previous, current, field) {
            Some(pct) if pct > Decimal::ZERO => format!("+{:.2}%", pct),
            Some(pct) => format!("{:.2}%", pct),
            None => "-".to_string(),
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
