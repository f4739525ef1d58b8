use serde::Deserialize;

/// One inbound chat message as delivered by the webhook.
///
/// Field names follow the Twilio form payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// TwiML reply carrying one message back to the sender.
pub fn message_reply(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(text)
    )
}

/// TwiML acknowledgement with no reply message. Returned when an approval
/// short code was consumed and the confirmations go out on the send API
/// instead of the webhook response.
pub fn empty_reply() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>".to_string()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{empty_reply, message_reply, InboundMessage};

    #[test]
    fn reply_wraps_text_in_message_element() {
        assert_eq!(
            message_reply("3 items in stock"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>3 items in stock</Message></Response>"
        );
    }

    #[test]
    fn reply_escapes_markup_characters() {
        let reply = message_reply("stock <= 10 & rising");
        assert!(reply.contains("stock &lt;= 10 &amp; rising"));
    }

    #[test]
    fn empty_reply_has_no_message_element() {
        assert!(!empty_reply().contains("<Message>"));
    }

    #[test]
    fn inbound_message_defaults_missing_fields() {
        let message: InboundMessage = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(message, InboundMessage { from: String::new(), body: String::new() });
    }
}
