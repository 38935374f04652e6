use crate::message::Message;
use crate::phone;
use serde::{Deserialize, Serialize};

/// Senders the user has whitelisted, by phone number or saved contact name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedSenders {
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

impl ApprovedSenders {
    pub fn new(phones: Vec<String>, names: Vec<String>) -> Self {
        Self { phones, names }
    }

    pub fn add_phone(&mut self, phone: impl Into<String>) {
        self.phones.push(phone.into());
    }

    pub fn add_name(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    pub fn len(&self) -> usize {
        self.phones.len() + self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phones.is_empty() && self.names.is_empty()
    }

    /// The phone number is authoritative. A display name only counts when it
    /// matches a name the user stored explicitly.
    pub fn is_approved(&self, message: &Message) -> bool {
        if self
            .phones
            .iter()
            .any(|approved| phone::are_equal(approved, &message.sender_phone))
        {
            return true;
        }

        match message.sender_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                let name_lower = name.to_lowercase();
                self.names
                    .iter()
                    .any(|approved| approved.trim().to_lowercase() == name_lower)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn senders() -> ApprovedSenders {
        ApprovedSenders::new(
            vec!["+972-54-219-9006".to_string()],
            vec!["Cibus".to_string()],
        )
    }

    #[test]
    fn test_phone_match_across_formats() {
        let approved = senders();
        assert!(approved.is_approved(&Message::new("0542199006", "hi")));
        assert!(approved.is_approved(&Message::new("972542199006", "hi")));
        assert!(!approved.is_approved(&Message::new("0542199007", "hi")));
    }

    #[test]
    fn test_display_name_match() {
        let approved = senders();
        let message = Message::new("0500000000", "hi").with_sender_name(" cibus ");
        assert!(approved.is_approved(&message));

        let message = Message::new("0500000000", "hi").with_sender_name("Cibus Fake");
        assert!(!approved.is_approved(&message));
    }

    #[test]
    fn test_blank_name_never_matches() {
        let mut approved = ApprovedSenders::default();
        approved.add_name("");
        let message = Message::new("0500000000", "hi").with_sender_name("  ");
        assert!(!approved.is_approved(&message));
    }

    #[test]
    fn test_empty_list() {
        let approved = ApprovedSenders::default();
        assert!(approved.is_empty());
        assert!(!approved.is_approved(&Message::new("0542199006", "hi")));
    }

    #[test]
    fn test_add_entries() {
        let mut approved = ApprovedSenders::default();
        approved.add_phone("0541112222");
        approved.add_name("BuyMe");
        assert_eq!(approved.len(), 2);
        assert!(approved.is_approved(&Message::new("+972 54 111 2222", "hi")));
    }
}
