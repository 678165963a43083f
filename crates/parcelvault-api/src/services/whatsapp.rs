//! WhatsApp "click to chat" links for document delivery.

use parcelvault_core::AppError;

const WA_ME: &str = "https://wa.me";

/// `https://wa.me/{digits}?text={message}`. Everything but digits is stripped from
/// the number; an empty result is rejected.
pub fn share_link(recipient: &str, message: &str) -> Result<String, AppError> {
    let digits: String = recipient.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Invalid WhatsApp number: {}",
            recipient
        )));
    }
    Ok(format!(
        "{}/{}?text={}",
        WA_ME,
        digits,
        urlencoding::encode(message)
    ))
}

pub fn share_message(client_name: &str, label: &str, parcel_name: &str, document_url: &str) -> String {
    format!(
        "Bonjour {}, voici votre document « {} » pour la parcelle {} : {}",
        client_name, label, parcel_name, document_url
    )
}
