//! Encoding diagram source as a hosted-rendering link.
//!
//! The diagram server expects the source compressed with raw DEFLATE and then
//! written in its own base64 alphabet (`0-9A-Za-z-_`, no padding).

use std::io::Write;

use base64::Engine as _;
use base64::alphabet::Alphabet;
use base64::engine::{GeneralPurpose, general_purpose};
use flate2::Compression;
use flate2::write::DeflateEncoder;

use modelpub_shared::{ModelPubError, Result};

const ALPHABET: Alphabet =
    match Alphabet::new("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_") {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("invalid diagram alphabet"),
    };

const ENGINE: GeneralPurpose = GeneralPurpose::new(&ALPHABET, general_purpose::NO_PAD);

/// Compress and encode diagram source text.
pub fn encode(source: &str) -> Result<String> {
    let compressed = deflate(source.as_bytes())
        .map_err(|e| ModelPubError::validation(format!("failed to compress diagram: {e}")))?;
    Ok(ENGINE.encode(compressed))
}

fn deflate(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Build the SVG rendering link for diagram source on `server`.
pub fn svg_url(server: &str, source: &str) -> Result<String> {
    Ok(format!(
        "{}/plantuml/svg/{}",
        server.trim_end_matches('/'),
        encode(source)?
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::DeflateDecoder;

    use super::*;

    #[test]
    fn encoded_text_uses_url_safe_alphabet() {
        let encoded = encode("@startuml\nclass Car\n@enduml\n").unwrap();
        assert!(!encoded.is_empty());
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn encoding_round_trips() {
        let source = "@startuml\nclass org.acme.Car {\n + String vin\n}\n@enduml\n";
        let encoded = encode(source).unwrap();

        let compressed = ENGINE.decode(encoded).unwrap();
        let mut text = String::new();
        DeflateDecoder::new(compressed.as_slice())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, source);
    }

    #[test]
    fn url_trims_trailing_slash() {
        let url = svg_url("https://diagrams.example.com/", "@startuml\n@enduml").unwrap();
        assert!(url.starts_with("https://diagrams.example.com/plantuml/svg/"));
    }
}
