//! Per-token metadata synthesis.
//!
//! The document is pure string interpolation over the path segment. The image
//! index follows JavaScript `Number(id) - 1`, so a non-numeric id produces a
//! `NaN.svg` image instead of an error.

use serde::{Deserialize, Serialize};

const DEFAULT_NAME_PREFIX: &str = "Crypto Dev #";
const DEFAULT_DESCRIPTION: &str = "Cryptodevs is an NFT collection";
const DEFAULT_IMAGE_BASE: &str =
    "https://raw.githubusercontent.com/LearnWeb3DAO/NFT-Collection/main/my-app/public/cryptodevs";

/// JSON body served for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
}

/// Collection-wide strings interpolated into every token document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTemplate {
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_image_base")]
    pub image_base: String,
}

impl Default for MetadataTemplate {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            description: default_description(),
            image_base: default_image_base(),
        }
    }
}

fn default_name_prefix() -> String {
    DEFAULT_NAME_PREFIX.into()
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.into()
}

fn default_image_base() -> String {
    DEFAULT_IMAGE_BASE.into()
}

impl MetadataTemplate {
    /// Build the document for `token_id`. Never fails.
    pub fn render(&self, token_id: &str) -> TokenMetadata {
        let index = coerce_token_number(token_id) - 1.0;
        TokenMetadata {
            name: format!("{}{}", self.name_prefix, token_id),
            description: self.description.clone(),
            image: format!(
                "{}/{}.svg",
                self.image_base.trim_end_matches('/'),
                format_js_number(index)
            ),
        }
    }
}

/// Numeric coercion with JavaScript `Number(string)` semantics.
pub fn coerce_token_number(raw: &str) -> f64 {
    let s = raw.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => 16,
        Some("0o") | Some("0O") => 8,
        Some("0b") | Some("0B") => 2,
        _ => 10,
    };
    if radix != 10 {
        let digits = &s[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return f64::NAN;
        }
        return digits.chars().fold(0.0, |acc, c| {
            acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or_default())
        });
    }

    let unsigned = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    if unsigned == "Infinity" {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    if !is_decimal_literal(unsigned) {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

/// JavaScript `WhiteSpace` and `LineTerminator`. U+0085 is Unicode whitespace
/// but not JavaScript whitespace; U+FEFF is the reverse.
fn is_js_whitespace(c: char) -> bool {
    c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

/// `digits [. digits] [e [+-] digits]`, with at least one mantissa digit.
fn is_decimal_literal(s: &str) -> bool {
    let (mantissa, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
        Some(at) => (&s[..at], Some(&s[at + 1..])),
        None => (s, None),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(exp);
            !exp.is_empty() && all_digits(exp)
        }
    }
}

/// Print a number the way JavaScript `Number.prototype.toString` does:
/// shortest round-trip digits, positional for `1e-6 <= |x| < 1e21`,
/// exponent form (`1e+21`, `2.5e-7`) outside it.
pub fn format_js_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".into()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.into()
    } else if value == 0.0 {
        "0".into()
    } else if (1e-6..1e21).contains(&value.abs()) {
        format!("{value}")
    } else {
        let sci = format!("{value:e}");
        match sci.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => sci,
        }
    }
}
