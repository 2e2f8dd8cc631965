//! Draft validation. Pure and deterministic: every rule runs independently
//! and all violations are collected.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::draft::PartnershipDraft;
use crate::Currency;

/// Draft fields that carry validation rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Currency,
    PortalUrl,
    ItemFeePercent,
}

impl Field {
    /// Field name in the persisted (camelCase) shape.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Currency => "currency",
            Field::PortalUrl => "portalUrl",
            Field::ItemFeePercent => "itemFeePercent",
        }
    }
}

/// Which rule a field failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Required,
    TooShort,
    Invalid,
}

/// A single field-level failure with the message shown next to the field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub code: ErrorCode,
    pub message: &'static str,
}

/// Field-indexed validation failures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.0.iter().map(|(f, e)| (*f, e))
    }

    fn add(&mut self, field: Field, code: ErrorCode, message: &'static str) {
        self.0.insert(field, FieldError { code, message });
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, (field, err)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.as_str(), err.message)?;
        }
        Ok(())
    }
}

/// Outcome of validating a draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub errors: ValidationErrors,
}

impl Validation {
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.valid {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

const NAME_REQUIRED: &str = "Name is required";
const CURRENCY_REQUIRED: &str = "Currency is required";
const URL_REQUIRED: &str = "Valid URL is required";
const FEE_INVALID: &str = "Enter a percentage between 0 and 100";

/// Validate a draft. No side effects.
pub fn validate(draft: &PartnershipDraft) -> Validation {
    let mut errors = ValidationErrors::default();

    let name = draft.name.trim();
    if name.is_empty() {
        errors.add(Field::Name, ErrorCode::Required, NAME_REQUIRED);
    } else if name.encode_utf16().count() < 2 {
        errors.add(Field::Name, ErrorCode::TooShort, NAME_REQUIRED);
    }

    if Currency::parse(&draft.currency).is_none() {
        errors.add(Field::Currency, ErrorCode::Required, CURRENCY_REQUIRED);
    }

    if draft.portal_url.trim().is_empty() {
        errors.add(Field::PortalUrl, ErrorCode::Required, URL_REQUIRED);
    } else if !is_valid_portal_url(&draft.portal_url) {
        errors.add(Field::PortalUrl, ErrorCode::Invalid, URL_REQUIRED);
    }

    match coerce_fee(&draft.item_fee_percent) {
        Some(fee) if (0.0..=100.0).contains(&fee) => {}
        _ => errors.add(Field::ItemFeePercent, ErrorCode::Invalid, FEE_INVALID),
    }

    Validation {
        valid: errors.is_empty(),
        errors,
    }
}

/// Numeric coercion of a fee input. Blank text coerces to 0; NaN is rejected.
pub fn coerce_fee(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Absolute URL with scheme exactly `http` or `https` (scheme is matched
/// case-insensitively) and a non-empty host. Any run of slashes after the
/// scheme is accepted, as browsers do for these schemes. Port, if present,
/// must be a valid u16.
pub fn is_valid_portal_url(s: &str) -> bool {
    let trimmed = s.trim();
    let Some((scheme, rest)) = trimmed.split_once(':') else {
        return false;
    };
    if !(scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")) {
        return false;
    }
    let rest = rest.trim_start_matches(['/', '\\']);

    let authority_end = rest.find(['/', '\\', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    // Credentials are allowed and ignored.
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    let (host, port) = if let Some(v6) = host_port.strip_prefix('[') {
        let Some((addr, after)) = v6.split_once(']') else {
            return false;
        };
        if addr.is_empty() || !addr.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.') {
            return false;
        }
        match after.strip_prefix(':') {
            Some(p) => (addr, Some(p)),
            None if after.is_empty() => (addr, None),
            None => return false,
        }
    } else {
        match host_port.rsplit_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (host_port, None),
        }
    };

    if host.is_empty() || host.chars().any(is_forbidden_host_char) {
        return false;
    }
    match port {
        None | Some("") => true,
        Some(p) => p.chars().all(|c| c.is_ascii_digit()) && p.parse::<u16>().is_ok(),
    }
}

fn is_forbidden_host_char(c: char) -> bool {
    c.is_whitespace()
        || c.is_control()
        || matches!(
            c,
            '#' | '%' | '/' | ':' | '<' | '>' | '?' | '@' | '[' | '\\' | ']' | '^' | '|'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_draft() -> PartnershipDraft {
        PartnershipDraft {
            name: "Acme".into(),
            currency: "USD".into(),
            portal_url: "https://acme.portal.example".into(),
            item_fee_percent: "15".into(),
            ..PartnershipDraft::default()
        }
    }

    fn v_code(d: &PartnershipDraft, field: Field) -> Option<ErrorCode> {
        validate(d).errors.get(field).map(|e| e.code)
    }

    #[test]
    fn accepts_complete_draft() {
        let v = validate(&good_draft());
        assert!(v.valid);
        assert!(v.errors.is_empty());
    }

    #[test]
    fn name_rules() {
        let mut d = good_draft();
        d.name = "   ".into();
        let v = validate(&d);
        assert!(!v.valid);
        assert_eq!(v.errors.get(Field::Name).unwrap().code, ErrorCode::Required);

        d.name = " A ".into();
        let v = validate(&d);
        assert_eq!(v.errors.get(Field::Name).unwrap().code, ErrorCode::TooShort);

        d.name = " Ab ".into();
        assert!(validate(&d).valid);

        // Length counts UTF-16 units, so one astral character is long enough.
        d.name = "\u{1F30D}".into();
        assert!(validate(&d).valid);
        d.name = "é".into();
        assert_eq!(v_code(&d, Field::Name), Some(ErrorCode::TooShort));
    }

    #[test]
    fn currency_must_be_known_code() {
        let mut d = good_draft();
        for bad in ["", "JPY", "usd"] {
            d.currency = bad.into();
            let v = validate(&d);
            assert_eq!(v.errors.get(Field::Currency).unwrap().code, ErrorCode::Required);
        }
        for ok in ["USD", "EUR", "GBP"] {
            d.currency = ok.into();
            assert!(validate(&d).valid);
        }
    }

    #[test]
    fn portal_url_requires_http_scheme() {
        let mut d = good_draft();
        d.portal_url = "https://x.io".into();
        assert!(validate(&d).valid);

        d.portal_url = "ftp://x.io".into();
        let v = validate(&d);
        assert_eq!(v.errors.get(Field::PortalUrl).unwrap().code, ErrorCode::Invalid);

        d.portal_url = "".into();
        let v = validate(&d);
        assert_eq!(v.errors.get(Field::PortalUrl).unwrap().code, ErrorCode::Required);
    }

    #[test]
    fn url_shapes() {
        assert!(is_valid_portal_url("http://x.io"));
        assert!(is_valid_portal_url("HTTPS://X.io/path?q=1#frag"));
        assert!(is_valid_portal_url("https://localhost:8080"));
        assert!(is_valid_portal_url("https://user:pw@host.example/"));
        assert!(is_valid_portal_url("http://[::1]:3000/"));
        assert!(!is_valid_portal_url("x.io"));
        assert!(!is_valid_portal_url("https://"));
        assert!(is_valid_portal_url("http:host.example"));
        assert!(is_valid_portal_url("http:/host.example"));
        assert!(is_valid_portal_url("https:///host.example/path"));
        assert!(!is_valid_portal_url("https:///"));
        assert!(!is_valid_portal_url("https:?q=1"));
        assert!(!is_valid_portal_url("https://bad host"));
        assert!(!is_valid_portal_url("https://x.io:99999"));
        assert!(!is_valid_portal_url("https://x.io:80a"));
        assert!(!is_valid_portal_url("mailto://x.io"));
        assert!(!is_valid_portal_url("javascript:alert(1)"));
    }

    #[test]
    fn fee_boundaries() {
        let mut d = good_draft();
        for ok in ["0", "100", "0.0", "99.9", " 42 ", "", "1e1"] {
            d.item_fee_percent = ok.into();
            assert!(validate(&d).valid, "expected {ok:?} to pass");
        }
        for bad in ["-0.1", "100.01", "abc", "NaN", "inf", "1,5"] {
            d.item_fee_percent = bad.into();
            let v = validate(&d);
            assert!(v.errors.contains(Field::ItemFeePercent), "expected {bad:?} to fail");
        }
    }

    #[test]
    fn collects_all_violations() {
        let d = PartnershipDraft {
            name: "x".into(),
            currency: "".into(),
            portal_url: "nope".into(),
            item_fee_percent: "200".into(),
            ..PartnershipDraft::default()
        };
        let v = validate(&d);
        assert!(!v.valid);
        assert_eq!(v.errors.len(), 4);
        assert_eq!(
            v.errors.to_string(),
            "name: Name is required; currency: Currency is required; \
             portalUrl: Valid URL is required; itemFeePercent: Enter a percentage between 0 and 100"
        );
    }

    #[test]
    fn coerce_fee_semantics() {
        assert_eq!(coerce_fee(""), Some(0.0));
        assert_eq!(coerce_fee(" 12.5 "), Some(12.5));
        assert_eq!(coerce_fee("nan"), None);
        assert_eq!(coerce_fee("twelve"), None);
    }
}
