//! Field syntax validators. Pure predicates: invalid input yields `false`,
//! never an error.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // First char is a word char, then 3-32 of word chars or dots. The
    // no-double-dot and no-trailing-dot rules are checked separately since
    // the regex crate has no lookaround.
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.]{3,32}$").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"^[a-zA-Z ]{2,35}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#
    )
    .unwrap();
    static ref PASSWORD_RE: Regex = Regex::new(r"^[A-Za-z0-9@$!%*?&]{8,}$").unwrap();
    // Multiline: a valid phone on any line of the input passes.
    static ref PHONE_RE: Regex = Regex::new(
        r"(?m)^\s*(?:\+?(\d{1,3}))?([-. (]*(\d{3})[-. )]*)?((\d{3})[-. ]*(\d{2,4})(?:[-.x ]*(\d+))?)\s*$"
    )
    .unwrap();
    static ref ADDRESS_RE: Regex = Regex::new(r"^[a-zA-Z0-9\s,'-]{10,200}$").unwrap();
}

pub fn validate_username(username: &str) -> bool {
    USERNAME_RE.is_match(username) && !username.contains("..") && !username.ends_with('.')
}

pub fn validate_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// At least 8 chars, one lowercase, one uppercase, one digit, one of
/// `@$!%*?&`, and nothing outside those classes.
pub fn validate_password(password: &str) -> bool {
    PASSWORD_RE.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| "@$!%*?&".contains(c))
}

pub fn validate_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn validate_address(address: &str) -> bool {
    ADDRESS_RE.is_match(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(f: fn(&str) -> bool, cases: &[(&str, bool)]) {
        for (input, expected) in cases {
            assert_eq!(f(input), *expected, "input: {input:?}");
        }
    }

    #[test]
    fn username_cases() {
        check(
            validate_username,
            &[
                ("ab_cd", true),
                ("john.doe", true),
                ("user_1234", true),
                ("a_b1", true),
                ("a..", false),
                ("ab..cd", false),
                ("abcd.", false),
                (".abcd", false),
                ("abc", false),
                ("ab cd", false),
                ("ab-cd", false),
                ("x".repeat(34).as_str(), false),
                ("", false),
            ],
        );
    }

    #[test]
    fn name_cases() {
        check(
            validate_name,
            &[
                ("John Doe", true),
                ("Jo", true),
                ("J", false),
                ("John1", false),
                ("John-Doe", false),
                ("a".repeat(36).as_str(), false),
                ("", false),
            ],
        );
    }

    #[test]
    fn email_cases() {
        check(
            validate_email,
            &[
                ("john@example.com", true),
                ("john.doe@mail.example.co", true),
                ("user@[192.168.1.1]", true),
                ("\"quoted local\"@example.com", true),
                ("john", false),
                ("john@", false),
                ("@example.com", false),
                ("john@example", false),
                ("john doe@example.com", false),
            ],
        );
    }

    #[test]
    fn password_cases() {
        check(
            validate_password,
            &[
                ("Abcdef1!", true),
                ("Str0ng&Pass", true),
                ("abcdefgh", false),
                ("ABCDEFG1!", false),
                ("Abcdefgh!", false),
                ("Abcdefg1", false),
                ("Abc1!", false),
                ("Abcdef1#", false),
                ("Abcdef1! with space", false),
            ],
        );
    }

    #[test]
    fn phone_cases() {
        check(
            validate_phone,
            &[
                ("555-123-4567", true),
                ("(555) 123-4567", true),
                ("+1 555 123 4567", true),
                ("5551234567", true),
                ("555.123.4567 x89", true),
                ("not a phone", false),
                ("12", false),
            ],
        );
    }

    #[test]
    fn phone_multiline_matches_any_line() {
        // Matching is line based, so a valid phone on one line passes even
        // with junk on another.
        assert!(validate_phone("garbage\n555-123-4567"));
    }

    #[test]
    fn address_cases() {
        check(
            validate_address,
            &[
                ("221b Baker Street, London", true),
                ("10 Downing St", true),
                ("short st", false),
                ("221b Baker Street #5", false),
                ("a".repeat(201).as_str(), false),
            ],
        );
    }
}
