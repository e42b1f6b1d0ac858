//! Column Labels
//!
//! Spreadsheet columns are numbered from 1 and labelled with a bijective
//! base-26 alphabet: `A`..`Z`, then `AA`, `AB`, .. There is no zero digit,
//! so the letter after `Z` is `AA`, not `A0`.

use super::AddressError;

/// Number of letters in the column alphabet.
const RADIX: u32 = 26;

/// Columns in a worksheet; the last one is `XFD`.
pub const MAX_COLUMNS: u32 = 16_384;

/// Converts a 1-based column number into its column label.
///
/// # Example
///
/// ```
/// use sheetflow::address::column_letter;
///
/// assert_eq!(column_letter(1).unwrap(), "A");
/// assert_eq!(column_letter(27).unwrap(), "AA");
/// assert!(column_letter(0).is_err());
/// ```
pub fn column_letter(column: u32) -> Result<String, AddressError> {
    if column == 0 {
        return Err(AddressError::ZeroColumn);
    }

    let mut letters = Vec::new();
    let mut n = column;

    while n > 0 {
        let digit = (n - 1) % RADIX;
        letters.push(char::from(b'A' + digit as u8));
        n = (n - 1 - digit) / RADIX;
    }

    Ok(letters.into_iter().rev().collect())
}

/// Converts a column label back into its 1-based column number.
///
/// Lower-case letters are accepted.
pub fn column_index(label: &str) -> Result<u32, AddressError> {
    if label.is_empty() {
        return Err(AddressError::InvalidColumn(label.to_string()));
    }

    label.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return Err(AddressError::InvalidColumn(label.to_string()));
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        acc.checked_mul(RADIX)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| AddressError::InvalidColumn(label.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_letters() {
        assert_eq!(column_letter(1).unwrap(), "A");
        assert_eq!(column_letter(2).unwrap(), "B");
        assert_eq!(column_letter(26).unwrap(), "Z");
    }

    #[test]
    fn test_no_zero_digit() {
        assert_eq!(column_letter(27).unwrap(), "AA");
        assert_eq!(column_letter(52).unwrap(), "AZ");
        assert_eq!(column_letter(53).unwrap(), "BA");
        assert_eq!(column_letter(702).unwrap(), "ZZ");
        assert_eq!(column_letter(703).unwrap(), "AAA");
    }

    #[test]
    fn test_zero_column_rejected() {
        assert_eq!(column_letter(0), Err(AddressError::ZeroColumn));
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A").unwrap(), 1);
        assert_eq!(column_index("Z").unwrap(), 26);
        assert_eq!(column_index("aa").unwrap(), 27);
        assert_eq!(column_index("XFD").unwrap(), 16384);
        assert_eq!(column_letter(MAX_COLUMNS).unwrap(), "XFD");
    }

    #[test]
    fn test_column_index_invalid() {
        assert!(column_index("").is_err());
        assert!(column_index("A1").is_err());
        assert!(column_index("ZZZZZZZZZZ").is_err());
    }

    #[test]
    fn test_letters_map_back_to_numbers() {
        for n in 1..=20_000 {
            let label = column_letter(n).unwrap();
            assert_eq!(column_index(&label).unwrap(), n, "label {}", label);
        }
    }
}
