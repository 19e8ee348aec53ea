//! Amounts in words, Indian numbering (thousand, lakh, crore).

use crate::{Error, Result};

const ONES: [&str; 20] = [
  "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
  "Ten", "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen",
  "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
  "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty",
  "Ninety",
];

const CRORE: u64 = 10_000_000;
const LAKH: u64 = 100_000;

/// Largest rupee amount we spell out; beyond this `f64` loses paise.
const MAX_AMOUNT: f64 = 1e13;

fn below_hundred(n: u64) -> String {
  let n = n as usize;
  match (n / 10, n % 10) {
    _ if n < 20 => ONES[n].to_owned(),
    (tens, 0) => TENS[tens].to_owned(),
    (tens, ones) => format!("{} {}", TENS[tens], ONES[ones]),
  }
}

fn below_thousand(n: u64) -> String {
  match (n / 100, n % 100) {
    (0, rest) => below_hundred(rest),
    (hundreds, 0) => format!("{} Hundred", ONES[hundreds as usize]),
    (hundreds, rest) => {
      format!("{} Hundred {}", ONES[hundreds as usize], below_hundred(rest))
    }
  }
}

fn integer_words(n: u64) -> String {
  if n == 0 {
    return ONES[0].to_owned();
  }
  let mut parts = Vec::new();
  let (crore, rest) = (n / CRORE, n % CRORE);
  if crore > 0 {
    parts.push(format!("{} Crore", integer_words(crore)));
  }
  let (lakh, rest) = (rest / LAKH, rest % LAKH);
  if lakh > 0 {
    parts.push(format!("{} Lakh", below_hundred(lakh)));
  }
  let (thousand, rest) = (rest / 1000, rest % 1000);
  if thousand > 0 {
    parts.push(format!("{} Thousand", below_hundred(thousand)));
  }
  if rest > 0 {
    parts.push(below_thousand(rest));
  }
  parts.join(" ")
}

/// Spell out a rupee amount, e.g. `48500.5` →
/// `"Rupees Forty Eight Thousand Five Hundred and Fifty Paise Only"`.
pub fn amount_in_words(amount: f64) -> Result<String> {
  if !amount.is_finite() {
    return Err(Error::NonFiniteAmount(amount));
  }
  if amount.abs() >= MAX_AMOUNT {
    return Err(Error::AmountTooLarge(amount));
  }

  let total_paise = (amount.abs() * 100.0).round() as u64;
  let (rupees, paise) = (total_paise / 100, total_paise % 100);

  let mut words = String::new();
  if amount < 0.0 && total_paise > 0 {
    words.push_str("Minus ");
  }
  words.push_str("Rupees ");
  words.push_str(&integer_words(rupees));
  if paise > 0 {
    words.push_str(" and ");
    words.push_str(&below_hundred(paise));
    words.push_str(" Paise");
  }
  words.push_str(" Only");
  Ok(words)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn small_numbers() {
    assert_eq!(amount_in_words(0.0).unwrap(), "Rupees Zero Only");
    assert_eq!(amount_in_words(15.0).unwrap(), "Rupees Fifteen Only");
    assert_eq!(amount_in_words(90.0).unwrap(), "Rupees Ninety Only");
    assert_eq!(amount_in_words(305.0).unwrap(), "Rupees Three Hundred Five Only");
  }

  #[test]
  fn indian_grouping() {
    assert_eq!(
      amount_in_words(48_500.0).unwrap(),
      "Rupees Forty Eight Thousand Five Hundred Only"
    );
    assert_eq!(amount_in_words(100_000.0).unwrap(), "Rupees One Lakh Only");
    assert_eq!(
      amount_in_words(12_345_678.0).unwrap(),
      "Rupees One Crore Twenty Three Lakh Forty Five Thousand Six Hundred Seventy \
       Eight Only"
    );
    assert_eq!(
      amount_in_words(1_500_000_000.0).unwrap(),
      "Rupees One Hundred Fifty Crore Only"
    );
  }

  #[test]
  fn paise_and_sign() {
    assert_eq!(
      amount_in_words(10.5).unwrap(),
      "Rupees Ten and Fifty Paise Only"
    );
    assert_eq!(amount_in_words(-1_200.0).unwrap(), "Minus Rupees One Thousand Two Hundred Only");
    assert_eq!(amount_in_words(-0.001).unwrap(), "Rupees Zero Only");
  }

  #[test]
  fn rejects_unprintable_amounts() {
    assert!(matches!(amount_in_words(f64::NAN), Err(Error::NonFiniteAmount(_))));
    assert!(matches!(amount_in_words(1e14), Err(Error::AmountTooLarge(_))));
  }
}
