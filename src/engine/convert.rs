//! Fixed-point rate conversion.
//!
//! The rate is tokens-per-unit-of-currency at `UNIT` (10^18) scale, so
//! converting between tokens and currency is a scaled division or
//! multiplication. Division truncates toward zero: the residual of a
//! buy-then-sell round trip is kept by whichever side the truncation
//! favors, and tests below document it exactly.

use crate::types::{Amount, ExchangeError, UNIT};

/// Currency needed to buy — or owed when selling — `tokens` at `rate`:
/// `tokens * UNIT / rate`, truncating.
pub fn currency_for_tokens(tokens: Amount, rate: Amount) -> Result<Amount, ExchangeError> {
    debug_assert!(rate > 0, "rate is validated at construction and on set_rate");
    tokens
        .checked_mul(UNIT)
        .map(|scaled| scaled / rate)
        .ok_or(ExchangeError::Overflow)
}

/// Tokens issued for `currency` at `rate`: `currency * rate / UNIT`,
/// truncating. Quoting helper; `buy` takes a token amount, not a
/// currency amount.
pub fn tokens_for_currency(currency: Amount, rate: Amount) -> Result<Amount, ExchangeError> {
    currency
        .checked_mul(rate)
        .map(|scaled| scaled / UNIT)
        .ok_or(ExchangeError::Overflow)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
