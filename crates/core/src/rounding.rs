use crate::money::Cents;

/// Applies the debit-order last-digit rule to an amount in cents.
///
/// A trailing 4 becomes 5 and a trailing 9 rolls up to the next multiple of
/// ten; every other amount is left alone. The rule only looks at the final
/// digit, so applying it twice changes nothing.
pub fn round_debit_amount(amount: Cents) -> Cents {
    let n = amount.value();
    let base = n.div_euclid(10) * 10;
    match n.rem_euclid(10) {
        4 => Cents(base + 5),
        9 => Cents(base + 10),
        _ => amount,
    }
}
