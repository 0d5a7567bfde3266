//! Chat message formatting.
//!
//! Output is plain text; callers sending with an HTML parse mode must escape
//! anything user-supplied before embedding it.

use crate::market::{BuyTransaction, ContractData};

/// Market cap line, e.g. `Market Cap: 12345`.
pub fn format_market_cap(market_cap: f64) -> String {
    format!("Market Cap: {}", market_cap)
}

/// Enumerated buy lines starting at 1, e.g. `Buy 1: 2 SOL`.
pub fn format_buys(buys: &[BuyTransaction]) -> String {
    buys.iter()
        .enumerate()
        .map(|(i, buy)| format!("Buy {}: {} SOL", i + 1, buy.amount))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scheduled update message: market cap followed by recent buys.
pub fn format_update_message(data: &ContractData) -> String {
    let mut msg = format!("📊 {}\n\n", format_market_cap(data.market_cap));
    if data.has_buys() {
        msg.push_str("🟢 Recent buys:\n");
        msg.push_str(&format_buys(&data.buys));
    } else {
        msg.push_str("No recent buys.");
    }
    msg
}

/// Notice for a watched address with buy activity.
pub fn format_watch_notice(address: &str, data: &ContractData) -> String {
    format!(
        "👀 Buy activity on watched address {}\n{} recent buy(s), latest: {} SOL",
        address,
        data.buys.len(),
        data.buys.first().map(|b| b.amount).unwrap_or(0.0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ContractData {
        ContractData {
            market_cap: 12345.0,
            buys: vec![BuyTransaction::new("sig1", 2.0), BuyTransaction::new("sig2", 5.0)],
        }
    }

    #[test]
    fn test_update_message_lists_buys_in_order() {
        let msg = format_update_message(&sample());
        let cap = msg.find("Market Cap: 12345").unwrap();
        let first = msg.find("Buy 1: 2 SOL").unwrap();
        let second = msg.find("Buy 2: 5 SOL").unwrap();
        assert!(cap < first && first < second);
        assert!(!msg.contains("Buy 3"));
    }

    #[test]
    fn test_update_message_without_buys() {
        let data = ContractData {
            market_cap: 1000.5,
            buys: Vec::new(),
        };
        let msg = format_update_message(&data);
        assert!(msg.contains("Market Cap: 1000.5"));
        assert!(msg.contains("No recent buys."));
    }

    #[test]
    fn test_format_buys() {
        assert_eq!(format_buys(&sample().buys), "Buy 1: 2 SOL\nBuy 2: 5 SOL");
        assert_eq!(format_buys(&[]), "");
    }

    #[test]
    fn test_watch_notice_names_address() {
        let msg = format_watch_notice("WalletA", &sample());
        assert!(msg.contains("WalletA"));
        assert!(msg.contains("2 recent buy(s)"));
    }
}
