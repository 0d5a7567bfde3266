//! Persisted bot configuration.

use crate::schedule::DailyTime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bot configuration stored as a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BotConfig {
    /// Primary token address being tracked (empty = unset)
    pub contract_address: String,
    /// Animation sent after each update (empty = none)
    pub alert_gif: String,
    /// Telegram chat receiving scheduled updates
    pub chat_id: Option<i64>,
    /// Additional addresses monitored for buy activity
    pub watch_list: Vec<String>,
    /// Time of the last completed update cycle
    pub last_update: Option<DateTime<Utc>>,
    /// Daily wall-clock update times
    pub schedules: Vec<DailyTime>,
}

impl BotConfig {
    /// Tracked contract, if one has been configured.
    pub fn contract_address(&self) -> Option<&str> {
        if self.contract_address.is_empty() {
            None
        } else {
            Some(&self.contract_address)
        }
    }

    /// Alert animation, if one has been configured.
    pub fn alert_gif(&self) -> Option<&str> {
        if self.alert_gif.is_empty() {
            None
        } else {
            Some(&self.alert_gif)
        }
    }

    /// Contract and target chat, when both are set.
    pub fn update_target(&self) -> Option<(&str, i64)> {
        Some((self.contract_address()?, self.chat_id?))
    }

    /// Append an address to the watch list.
    /// Returns false if the address is already listed.
    pub fn add_watch(&mut self, address: &str) -> bool {
        let address = address.trim();
        if self.watch_list.iter().any(|a| a == address) {
            return false;
        }
        self.watch_list.push(address.to_string());
        true
    }

    /// Remove an address from the watch list.
    /// Returns false if the address was not listed.
    pub fn remove_watch(&mut self, address: &str) -> bool {
        let address = address.trim();
        let before = self.watch_list.len();
        self.watch_list.retain(|a| a != address);
        self.watch_list.len() != before
    }

    /// Register a daily update time. Returns false if already registered.
    pub fn add_schedule(&mut self, time: DailyTime) -> bool {
        if self.schedules.contains(&time) {
            return false;
        }
        self.schedules.push(time);
        true
    }

    /// Drop a daily update time. Returns false if it was not registered.
    pub fn remove_schedule(&mut self, time: DailyTime) -> bool {
        let before = self.schedules.len();
        self.schedules.retain(|t| *t != time);
        self.schedules.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_unconfigured() {
        let config = BotConfig::default();
        assert!(config.contract_address().is_none());
        assert!(config.alert_gif().is_none());
        assert!(config.update_target().is_none());
    }

    #[test]
    fn test_update_target_requires_chat() {
        let mut config = BotConfig {
            contract_address: "TokenMint111".to_string(),
            ..Default::default()
        };
        assert!(config.update_target().is_none());

        config.chat_id = Some(-100123);
        assert_eq!(config.update_target(), Some(("TokenMint111", -100123)));
    }

    #[test]
    fn test_add_watch_is_idempotent() {
        let mut config = BotConfig::default();
        assert!(config.add_watch("WalletA"));
        assert!(!config.add_watch("WalletA"));
        assert!(!config.add_watch("  WalletA "));
        assert_eq!(config.watch_list, vec!["WalletA".to_string()]);
    }

    #[test]
    fn test_add_watch_keeps_insert_order() {
        let mut config = BotConfig::default();
        config.add_watch("WalletB");
        config.add_watch("WalletA");
        assert_eq!(config.watch_list, vec!["WalletB", "WalletA"]);
    }

    #[test]
    fn test_remove_watch_absent() {
        let mut config = BotConfig::default();
        config.add_watch("WalletA");
        assert!(!config.remove_watch("WalletZ"));
        assert_eq!(config.watch_list, vec!["WalletA"]);

        assert!(config.remove_watch("WalletA"));
        assert!(config.watch_list.is_empty());
    }

    #[test]
    fn test_schedules_unique() {
        let mut config = BotConfig::default();
        let nine = DailyTime::new(9, 0).unwrap();
        assert!(config.add_schedule(nine));
        assert!(!config.add_schedule(nine));
        assert!(config.remove_schedule(nine));
        assert!(!config.remove_schedule(nine));
    }

    #[test]
    fn test_json_uses_camel_case() {
        let config = BotConfig {
            contract_address: "Mint".to_string(),
            chat_id: Some(42),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["contractAddress"], "Mint");
        assert_eq!(json["chatId"], 42);
        assert!(json["watchList"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let config: BotConfig =
            serde_json::from_str(r#"{"contractAddress":"Mint","watchList":["A"]}"#).unwrap();
        assert_eq!(config.contract_address, "Mint");
        assert_eq!(config.watch_list, vec!["A"]);
        assert!(config.schedules.is_empty());
        assert!(config.last_update.is_none());
    }
}
